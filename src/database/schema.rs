/*!
 * Cache schema and its version stamp.
 */

use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use rusqlite::{Connection, OptionalExtension};

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Create the tables on first use; refuse files written by a newer schema
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    match get_schema_version(conn)? {
        0 => {
            info!("Initializing cache schema v{}", SCHEMA_VERSION);
            create_tables(conn)?;
            set_schema_version(conn, SCHEMA_VERSION)
        }
        SCHEMA_VERSION => {
            debug!("Cache schema is up to date (v{})", SCHEMA_VERSION);
            Ok(())
        }
        other => Err(anyhow!(
            "Cache schema v{} is not supported (expected v{}); clear or move the cache file",
            other,
            SCHEMA_VERSION
        )),
    }
}

/// Version stamp, zero for a fresh database
fn get_schema_version(conn: &Connection) -> Result<i32> {
    let stamped: bool = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='schema_version'",
            [],
            |row| row.get(0),
        )
        .context("Failed to check schema_version table existence")?;

    if !stamped {
        return Ok(0);
    }

    let version = conn
        .query_row("SELECT version FROM schema_version WHERE id = 1", [], |row| row.get(0))
        .optional()?;
    Ok(version.unwrap_or(0))
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_version (id, version, updated_at) VALUES (1, ?1, datetime('now'))",
        [version],
    )?;
    Ok(())
}

fn create_tables(conn: &Connection) -> Result<()> {
    // Readers keep working while another process stores a translation
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;

    // Timestamps use SQLite's `datetime('now')` format so age filters can compare them directly
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            version INTEGER NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS translation_cache (
            hash TEXT PRIMARY KEY,
            source_text TEXT NOT NULL,
            source_language TEXT NOT NULL,
            target_language TEXT NOT NULL,
            translated_text TEXT NOT NULL,
            created_at TEXT NOT NULL,
            last_used_at TEXT NOT NULL,
            hit_count INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_cache_last_used ON translation_cache(last_used_at);
        CREATE INDEX IF NOT EXISTS idx_cache_languages ON translation_cache(source_language, target_language);
        "#,
    )
    .context("Failed to create cache tables")?;

    Ok(())
}
