/*!
 * Repository layer for the persistent translation cache.
 *
 * Provides a high-level API over the `translation_cache` table, abstracting
 * away the SQL details.
 */

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use regex::Regex;
use rusqlite::{params, OptionalExtension, Row};
use sha2::{Digest, Sha256};

use super::connection::DatabaseConnection;
use super::models::{CacheRecord, CacheStats, LanguagePairCount};
use crate::translation::cache::TranslationStore;

/// Placeholder residue such as `%value%` that a bad translation can leave behind
pub const DEFAULT_CLEAN_PATTERN: &str = r"%\w+%";

const SELECT_COLUMNS: &str = "SELECT hash, source_text, source_language, target_language, translated_text,
            created_at, last_used_at, hit_count
     FROM translation_cache";

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<CacheRecord> {
    Ok(CacheRecord {
        hash: row.get(0)?,
        source_text: row.get(1)?,
        source_language: row.get(2)?,
        target_language: row.get(3)?,
        translated_text: row.get(4)?,
        created_at: row.get(5)?,
        last_used_at: row.get(6)?,
        hit_count: row.get(7)?,
    })
}

/// Repository for translation cache operations
#[derive(Clone, Debug)]
pub struct Repository {
    /// Database connection
    db: DatabaseConnection,
}

impl Repository {
    /// Create a new repository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a repository with the default database location
    pub fn new_default() -> Result<Self> {
        let db = DatabaseConnection::new_default()?;
        Ok(Self::new(db))
    }

    /// Create a repository with an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self> {
        let db = DatabaseConnection::new_in_memory()?;
        Ok(Self::new(db))
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Compute SHA256 hash of text
    pub fn hash_text(text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Stable key for one translation request
    pub fn cache_key(source_text: &str, source_language: &str, target_language: &str) -> String {
        Self::hash_text(&format!("{}|{}|{}", source_text, source_language, target_language))
    }

    /// Get a cached translation, marking the entry as used
    pub async fn lookup(
        &self,
        source_text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<Option<String>> {
        let hash = Self::cache_key(source_text, source_language, target_language);

        self.db
            .execute_async(move |conn| {
                let translated: Option<String> = conn
                    .query_row(
                        "SELECT translated_text FROM translation_cache WHERE hash = ?1",
                        [&hash],
                        |row| row.get(0),
                    )
                    .optional()?;

                if translated.is_some() {
                    conn.execute(
                        "UPDATE translation_cache
                         SET hit_count = hit_count + 1, last_used_at = datetime('now')
                         WHERE hash = ?1",
                        [&hash],
                    )?;
                    debug!("Cache hit for {}", &hash[..12]);
                }
                Ok(translated)
            })
            .await
    }

    /// Store a translation, replacing any previous one for the same request
    pub async fn store(
        &self,
        source_text: &str,
        source_language: &str,
        target_language: &str,
        translated_text: &str,
    ) -> Result<()> {
        let hash = Self::cache_key(source_text, source_language, target_language);
        let values = (
            source_text.to_string(),
            source_language.to_string(),
            target_language.to_string(),
            translated_text.to_string(),
        );

        self.db
            .execute_async(move |conn| {
                let (source_text, source_language, target_language, translated_text) = values;
                conn.execute(
                    r#"
                    INSERT INTO translation_cache (
                        hash, source_text, source_language, target_language,
                        translated_text, created_at, last_used_at, hit_count
                    ) VALUES (?1, ?2, ?3, ?4, ?5, datetime('now'), datetime('now'), 0)
                    ON CONFLICT(hash) DO UPDATE SET
                        translated_text = excluded.translated_text,
                        last_used_at = excluded.last_used_at
                    "#,
                    params![hash, source_text, source_language, target_language, translated_text],
                )?;
                Ok(())
            })
            .await
    }

    /// Fetch one entry by hash
    pub async fn get(&self, hash: &str) -> Result<Option<CacheRecord>> {
        let hash = hash.to_string();
        self.db
            .execute_async(move |conn| {
                let sql = format!("{} WHERE hash = ?1", SELECT_COLUMNS);
                Ok(conn.query_row(&sql, [&hash], record_from_row).optional()?)
            })
            .await
    }

    /// Delete entries not used during the last `days` days
    pub async fn delete_unused(&self, days: u32) -> Result<usize> {
        let modifier = format!("-{} days", days);
        self.db
            .execute_async(move |conn| {
                let deleted = conn.execute(
                    "DELETE FROM translation_cache WHERE last_used_at < datetime('now', ?1)",
                    [&modifier],
                )?;
                Ok(deleted)
            })
            .await
    }

    /// Delete entries whose source or translation contains `text`
    pub async fn delete_containing(&self, text: &str) -> Result<usize> {
        let needle = text.to_string();
        self.db
            .execute_async(move |conn| {
                let deleted = conn.execute(
                    "DELETE FROM translation_cache
                     WHERE instr(source_text, ?1) > 0 OR instr(translated_text, ?1) > 0",
                    [&needle],
                )?;
                Ok(deleted)
            })
            .await
    }

    /// Clear the translation cache
    pub async fn clear(&self) -> Result<usize> {
        self.db
            .execute_async(|conn| Ok(conn.execute("DELETE FROM translation_cache", [])?))
            .await
    }

    /// Entries whose translation matches `pattern`; deleted unless `dry_run`
    pub async fn clean_pattern(&self, pattern: &str, dry_run: bool) -> Result<Vec<CacheRecord>> {
        let regex = Regex::new(pattern).with_context(|| format!("Invalid cache pattern: {}", pattern))?;

        self.db
            .transaction_async(move |tx| {
                let matches: Vec<CacheRecord> = {
                    let mut stmt = tx.prepare(SELECT_COLUMNS)?;
                    let rows = stmt.query_map([], record_from_row)?;
                    rows.filter_map(|r| r.ok())
                        .filter(|record| regex.is_match(&record.translated_text))
                        .collect()
                };

                if !dry_run {
                    let mut delete = tx.prepare("DELETE FROM translation_cache WHERE hash = ?1")?;
                    for record in &matches {
                        delete.execute([&record.hash])?;
                    }
                }
                Ok(matches)
            })
            .await
    }

    /// Get cache statistics
    pub async fn stats(&self) -> Result<CacheStats> {
        let file_size_bytes = self.db.file_size();

        self.db
            .execute_async(move |conn| {
                let (total_entries, total_hits, least_recently_used): (i64, i64, Option<String>) = conn.query_row(
                    "SELECT COUNT(*), COALESCE(SUM(hit_count), 0), MIN(last_used_at) FROM translation_cache",
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )?;

                let mut stmt = conn.prepare(
                    "SELECT source_language, target_language, COUNT(*)
                     FROM translation_cache
                     GROUP BY source_language, target_language
                     ORDER BY source_language, target_language",
                )?;
                let language_pairs = stmt
                    .query_map([], |row| {
                        Ok(LanguagePairCount {
                            source_language: row.get(0)?,
                            target_language: row.get(1)?,
                            entries: row.get(2)?,
                        })
                    })?
                    .filter_map(|r| r.ok())
                    .collect();

                Ok(CacheStats {
                    total_entries,
                    total_hits,
                    least_recently_used,
                    language_pairs,
                    file_size_bytes,
                })
            })
            .await
    }
}

#[async_trait]
impl TranslationStore for Repository {
    async fn lookup(&self, source_text: &str, source_language: &str, target_language: &str) -> Result<Option<String>> {
        Repository::lookup(self, source_text, source_language, target_language).await
    }

    async fn store(&self, source_text: &str, source_language: &str, target_language: &str, translated_text: &str) -> Result<()> {
        Repository::store(self, source_text, source_language, target_language, translated_text).await
    }
}
