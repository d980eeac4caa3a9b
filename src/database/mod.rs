/*!
 * SQLite persistence for translated text units.
 *
 * The cache lets repeated runs skip the engine for units translated before,
 * keyed by a hash of the source text and the language pair.
 */

pub mod connection;
pub mod models;
pub mod repository;
pub mod schema;

// Re-export main types
pub use connection::DatabaseConnection;
pub use models::{CacheRecord, CacheStats};
pub use repository::{Repository, DEFAULT_CLEAN_PATTERN};
