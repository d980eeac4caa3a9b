/*!
 * Database entity models.
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// Cached translation entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// SHA-256 of `source_text|source_language|target_language`
    pub hash: String,
    /// Original source text
    pub source_text: String,
    /// Source language code
    pub source_language: String,
    /// Target language code
    pub target_language: String,
    /// Translated text
    pub translated_text: String,
    /// Creation timestamp
    pub created_at: String,
    /// Last lookup or store
    pub last_used_at: String,
    /// Number of cache hits
    pub hit_count: i64,
}

impl fmt::Display for CacheRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{} -> {}] {} => {}",
            self.source_language, self.target_language, self.source_text, self.translated_text
        )
    }
}

/// Entry count for one language pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguagePairCount {
    pub source_language: String,
    pub target_language: String,
    pub entries: i64,
}

/// Cache statistics
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Total number of cache entries
    pub total_entries: i64,
    /// Total number of cache hits
    pub total_hits: i64,
    /// Oldest `last_used_at` value
    pub least_recently_used: Option<String>,
    /// Entries per language pair
    pub language_pairs: Vec<LanguagePairCount>,
    /// Database file size in bytes
    pub file_size_bytes: u64,
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Cache entries: {}", self.total_entries)?;
        writeln!(f, "Cache hits: {}", self.total_hits)?;
        if let Some(oldest) = &self.least_recently_used {
            writeln!(f, "Least recently used: {}", oldest)?;
        }
        for pair in &self.language_pairs {
            writeln!(f, "  {} -> {}: {}", pair.source_language, pair.target_language, pair.entries)?;
        }
        write!(f, "Size: {} KB", self.file_size_bytes / 1024)
    }
}
