/*!
 * Translation caching.
 *
 * [`TranslationStore`] is the seam the translation service sees; the SQLite
 * repository implements it for persistent use and [`TranslationCache`]
 * keeps entries in memory for runs without a database.
 */

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use log::debug;
use parking_lot::RwLock;

/// Lookup and store of finished translations, keyed by (text, source, target)
#[async_trait]
pub trait TranslationStore: Send + Sync {
    async fn lookup(&self, source_text: &str, source_language: &str, target_language: &str) -> Result<Option<String>>;

    async fn store(&self, source_text: &str, source_language: &str, target_language: &str, translated_text: &str) -> Result<()>;
}

/// Cache key combining source text, source language, and target language
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    source_text: String,
    source_language: String,
    target_language: String,
}

impl CacheKey {
    fn new(source_text: &str, source_language: &str, target_language: &str) -> Self {
        Self {
            source_text: source_text.to_string(),
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
        }
    }
}

/// In-memory translation cache
#[derive(Clone, Default)]
pub struct TranslationCache {
    /// Internal cache storage
    cache: Arc<RwLock<HashMap<CacheKey, String>>>,
    /// Cache hit counter
    hits: Arc<RwLock<usize>>,
    /// Cache miss counter
    misses: Arc<RwLock<usize>>,
}

impl TranslationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a translation from the cache
    pub fn get(&self, source_text: &str, source_language: &str, target_language: &str) -> Option<String> {
        let key = CacheKey::new(source_text, source_language, target_language);
        let cache = self.cache.read();

        match cache.get(&key) {
            Some(translation) => {
                *self.hits.write() += 1;
                debug!(
                    "Cache hit for '{}' ({} -> {})",
                    truncate_text(source_text, 30),
                    source_language,
                    target_language
                );
                Some(translation.clone())
            }
            None => {
                *self.misses.write() += 1;
                None
            }
        }
    }

    /// Store a translation in the cache
    pub fn insert(&self, source_text: &str, source_language: &str, target_language: &str, translation: &str) {
        let key = CacheKey::new(source_text, source_language, target_language);
        self.cache.write().insert(key, translation.to_string());
    }

    /// Hits, misses and hit rate
    pub fn stats(&self) -> (usize, usize, f64) {
        let hits = *self.hits.read();
        let misses = *self.misses.read();
        let total = hits + misses;

        let hit_rate = if total > 0 { hits as f64 / total as f64 } else { 0.0 };

        (hits, misses, hit_rate)
    }

    pub fn clear(&self) {
        self.cache.write().clear();
        *self.hits.write() = 0;
        *self.misses.write() = 0;
        debug!("Translation cache cleared");
    }

    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }
}

#[async_trait]
impl TranslationStore for TranslationCache {
    async fn lookup(&self, source_text: &str, source_language: &str, target_language: &str) -> Result<Option<String>> {
        Ok(self.get(source_text, source_language, target_language))
    }

    async fn store(&self, source_text: &str, source_language: &str, target_language: &str, translated_text: &str) -> Result<()> {
        self.insert(source_text, source_language, target_language, translated_text);
        Ok(())
    }
}

/// Truncate text to a maximum number of characters with ellipsis
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
