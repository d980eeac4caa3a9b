/*!
 * Translation engine implementations.
 *
 * - DeepL: HTTP client for the DeepL REST API
 * - Mock: scripted engine used by tests and benchmarks
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// One text unit sent across the translation boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineRequest {
    /// Encoded text to translate
    pub text: String,
    /// Source language (ISO 639-1)
    pub source_language: String,
    /// Target language (ISO 639-1)
    pub target_language: String,
}

impl EngineRequest {
    pub fn new(text: impl Into<String>, source_language: impl Into<String>, target_language: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source_language: source_language.into(),
            target_language: target_language.into(),
        }
    }
}

/// Common trait for markup-unaware machine translation services
///
/// Implementations report transport and rate-limit problems through
/// [`ProviderError`] variants for which [`ProviderError::is_transient`] holds,
/// so callers can retry them.
#[async_trait]
pub trait TranslationEngine: Send + Sync + Debug {
    /// Translate a single text unit
    async fn translate(&self, request: EngineRequest) -> Result<String, ProviderError>;

    /// Check that the engine is reachable and the credentials are accepted
    async fn test_connection(&self) -> Result<(), ProviderError>;

    /// Short name used in log output
    fn name(&self) -> &'static str;
}

pub mod deepl;
pub mod mock;
