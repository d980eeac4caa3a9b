/*!
 * Core translation service implementation.
 *
 * This module contains the main TranslationService struct, which moves one
 * text unit at a time through cache lookup, markup protection, the engine
 * call and markup restoration.
 */

use anyhow::Result;
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;

use super::cache::{truncate_text, TranslationStore};
use crate::app_config::{Config, TranslationCommonConfig};
use crate::errors::{ProviderError, TranslationError};
use crate::markup::{FormatFixer, Fragment, MarkupCodec, Repairer};
use crate::providers::{EngineRequest, TranslationEngine};

/// Pacing and retry settings for engine calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per unit, including the first
    pub attempts: u32,
    /// Fixed delay before every engine call
    pub delay: Duration,
    /// First backoff interval, doubled for each further retry
    pub backoff: Duration,
    /// Cap for a single backoff interval
    pub backoff_max: Duration,
}

impl RetryPolicy {
    pub fn from_config(common: &TranslationCommonConfig) -> Self {
        Self {
            attempts: common.retry_count.max(1),
            delay: Duration::from_millis(common.rate_limit_delay_ms),
            backoff: Duration::from_millis(common.retry_backoff_ms),
            backoff_max: Duration::from_millis(common.retry_backoff_max_ms),
        }
    }

    /// No waiting at all; for tests and offline use
    pub fn immediate(attempts: u32) -> Self {
        Self {
            attempts: attempts.max(1),
            delay: Duration::ZERO,
            backoff: Duration::ZERO,
            backoff_max: Duration::ZERO,
        }
    }

    /// Wait before retry number `retry` (1-based)
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry.saturating_sub(1)).unwrap_or(u32::MAX);
        self.backoff.saturating_mul(factor).min(self.backoff_max)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&TranslationCommonConfig::default())
    }
}

/// Result of translating one text unit
#[derive(Debug, Clone, Default)]
pub struct UnitOutcome {
    pub text: String,
    /// Fragments that could not be restored
    pub unrestored: Vec<Fragment>,
    /// Names of the repair rules that fired
    pub repairs: Vec<String>,
    /// Corruption the repair pass could not fix
    pub residual: Vec<String>,
    /// Fragments restored with their untranslated display text
    pub fallbacks: usize,
    pub from_cache: bool,
}

impl UnitOutcome {
    fn unchanged(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Self::default()
        }
    }

    pub fn is_clean(&self) -> bool {
        self.unrestored.is_empty() && self.residual.is_empty()
    }
}

/// Units that are sent nowhere: blank lines and `====` style rules
pub fn is_passthrough(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.is_empty() || trimmed.chars().all(|c| c == '=')
}

/// Main translation service for RST text units
pub struct TranslationService {
    engine: Arc<dyn TranslationEngine>,
    store: Option<Arc<dyn TranslationStore>>,
    codec: MarkupCodec,
    source_language: String,
    target_language: String,
    policy: RetryPolicy,
}

impl std::fmt::Debug for TranslationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationService")
            .field("engine", &self.engine.name())
            .field("cached", &self.store.is_some())
            .field("source_language", &self.source_language)
            .field("target_language", &self.target_language)
            .field("policy", &self.policy)
            .finish()
    }
}

impl TranslationService {
    /// Create a service with the default codec and retry policy and no cache
    pub fn new(
        engine: Arc<dyn TranslationEngine>,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
    ) -> Self {
        Self {
            engine,
            store: None,
            codec: MarkupCodec::default(),
            source_language: source_language.into(),
            target_language: target_language.into(),
            policy: RetryPolicy::default(),
        }
    }

    /// Create a service with languages, retry policy and repair settings from the configuration
    pub fn from_config(config: &Config, engine: Arc<dyn TranslationEngine>) -> Result<Self> {
        let repairer = Repairer::with_normalizations(config.repair.normalizations.clone())?;
        let codec = MarkupCodec::new(repairer).with_formatting(config.repair.fix_formatting);

        Ok(Self::new(engine, &config.source_language, &config.target_language)
            .with_codec(codec)
            .with_policy(RetryPolicy::from_config(&config.common)))
    }

    pub fn with_store(mut self, store: Arc<dyn TranslationStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_codec(mut self, codec: MarkupCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn codec(&self) -> &MarkupCodec {
        &self.codec
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    pub fn source_language(&self) -> &str {
        &self.source_language
    }

    pub fn target_language(&self) -> &str {
        &self.target_language
    }

    /// Test the connection to the translation engine
    pub async fn test_connection(&self) -> Result<(), ProviderError> {
        self.engine.test_connection().await
    }

    /// Translate one text unit.
    ///
    /// The returned text is complete; nothing is written anywhere when an error is returned.
    pub async fn translate_unit(&self, text: &str) -> Result<UnitOutcome, TranslationError> {
        if is_passthrough(text) {
            return Ok(UnitOutcome::unchanged(text));
        }

        if let Some(store) = &self.store {
            let cached = store
                .lookup(text, &self.source_language, &self.target_language)
                .await
                .map_err(|e| TranslationError::Cache(e.to_string()))?;

            if let Some(translated) = cached {
                debug!("Cache hit for '{}'", truncate_text(text, 40));
                return Ok(UnitOutcome {
                    text: translated,
                    from_cache: true,
                    ..UnitOutcome::default()
                });
            }
        }

        let encoded = self.codec.protect(text)?;
        debug!(
            "Encoded unit with {} placeholder(s): {}",
            encoded.table.len(),
            truncate_text(&encoded.text, 60)
        );

        let mut translated = self.call_engine(&encoded.text).await?;
        if !text.contains('&') {
            translated = FormatFixer::convert_html_entities(&translated);
        }

        let restored = self.codec.restore(&translated, encoded.table);
        if !restored.repairs.is_empty() {
            warn!(
                "Repaired '{}' with: {}",
                truncate_text(text, 40),
                restored.repairs.join(", ")
            );
        }
        for residue in &restored.residual {
            warn!("Corruption left after repair: {}", residue);
        }

        let outcome = UnitOutcome {
            text: restored.text,
            unrestored: restored.unrestored,
            repairs: restored.repairs,
            residual: restored.residual,
            fallbacks: restored.fallbacks,
            from_cache: false,
        };

        if outcome.is_clean() {
            if let Some(store) = &self.store {
                // A failed cache write never fails the unit
                if let Err(e) = store
                    .store(text, &self.source_language, &self.target_language, &outcome.text)
                    .await
                {
                    warn!("Failed to cache translation: {}", e);
                }
            }
        }

        Ok(outcome)
    }

    /// Send encoded text to the engine, pacing and retrying transient failures
    async fn call_engine(&self, encoded: &str) -> Result<String, TranslationError> {
        let mut attempt = 0;

        loop {
            attempt += 1;

            if !self.policy.delay.is_zero() {
                tokio::time::sleep(self.policy.delay).await;
            }

            let request = EngineRequest::new(encoded, &self.source_language, &self.target_language);
            match self.engine.translate(request).await {
                Ok(translated) if translated.trim().is_empty() => {
                    return Err(ProviderError::ParseError(format!(
                        "{} returned empty text",
                        self.engine.name()
                    ))
                    .into());
                }
                Ok(translated) => return Ok(translated),
                Err(e) if !e.is_transient() => return Err(e.into()),
                Err(e) if attempt >= self.policy.attempts => {
                    return Err(TranslationError::RetriesExhausted { attempts: attempt, last: e });
                }
                Err(e) => {
                    let backoff = self.policy.backoff_for(attempt);
                    warn!(
                        "{} request failed: {} - attempt {}/{}, retrying in {:?}",
                        self.engine.name(),
                        e,
                        attempt,
                        self.policy.attempts,
                        backoff
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}
