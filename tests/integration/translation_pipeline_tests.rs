/*!
 * Translation service against the SQLite cache
 */

use std::sync::Arc;

use rstlate::database::Repository;
use rstlate::errors::{ProviderError, TranslationError};
use rstlate::providers::mock::MockEngine;
use rstlate::providers::EngineRequest;
use rstlate::translation::{RetryPolicy, TranslationService};

use crate::common::SAMPLE_UNITS;

fn service(engine: Arc<MockEngine>, repository: &Repository) -> TranslationService {
    TranslationService::new(engine, "en", "sv")
        .with_policy(RetryPolicy::immediate(3))
        .with_store(Arc::new(repository.clone()))
}

/// Engine that lower-cases token tags and pads them with spaces
fn drifting(request: &EngineRequest) -> String {
    request
        .text
        .replace("{{XREF_0}}", "{{ xref_0 }}")
        .replace("See", "Se")
}

fn loses_tokens(request: &EngineRequest) -> String {
    request.text.replace("{{SUBST_0}}", "Koha")
}

#[tokio::test]
async fn test_translateUnit_withEchoEngine_shouldReturnSourcesAndCacheThem() {
    let repository = Repository::new_in_memory().unwrap();
    let engine = Arc::new(MockEngine::working());
    let service = service(engine.clone(), &repository);

    for unit in SAMPLE_UNITS {
        let outcome = service.translate_unit(unit).await.unwrap();
        assert_eq!(&outcome.text, unit);
        assert!(outcome.is_clean());
        assert!(!outcome.from_cache);
    }
    assert_eq!(engine.request_count(), SAMPLE_UNITS.len());

    for unit in SAMPLE_UNITS {
        let outcome = service.translate_unit(unit).await.unwrap();
        assert_eq!(&outcome.text, unit);
        assert!(outcome.from_cache);
    }
    assert_eq!(engine.request_count(), SAMPLE_UNITS.len());
    assert_eq!(repository.stats().await.unwrap().total_entries, SAMPLE_UNITS.len() as i64);
}

#[tokio::test]
async fn test_translateUnit_withDriftedToken_shouldRestoreReference() {
    let repository = Repository::new_in_memory().unwrap();
    let service = service(Arc::new(MockEngine::working().with_custom_response(drifting)), &repository);

    let outcome = service
        .translate_unit("See :ref:`item search <item-searching-label>`.")
        .await
        .unwrap();
    assert_eq!(outcome.text, "Se :ref:`item search <item-searching-label>`.");
    assert!(outcome.is_clean());
    assert_eq!(outcome.fallbacks, 0);
}

#[tokio::test]
async fn test_translateUnit_withLostSubstitution_shouldReportAndNotCache() {
    let repository = Repository::new_in_memory().unwrap();
    let engine = Arc::new(MockEngine::working().with_custom_response(loses_tokens));
    let service = service(engine.clone(), &repository);

    let outcome = service.translate_unit("Use |koha| with |opac|.").await.unwrap();
    assert_eq!(outcome.text, "Use Koha with |opac|.");
    assert_eq!(outcome.unrestored.len(), 1);
    assert_eq!(outcome.unrestored[0].target, "koha");

    assert!(repository.lookup("Use |koha| with |opac|.", "en", "sv").await.unwrap().is_none());
    service.translate_unit("Use |koha| with |opac|.").await.unwrap();
    assert_eq!(engine.request_count(), 2);
}

#[tokio::test]
async fn test_translateUnit_withRateLimitedEngine_shouldRetryThenCache() {
    let repository = Repository::new_in_memory().unwrap();
    let engine = Arc::new(MockEngine::rate_limited(2));
    let service = service(engine.clone(), &repository);

    let outcome = service.translate_unit("Go to :ref:`circulation-label` first.").await.unwrap();
    assert_eq!(outcome.text, "Go to :ref:`circulation-label` first.");
    assert_eq!(engine.request_count(), 3);
    assert_eq!(
        repository
            .lookup("Go to :ref:`circulation-label` first.", "en", "sv")
            .await
            .unwrap()
            .as_deref(),
        Some("Go to :ref:`circulation-label` first.")
    );
}

#[tokio::test]
async fn test_translateUnit_withPersistentOutage_shouldFailOnlyThatUnit() {
    let repository = Repository::new_in_memory().unwrap();
    repository.store("Cached", "en", "sv", "Cachad").await.unwrap();
    let service = service(Arc::new(MockEngine::intermittent(1)), &repository);

    let error = service.translate_unit("Not cached").await.unwrap_err();
    assert!(matches!(
        error,
        TranslationError::RetriesExhausted { attempts: 3, last: ProviderError::ApiError { status_code: 503, .. } }
    ));

    let outcome = service.translate_unit("Cached").await.unwrap();
    assert_eq!(outcome.text, "Cachad");
    assert!(outcome.from_cache);
}

#[tokio::test]
async fn test_translateUnit_withSeparatorLine_shouldBypassCacheAndEngine() {
    let repository = Repository::new_in_memory().unwrap();
    let engine = Arc::new(MockEngine::failing());
    let service = service(engine.clone(), &repository);

    let outcome = service.translate_unit("==========").await.unwrap();
    assert_eq!(outcome.text, "==========");
    assert_eq!(engine.request_count(), 0);
    assert_eq!(repository.stats().await.unwrap().total_entries, 0);
}
