/*!
 * Tests for the persistent translation cache
 */

use std::sync::Arc;

use rstlate::database::{DatabaseConnection, Repository};
use rstlate::translation::{TranslationCache, TranslationStore};

use crate::common;

#[tokio::test]
async fn test_repository_withFileDatabase_shouldPersistAcrossReopen() {
    let dir = common::create_temp_dir().unwrap();
    let path = dir.path().join("cache").join("translations.db");

    {
        let repository = Repository::new(DatabaseConnection::new(&path).unwrap());
        repository
            .store("See :ref:`holds <holds-label>`.", "en", "sv", "Se :ref:`reservationer <holds-label>`.")
            .await
            .unwrap();
    }

    let reopened = Repository::new(DatabaseConnection::new(&path).unwrap());
    let cached = reopened.lookup("See :ref:`holds <holds-label>`.", "en", "sv").await.unwrap();
    assert_eq!(cached.as_deref(), Some("Se :ref:`reservationer <holds-label>`."));

    let stats = reopened.stats().await.unwrap();
    assert_eq!(stats.total_entries, 1);
    assert_eq!(stats.total_hits, 1);
    assert!(stats.file_size_bytes > 0);
}

#[tokio::test]
async fn test_lookup_withOtherTargetLanguage_shouldMiss() {
    let repository = Repository::new_in_memory().unwrap();
    repository.store("Hello", "en", "sv", "Hej").await.unwrap();

    assert!(repository.lookup("Hello", "en", "de").await.unwrap().is_none());
    assert!(repository.lookup("Hello", "sv", "en").await.unwrap().is_none());
    assert_eq!(repository.lookup("Hello", "en", "sv").await.unwrap().as_deref(), Some("Hej"));
}

#[test]
fn test_get_withCacheKey_shouldReturnRecord() {
    let repository = Repository::new_in_memory().unwrap();
    let record = tokio_test::block_on(async {
        repository.store("Hello", "en", "sv", "Hej").await?;
        repository.get(&Repository::cache_key("Hello", "en", "sv")).await
    })
    .unwrap()
    .unwrap();
    assert_eq!(record.source_text, "Hello");
    assert_eq!(record.translated_text, "Hej");
    assert_eq!(record.to_string(), "[en -> sv] Hello => Hej");
}

#[tokio::test]
async fn test_cleanPattern_withPlaceholderResidue_shouldDeleteOnlyMatches() {
    let repository = Repository::new_in_memory().unwrap();
    repository.store("Set the value", "en", "sv", "Ange %value%").await.unwrap();
    repository.store("Hello", "en", "sv", "Hej").await.unwrap();

    let removed = repository
        .clean_pattern(rstlate::database::DEFAULT_CLEAN_PATTERN, false)
        .await
        .unwrap();
    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0].source_text, "Set the value");

    assert_eq!(repository.stats().await.unwrap().total_entries, 1);
}

#[tokio::test]
async fn test_clear_thenVacuum_shouldLeaveEmptyCache() {
    let dir = common::create_temp_dir().unwrap();
    let repository = Repository::new(DatabaseConnection::new(dir.path().join("cache.db")).unwrap());
    repository.store("A", "en", "sv", "A").await.unwrap();
    repository.store("B", "en", "sv", "B").await.unwrap();

    assert_eq!(repository.clear().await.unwrap(), 2);
    repository.connection().vacuum().await.unwrap();
    assert_eq!(repository.stats().await.unwrap().total_entries, 0);
}

#[tokio::test]
async fn test_stores_behindTraitObject_shouldBehaveAlike() {
    let stores: Vec<Arc<dyn TranslationStore>> = vec![
        Arc::new(Repository::new_in_memory().unwrap()),
        Arc::new(TranslationCache::new()),
    ];

    for store in stores {
        assert!(store.lookup("Hello", "en", "sv").await.unwrap().is_none());
        store.store("Hello", "en", "sv", "Hej").await.unwrap();
        assert_eq!(store.lookup("Hello", "en", "sv").await.unwrap().as_deref(), Some("Hej"));
    }
}
