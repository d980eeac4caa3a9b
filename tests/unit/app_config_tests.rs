/*!
 * Tests for application configuration functionality
 */

use rstlate::app_config::{Config, LogLevel};
use rstlate::markup::Normalization;

use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.source_language, "en");
    assert_eq!(config.target_language, "sv");
    assert_eq!(config.engine.timeout_secs, 30);
    assert!(config.engine.preserve_formatting);
    assert_eq!(config.common.rate_limit_delay_ms, 1000);
    assert_eq!(config.common.retry_count, 3);
    assert_eq!(config.common.retry_backoff_ms, 4000);
    assert_eq!(config.common.retry_backoff_max_ms, 10000);
    assert!(config.cache.enabled);
    assert!(config.repair.fix_formatting);
    assert!(config.repair.normalizations.is_empty());
    assert_eq!(config.log_level, LogLevel::Info);
    assert_eq!(
        config.paths.messages_dir("sv"),
        std::path::PathBuf::from("repos/koha-manual/locales/sv/LC_MESSAGES")
    );
}

/// Partial files fall back to defaults field by field
#[test]
fn test_deserialize_withPartialJson_shouldFillDefaults() {
    let json = r#"{
        "target_language": "de",
        "engine": { "api_key": "abc:fx" },
        "repair": { "normalizations": [ { "from": "Sök exemplar", "to": "Exemplarsökning" } ] },
        "log_level": "debug"
    }"#;

    let config: Config = serde_json::from_str(json).unwrap();

    assert_eq!(config.source_language, "en");
    assert_eq!(config.target_language, "de");
    assert_eq!(config.engine.timeout_secs, 30);
    assert_eq!(config.engine.resolved_endpoint(), "https://api-free.deepl.com");
    assert_eq!(config.repair.normalizations, vec![Normalization::new("Sök exemplar", "Exemplarsökning")]);
    assert_eq!(config.log_level, LogLevel::Debug);
    assert!(config.validate().is_ok());
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = Config::default();
    assert!(config.validate().is_ok());

    config.source_language = "xx".to_string();
    assert!(config.validate().is_err());
    config.source_language = "en".to_string();

    config.target_language = "".to_string();
    assert!(config.validate().is_err());
    config.target_language = "sv".to_string();

    config.engine.endpoint = "not a url".to_string();
    assert!(config.validate().is_err());
    config.engine.endpoint = "https://api.deepl.com".to_string();
    assert!(config.validate().is_ok());

    config.repair.normalizations = vec![Normalization::new("sök", "exemplarsök")];
    assert!(config.validate().is_err());
    config.repair.normalizations = vec![Normalization::new("utlån", "återlämning"), Normalization::new("återlämning", "retur")];
    assert!(config.validate().is_err());
    config.repair.normalizations.clear();

    config.common.retry_count = 0;
    assert!(config.validate().is_err());
}

/// An API key is only needed when the engine will be called
#[test]
fn test_validateForTranslation_withoutKey_shouldFail() {
    let mut config = Config::default();
    assert!(config.validate().is_ok());
    assert!(config.validate_for_translation().is_err());

    config.engine.api_key = "secret".to_string();
    assert!(config.validate_for_translation().is_ok());
    assert_eq!(config.engine.resolved_endpoint(), "https://api.deepl.com");
}

/// A missing file is created with defaults and read back unchanged
#[test]
fn test_loadOrCreate_withMissingFile_shouldWriteDefaults() {
    let dir = common::create_temp_dir().unwrap();
    let path = dir.path().join("conf.json");

    let (config, created) = Config::load_or_create(&path).unwrap();
    assert!(created);
    assert!(path.exists());

    let (reloaded, created) = Config::load_or_create(&path).unwrap();
    assert!(!created);
    assert_eq!(reloaded.target_language, config.target_language);
    assert_eq!(reloaded.paths.source_dir, config.paths.source_dir);
}

#[test]
fn test_load_withInvalidJson_shouldFail() {
    let dir = common::create_temp_dir().unwrap();
    let path = common::create_test_file(dir.path(), "conf.json", "{ not json").unwrap();
    assert!(Config::load(&path).is_err());
}
