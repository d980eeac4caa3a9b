use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::markup::{Normalization, Repairer};
use crate::providers::deepl;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (ISO)
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language code (ISO)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Translation engine settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// Pacing and retry settings for engine calls
    #[serde(default)]
    pub common: TranslationCommonConfig,

    /// Persistent translation cache
    #[serde(default)]
    pub cache: CacheConfig,

    /// Documentation source and locale directories
    #[serde(default)]
    pub paths: PathsConfig,

    /// Repair pass settings
    #[serde(default)]
    pub repair: RepairConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// DeepL engine configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EngineConfig {
    // @field: API key, may be supplied through DEEPL_API_KEY instead
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL; empty means derived from the key
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    // @field: Ask the engine to keep source formatting
    #[serde(default = "default_true")]
    pub preserve_formatting: bool,
}

impl EngineConfig {
    /// Endpoint to use, falling back to the one matching the key type
    pub fn resolved_endpoint(&self) -> String {
        if self.endpoint.is_empty() {
            deepl::default_endpoint(&self.api_key).to_string()
        } else {
            self.endpoint.clone()
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: String::new(),
            timeout_secs: default_timeout_secs(),
            preserve_formatting: default_true(),
        }
    }
}

/// Common translation settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationCommonConfig {
    /// Rate limit delay in milliseconds before every engine call
    #[serde(default = "default_rate_limit_delay_ms")]
    pub rate_limit_delay_ms: u64,

    /// Number of attempts for one unit
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Backoff base for retries (in milliseconds)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Upper bound for a single backoff sleep (in milliseconds)
    #[serde(default = "default_retry_backoff_max_ms")]
    pub retry_backoff_max_ms: u64,
}

impl Default for TranslationCommonConfig {
    fn default() -> Self {
        Self {
            rate_limit_delay_ms: default_rate_limit_delay_ms(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            retry_backoff_max_ms: default_retry_backoff_max_ms(),
        }
    }
}

/// Translation cache configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Database file; the user data directory is used when unset
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

/// Documentation layout
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PathsConfig {
    /// Directory holding the RST sources
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,

    /// Directory holding `<lang>/LC_MESSAGES/*.po`
    #[serde(default = "default_locale_dir")]
    pub locale_dir: PathBuf,
}

impl PathsConfig {
    /// PO directory for one language
    pub fn messages_dir(&self, language: &str) -> PathBuf {
        self.locale_dir.join(language).join("LC_MESSAGES")
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
            locale_dir: default_locale_dir(),
        }
    }
}

/// Repair pass configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RepairConfig {
    /// Apply RST emphasis and spacing fixes after repair
    #[serde(default = "default_true")]
    pub fix_formatting: bool,

    /// Corpus-specific phrase rewrites applied after the rule table
    #[serde(default)]
    pub normalizations: Vec<Normalization>,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            fix_formatting: true,
            normalizations: Vec::new(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_source_language() -> String {
    "en".to_string()
}

fn default_target_language() -> String {
    "sv".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_rate_limit_delay_ms() -> u64 {
    1000
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    4000
}

fn default_retry_backoff_max_ms() -> u64 {
    10000
}

fn default_true() -> bool {
    true
}

fn default_source_dir() -> PathBuf {
    PathBuf::from("repos/koha-manual/source")
}

fn default_locale_dir() -> PathBuf {
    PathBuf::from("repos/koha-manual/locales")
}

impl Config {
    /// Read a configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;

        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;

        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Load the file when present, otherwise write and return the defaults
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<(Self, bool)> {
        let path = path.as_ref();
        if path.exists() {
            return Ok((Self::load(path)?, false));
        }

        let config = Self::default();
        config.save(path)?;
        Ok((config, true))
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        // Validate languages
        let _source_name = crate::language_utils::get_language_name(&self.source_language)?;
        let _target_name = crate::language_utils::get_language_name(&self.target_language)?;

        if !self.engine.endpoint.is_empty() {
            url::Url::parse(&self.engine.endpoint)
                .with_context(|| format!("Invalid engine endpoint: {}", self.engine.endpoint))?;
        }

        if self.engine.timeout_secs == 0 {
            return Err(anyhow!("Engine timeout must be greater than zero"));
        }

        if self.common.retry_count == 0 {
            return Err(anyhow!("Retry count must be at least 1"));
        }

        Repairer::with_normalizations(self.repair.normalizations.clone())?;

        Ok(())
    }

    /// Checks that only matter when the engine will be called
    pub fn validate_for_translation(&self) -> Result<()> {
        self.validate()?;

        if self.engine.api_key.trim().is_empty() {
            return Err(anyhow!(
                "DeepL API key is required: set engine.api_key, DEEPL_API_KEY or --api-key"
            ));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            engine: EngineConfig::default(),
            common: TranslationCommonConfig::default(),
            cache: CacheConfig::default(),
            paths: PathsConfig::default(),
            repair: RepairConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
