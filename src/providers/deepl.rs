/*!
 * DeepL REST API client.
 */

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::errors::ProviderError;
use crate::language_utils::{engine_language_code, LanguageRole};
use crate::providers::{EngineRequest, TranslationEngine};

/// Endpoint for paid API keys
pub const PRO_ENDPOINT: &str = "https://api.deepl.com";

/// Endpoint for free API keys (suffix `:fx`)
pub const FREE_ENDPOINT: &str = "https://api-free.deepl.com";

/// Endpoint matching the kind of API key
pub fn default_endpoint(api_key: &str) -> &'static str {
    if api_key.trim().ends_with(":fx") {
        FREE_ENDPOINT
    } else {
        PRO_ENDPOINT
    }
}

/// DeepL client
pub struct DeepL {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// Base URL without path
    endpoint: String,
    /// Ask the engine to keep punctuation and casing it would otherwise normalise
    preserve_formatting: bool,
}

impl std::fmt::Debug for DeepL {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeepL")
            .field("endpoint", &self.endpoint)
            .field("preserve_formatting", &self.preserve_formatting)
            .finish_non_exhaustive()
    }
}

/// `POST /v2/translate` body
#[derive(Debug, Serialize)]
pub struct DeepLRequest {
    pub text: Vec<String>,
    pub source_lang: String,
    pub target_lang: String,
    pub preserve_formatting: bool,
}

/// One translated text
#[derive(Debug, Deserialize)]
pub struct DeepLTranslation {
    #[serde(default)]
    pub detected_source_language: Option<String>,
    pub text: String,
}

/// `POST /v2/translate` response
#[derive(Debug, Deserialize)]
pub struct DeepLResponse {
    pub translations: Vec<DeepLTranslation>,
}

/// `GET /v2/usage` response
#[derive(Debug, Deserialize)]
pub struct DeepLUsage {
    pub character_count: u64,
    pub character_limit: u64,
}

impl DeepL {
    /// Create a client; an empty `endpoint` selects one from the key
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, timeout_secs: u64) -> Self {
        let api_key = api_key.into();
        let endpoint = endpoint.into();
        let endpoint = if endpoint.trim().is_empty() {
            default_endpoint(&api_key).to_string()
        } else {
            endpoint.trim_end_matches('/').to_string()
        };

        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key,
            endpoint,
            preserve_formatting: true,
        }
    }

    pub fn with_preserve_formatting(mut self, preserve: bool) -> Self {
        self.preserve_formatting = preserve;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn auth_header(&self) -> String {
        format!("DeepL-Auth-Key {}", self.api_key)
    }

    /// Map an HTTP failure to a provider error
    pub fn error_for_status(status: StatusCode, body: String) -> ProviderError {
        match status.as_u16() {
            403 => ProviderError::AuthenticationError(body),
            429 => ProviderError::RateLimitExceeded(body),
            456 => ProviderError::QuotaExceeded(body),
            code => ProviderError::ApiError {
                status_code: code,
                message: body,
            },
        }
    }

    fn transport_error(e: reqwest::Error) -> ProviderError {
        if e.is_timeout() || e.is_connect() {
            ProviderError::ConnectionError(e.to_string())
        } else {
            ProviderError::RequestFailed(e.to_string())
        }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to get error response text".to_string());
        error!("DeepL API error ({}): {}", status, error_text);
        Err(Self::error_for_status(status, error_text))
    }

    /// Send a translate request
    pub async fn complete(&self, request: &DeepLRequest) -> Result<DeepLResponse, ProviderError> {
        let api_url = format!("{}/v2/translate", self.endpoint);

        let response = self
            .client
            .post(&api_url)
            .header("Authorization", self.auth_header())
            .json(request)
            .send()
            .await
            .map_err(Self::transport_error)?;

        Self::check(response)
            .await?
            .json::<DeepLResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse DeepL response: {}", e)))
    }

    /// Character usage of the current billing period
    pub async fn usage(&self) -> Result<DeepLUsage, ProviderError> {
        let api_url = format!("{}/v2/usage", self.endpoint);

        let response = self
            .client
            .get(&api_url)
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(Self::transport_error)?;

        Self::check(response)
            .await?
            .json::<DeepLUsage>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse DeepL usage: {}", e)))
    }

    /// Build the request body for one unit
    pub fn build_request(&self, request: &EngineRequest) -> Result<DeepLRequest, ProviderError> {
        let source_lang = engine_language_code(&request.source_language, LanguageRole::Source)
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        let target_lang = engine_language_code(&request.target_language, LanguageRole::Target)
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        Ok(DeepLRequest {
            text: vec![request.text.clone()],
            source_lang,
            target_lang,
            preserve_formatting: self.preserve_formatting,
        })
    }

    /// Extract text from a DeepL response
    pub fn extract_text(response: DeepLResponse) -> Result<String, ProviderError> {
        response
            .translations
            .into_iter()
            .next()
            .map(|t| t.text)
            .ok_or_else(|| ProviderError::ParseError("DeepL response contained no translations".to_string()))
    }
}

#[async_trait]
impl TranslationEngine for DeepL {
    async fn translate(&self, request: EngineRequest) -> Result<String, ProviderError> {
        let body = self.build_request(&request)?;
        debug!("DeepL {} -> {}: {} chars", body.source_lang, body.target_lang, request.text.len());
        let response = self.complete(&body).await?;
        Self::extract_text(response)
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let usage = self.usage().await?;
        debug!("DeepL usage: {}/{} characters", usage.character_count, usage.character_limit);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "DeepL"
    }
}
