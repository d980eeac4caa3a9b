/*!
 * Error types for the rstlate application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when talking to a translation engine
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The account has used up its character allowance
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),
}

impl ProviderError {
    /// Whether a later attempt at the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ConnectionError(_) | Self::RateLimitExceeded(_) => true,
            Self::ApiError { status_code, .. } => *status_code == 429 || *status_code >= 500,
            Self::RequestFailed(_)
            | Self::ParseError(_)
            | Self::AuthenticationError(_)
            | Self::QuotaExceeded(_) => false,
        }
    }
}

/// Errors raised by the markup protection layer
#[derive(Error, Debug)]
pub enum MarkupError {
    /// Two classified fragments claim overlapping byte ranges
    #[error("Overlapping fragments {spans:?} in text: {text:?}")]
    OverlappingFragments {
        /// The text unit being classified
        text: String,
        /// The offending spans as (start, end) pairs
        spans: Vec<(usize, usize)>,
    },

    /// A configured repair rule would break the repair pass
    #[error("Invalid repair rule '{name}': {reason}")]
    InvalidRepairRule {
        /// Rule name or source phrase
        name: String,
        /// Why the rule was rejected
        reason: String,
    },
}

/// Errors that can occur while translating a single text unit
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Error from the engine API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from the markup layer
    #[error("Markup error: {0}")]
    Markup(#[from] MarkupError),

    /// A transient engine failure persisted through every attempt
    #[error("Translation failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Number of attempts made
        attempts: u32,
        /// The last error seen
        last: ProviderError,
    },

    /// The user interrupted the run
    #[error("Translation cancelled")]
    Cancelled,

    /// Error reading or writing the translation cache
    #[error("Cache error: {0}")]
    Cache(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from the markup layer
    #[error("Markup error: {0}")]
    Markup(#[from] MarkupError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Error reading or writing a message catalog
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
