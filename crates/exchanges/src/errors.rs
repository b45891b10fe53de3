//! Exchange-specific error types
//!
//! Every failure a caller can see falls into one [`ErrorKind`]. The kind is
//! what decides handling: configuration problems stop the process, network
//! failures may be retried by the caller, exchange rejections and
//! validation failures are permanent for the request that caused them.

use thiserror::Error;

/// Result type for exchange operations
pub type Result<T> = std::result::Result<T, ExchangeError>;

/// Exchange operation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExchangeError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("signing failed: {0}, check the API secret")]
    Signing(String),

    #[error("network request failed: {0}")]
    Network(String),

    #[error("API request failed (status {status}): {message}")]
    Api {
        status: u16,
        code: Option<i64>,
        message: String,
    },

    #[error("order rejected: {reason}")]
    Validation { reason: String },

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Coarse classification of [`ExchangeError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Config,
    Signing,
    Network,
    Api,
    Validation,
    Decode,
}

impl ExchangeError {
    /// Order failed an instrument constraint
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) | Self::InvalidUrl(_) => ErrorKind::Config,
            Self::Signing(_) => ErrorKind::Signing,
            Self::Network(_) => ErrorKind::Network,
            Self::Api { .. } => ErrorKind::Api,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Decode(_) => ErrorKind::Decode,
        }
    }

    /// Only transport failures are worth repeating unchanged.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Network
    }

    /// Exchange-assigned error code, when the exchange supplied one
    pub fn api_code(&self) -> Option<i64> {
        match self {
            Self::Api { code, .. } => *code,
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ExchangeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<url::ParseError> for ExchangeError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

impl From<perpdesk_core::DecimalError> for ExchangeError {
    fn from(err: perpdesk_core::DecimalError) -> Self {
        Self::Decode(err.to_string())
    }
}
