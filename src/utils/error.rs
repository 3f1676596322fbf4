use crate::domain::model::FailureKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("No base URL: inbound request carries no host and no fallback is configured")]
    BaseUrlUnresolved,

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("API returned {status} for {url}")]
    StatusError { status: u16, url: String },

    #[error("Malformed response body from {url}: {message}")]
    DecodeError { url: String, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

impl FetchError {
    /// Collapses the error into the coarse kind reported by `FetchOutcome`.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            FetchError::BaseUrlUnresolved => FailureKind::BaseUrlUnresolved,
            FetchError::StatusError { .. } => FailureKind::Status,
            FetchError::DecodeError { .. } => FailureKind::Decode,
            FetchError::ApiError(e) if e.is_decode() => FailureKind::Decode,
            FetchError::ApiError(e) if e.is_status() => FailureKind::Status,
            FetchError::ApiError(_) | FetchError::IoError(_) => FailureKind::Transport,
            FetchError::InvalidRequest { .. }
            | FetchError::ConfigError { .. }
            | FetchError::ConfigValidationError { .. }
            | FetchError::InvalidConfigValueError { .. } => FailureKind::InvalidRequest,
        }
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;
