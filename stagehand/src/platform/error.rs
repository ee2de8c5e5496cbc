//! Platform client error types

use thiserror::Error;

/// Errors raised while talking to the instance platform
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("Request to the platform failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status; the platform's message is surfaced as-is.
    #[error("{message}")]
    Remote { status: u16, message: String },

    #[error("Invalid platform response: {0}")]
    InvalidResponse(String),

    #[error("Invalid platform URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Event stream error: {0}")]
    EventStream(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for PlatformError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        PlatformError::EventStream(e.to_string())
    }
}

/// Result type for platform operations
pub type PlatformResult<T> = std::result::Result<T, PlatformError>;
