//! Error types for the content API

use thiserror::Error;

/// Content API error
#[derive(Debug, Error)]
pub enum CmsError {
    /// HTTP request failed (network, timeout, body decoding)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading local content failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Content API answered with a non-success status
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// The ref (master or preview) was not accepted
    #[error("Invalid ref: {0}")]
    InvalidRef(String),

    /// A pagination cursor that does not belong to this content API
    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),

    /// Response did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl CmsError {
    /// The API refused the request itself (bad ref, bad token, bad query),
    /// as opposed to being unreachable.
    pub fn is_rejection(&self) -> bool {
        match self {
            CmsError::InvalidRef(_) | CmsError::InvalidCursor(_) => true,
            CmsError::Server { status, .. } => (400..500).contains(status),
            _ => false,
        }
    }

    /// Whether retrying the same request later may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            CmsError::Http(_) | CmsError::Io(_) => true,
            CmsError::Server { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

/// Result type for content API operations
pub type Result<T> = std::result::Result<T, CmsError>;
