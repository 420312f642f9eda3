//! Error types for the Firebase Identity Toolkit client.

use thiserror::Error;

/// Result type for Firebase client operations.
pub type Result<T> = std::result::Result<T, FirebaseError>;

/// Firebase Identity Toolkit client errors.
#[derive(Debug, Error)]
pub enum FirebaseError {
    /// API error (non-2xx response carrying a Google error envelope)
    #[error("Firebase API error ({status}): {message}")]
    Api {
        status: u16,
        /// Machine-readable code from the envelope, e.g. "SESSION_EXPIRED"
        code: String,
        message: String,
    },

    /// Network error (connection failed, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// Parse error (invalid JSON, unexpected response format)
    #[error("Parse error: {0}")]
    Parse(String),
}

impl FirebaseError {
    /// Machine-readable API code, if this is an API error with one.
    pub fn api_code(&self) -> Option<&str> {
        match self {
            FirebaseError::Api { code, .. } if !code.is_empty() => Some(code),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FirebaseError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FirebaseError::Parse(err.to_string())
        } else {
            FirebaseError::Network(err.to_string())
        }
    }
}
