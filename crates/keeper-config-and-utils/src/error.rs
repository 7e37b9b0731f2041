//! Error types for configuration and process setup.

use session_refresh::AuthError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    /// Invalid or inconsistent configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Config file could not be read or written as JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Home directory or other well-known location missing
    #[error("Path error: {0}")]
    Path(String),

    /// Failure reported by the auth provider or refresh coordinator
    #[error("Auth error: {0}")]
    Auth(AuthError),
}

impl From<AuthError> for CoreError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::Config(message) => CoreError::Config(message),
            other => CoreError::Auth(other),
        }
    }
}

/// Result type alias using CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
