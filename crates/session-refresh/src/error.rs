//! Authentication error types.

use thiserror::Error;

/// Substrings in an untyped provider message that mark the session itself as
/// unusable.
const TERMINAL_MESSAGE_MARKERS: [&str; 2] = ["expired", "invalid"];

/// Authentication error type.
///
/// Cloneable so a single refresh result can be handed to every caller that
/// joined the in-flight refresh.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Invalid email or password
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Token refresh error reported by the provider without a typed cause
    #[error("Token refresh failed: {0}")]
    TokenRefresh(String),

    /// Session not found
    #[error("Not logged in")]
    NotLoggedIn,

    /// Session expired and can no longer be refreshed
    #[error("Session expired")]
    SessionExpired,

    /// Session was invalidated server-side (revoked, logged out elsewhere, etc.)
    #[error("Session invalid: {0}")]
    SessionInvalid(String),

    /// Provider answered with a server-side failure
    #[error("Auth server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    /// Network unavailable (transient error, can retry)
    #[error("Network unavailable")]
    NetworkUnavailable,

    /// Any other transport failure
    #[error("Network error: {0}")]
    Network(String),

    /// Timeout error
    #[error("Operation timed out")]
    Timeout,

    /// Malformed provider payload
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Provider failure that fits no other variant
    #[error("Auth provider error: {0}")]
    Provider(String),

    /// The refresh coordinator has been stopped
    #[error("Refresh coordinator stopped")]
    CoordinatorStopped,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// How a failed refresh should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Retrying later may succeed; log and wait for the next check.
    Transient,
    /// The session cannot be renewed; the user must sign in again.
    Terminal,
}

impl AuthError {
    /// Returns true if this error is transient and the operation can be retried.
    ///
    /// Transient errors include:
    /// - Network unavailable or other transport failures
    /// - Server-side (5xx) failures
    /// - Timeouts
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AuthError::NetworkUnavailable
                | AuthError::Network(_)
                | AuthError::Timeout
                | AuthError::Server { .. }
        )
    }

    /// Classify a refresh failure.
    ///
    /// Typed variants decide directly. Untyped provider messages fall back to
    /// a substring match on "expired"/"invalid". Everything else is transient.
    pub fn classify(&self) -> FailureClass {
        match self {
            AuthError::SessionExpired | AuthError::SessionInvalid(_) => FailureClass::Terminal,
            AuthError::TokenRefresh(message) | AuthError::Provider(message) => {
                let message = message.to_ascii_lowercase();
                if TERMINAL_MESSAGE_MARKERS
                    .iter()
                    .any(|marker| message.contains(marker))
                {
                    FailureClass::Terminal
                } else {
                    FailureClass::Transient
                }
            }
            _ => FailureClass::Transient,
        }
    }

    /// Returns true if the failure requires a fresh sign-in.
    pub fn is_terminal(&self) -> bool {
        self.classify() == FailureClass::Terminal
    }
}

/// Result type alias using AuthError.
pub type AuthResult<T> = Result<T, AuthError>;
