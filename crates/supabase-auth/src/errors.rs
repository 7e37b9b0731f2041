//! Mapping of GoTrue failures onto [`AuthError`].

use serde::Deserialize;
use session_refresh::AuthError;

/// GoTrue error codes meaning the refresh token can never be used again.
const SESSION_INVALID_CODES: [&str; 5] = [
    "refresh_token_not_found",
    "refresh_token_already_used",
    "session_expired",
    "session_not_found",
    "invalid_grant",
];

/// GoTrue error body. Older servers use `error`/`error_description`, newer
/// ones `error_code`/`msg`.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

impl ErrorBody {
    fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }

    fn code(&self) -> Option<&str> {
        self.error_code.as_deref().or(self.error.as_deref())
    }

    fn message(&self, status: u16, body: &str) -> String {
        self.msg
            .as_deref()
            .or(self.message.as_deref())
            .or(self.error_description.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {}: {}", status, body))
    }
}

fn is_server_failure(status: u16) -> bool {
    status >= 500 || status == 429
}

/// Classify a failed `grant_type=refresh_token` response.
pub(crate) fn refresh_failure(status: u16, body: &str) -> AuthError {
    let parsed = ErrorBody::parse(body);
    let message = parsed.message(status, body);

    if is_server_failure(status) {
        return AuthError::Server { status, message };
    }

    let invalid_code = parsed
        .code()
        .is_some_and(|code| SESSION_INVALID_CODES.contains(&code));

    if invalid_code || status == 401 || status == 403 {
        AuthError::SessionInvalid(message)
    } else {
        AuthError::TokenRefresh(message)
    }
}

/// Classify a failed `grant_type=password` response.
pub(crate) fn sign_in_failure(status: u16, body: &str) -> AuthError {
    let message = ErrorBody::parse(body).message(status, body);

    if is_server_failure(status) {
        AuthError::Server { status, message }
    } else {
        AuthError::InvalidCredentials(message)
    }
}

/// Map a transport-level reqwest failure.
pub(crate) fn transport_failure(error: reqwest::Error) -> AuthError {
    if error.is_timeout() {
        AuthError::Timeout
    } else if error.is_connect() {
        AuthError::NetworkUnavailable
    } else if error.is_decode() {
        AuthError::MalformedResponse(error.to_string())
    } else {
        AuthError::Network(error.to_string())
    }
}
