//! Session and auth event types shared with auth providers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An authenticated session as issued by the auth provider.
///
/// The refresh coordinator only ever looks at `expires_at`; the credential
/// fields are carried for the provider and the embedding application.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Absolute expiry, seconds since the Unix epoch.
    pub expires_at: i64,
}

impl Session {
    /// Milliseconds left until expiry at `now`. Negative once expired.
    pub fn millis_until_expiry(&self, now: DateTime<Utc>) -> i64 {
        self.expires_at
            .saturating_mul(1000)
            .saturating_sub(now.timestamp_millis())
    }

    /// Returns true if the session is expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.millis_until_expiry(now) <= 0
    }
}

// Tokens must never end up in logs.
impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// Kind of auth state change reported by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthEventKind {
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
    /// Anything else the provider emits, passed through untouched.
    Other(String),
}

/// Auth state change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthEvent {
    pub kind: AuthEventKind,
    pub session: Option<Session>,
}

impl AuthEvent {
    pub fn signed_in(session: Session) -> Self {
        Self {
            kind: AuthEventKind::SignedIn,
            session: Some(session),
        }
    }

    pub fn token_refreshed(session: Session) -> Self {
        Self {
            kind: AuthEventKind::TokenRefreshed,
            session: Some(session),
        }
    }

    pub fn signed_out() -> Self {
        Self {
            kind: AuthEventKind::SignedOut,
            session: None,
        }
    }
}
