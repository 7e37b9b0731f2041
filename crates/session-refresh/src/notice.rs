//! User-visible notices raised by the coordinator.

use serde::{Deserialize, Serialize};

const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please sign in again.";

/// What kind of notice this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    /// The session could not be renewed and has been signed out.
    SessionExpired,
}

/// A message the embedding application should show to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserNotice {
    pub kind: NoticeKind,
    pub message: String,
}

impl UserNotice {
    pub fn session_expired() -> Self {
        Self {
            kind: NoticeKind::SessionExpired,
            message: SESSION_EXPIRED_MESSAGE.to_string(),
        }
    }
}

/// Callback type for user notices.
pub type NoticeCallback = Box<dyn Fn(UserNotice) + Send + Sync>;
