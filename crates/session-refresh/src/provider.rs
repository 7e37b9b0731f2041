//! Auth provider boundary.

use crate::{AuthEvent, AuthResult, Session};
use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::trace;

/// Default capacity of an auth event channel.
const DEFAULT_EVENT_CAPACITY: usize = 64;

/// External authority over the current session.
///
/// Implementations own the durable session state. The refresh coordinator
/// reads through `current_session` and only writes via `refresh_session`
/// and `sign_out`.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Current session, or `None` when signed out. Errors are reserved for
    /// genuine I/O failures.
    async fn current_session(&self) -> AuthResult<Option<Session>>;

    /// Renew the current session. Successful refreshes are also announced
    /// as `TokenRefreshed` on the event stream.
    async fn refresh_session(&self) -> AuthResult<Session>;

    /// Drop the current session. Announced as `SignedOut`.
    async fn sign_out(&self) -> AuthResult<()>;

    /// Register for auth state changes. Dropping the receiver unsubscribes.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}

/// Broadcast hub providers use to publish auth events.
#[derive(Debug, Clone)]
pub struct AuthEvents {
    tx: broadcast::Sender<AuthEvent>,
}

impl AuthEvents {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event. Having no listeners is not an error.
    pub fn emit(&self, event: AuthEvent) {
        let kind = event.kind.clone();
        if self.tx.send(event).is_err() {
            trace!(kind = ?kind, "Auth event dropped, no subscribers");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for AuthEvents {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AuthEventKind;

    #[tokio::test]
    async fn test_emit_reaches_subscriber() {
        let events = AuthEvents::new();
        let mut rx = events.subscribe();

        events.emit(AuthEvent::signed_out());

        let event = rx.recv().await.unwrap();
        assert_eq!(event.kind, AuthEventKind::SignedOut);
    }

    #[test]
    fn test_emit_without_subscribers_is_silent() {
        let events = AuthEvents::new();
        events.emit(AuthEvent::signed_out());
        assert_eq!(events.subscriber_count(), 0);
    }

    #[test]
    fn test_dropping_receiver_unsubscribes() {
        let events = AuthEvents::new();
        let rx = events.subscribe();
        assert_eq!(events.subscriber_count(), 1);
        drop(rx);
        assert_eq!(events.subscriber_count(), 0);
    }
}
