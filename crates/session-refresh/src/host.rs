//! Host runtime notifications.
//!
//! The embedding application translates whatever its platform offers
//! (window focus, system resume, connectivity changes, signals) into
//! [`HostSignal`]s and publishes them through [`HostSignals`].

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::trace;

const DEFAULT_SIGNAL_CAPACITY: usize = 16;

/// A host-side change the coordinator may react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostSignal {
    /// The application came back to the foreground. Timers may have been
    /// throttled while it was hidden.
    BecameVisible,
    /// The application went to the background.
    BecameHidden,
    /// Network connectivity came back.
    Online,
    /// Network connectivity was lost.
    Offline,
}

impl HostSignal {
    /// Returns true for signals after which the session should be re-checked.
    pub fn warrants_check(&self) -> bool {
        matches!(self, HostSignal::BecameVisible | HostSignal::Online)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HostSignal::BecameVisible => "visible",
            HostSignal::BecameHidden => "hidden",
            HostSignal::Online => "online",
            HostSignal::Offline => "offline",
        }
    }
}

/// Broadcast hub for host signals.
#[derive(Debug, Clone)]
pub struct HostSignals {
    tx: broadcast::Sender<HostSignal>,
}

impl HostSignals {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(DEFAULT_SIGNAL_CAPACITY);
        Self { tx }
    }

    pub fn notify(&self, signal: HostSignal) {
        if self.tx.send(signal).is_err() {
            trace!(signal = ?signal, "Host signal dropped, no subscribers");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HostSignal> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for HostSignals {
    fn default() -> Self {
        Self::new()
    }
}
