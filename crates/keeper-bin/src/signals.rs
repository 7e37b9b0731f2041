//! Process signals translated into host signals.
//!
//! A headless process has no window or network monitor, so the operator (or a
//! supervisor script) stands in for them:
//!
//! - `SIGUSR1` → [`HostSignal::BecameVisible`]
//! - `SIGUSR2` → [`HostSignal::Online`]

use session_refresh::HostSignal;
use std::io;

#[cfg(unix)]
pub struct SignalListener {
    visible: tokio::signal::unix::Signal,
    online: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl SignalListener {
    pub fn install() -> io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            visible: signal(SignalKind::user_defined1())?,
            online: signal(SignalKind::user_defined2())?,
        })
    }

    /// Wait for the next mapped signal. `None` once the streams are gone.
    pub async fn next(&mut self) -> Option<HostSignal> {
        tokio::select! {
            received = self.visible.recv() => received.map(|_| HostSignal::BecameVisible),
            received = self.online.recv() => received.map(|_| HostSignal::Online),
        }
    }
}

#[cfg(not(unix))]
pub struct SignalListener;

#[cfg(not(unix))]
impl SignalListener {
    pub fn install() -> io::Result<Self> {
        Ok(Self)
    }

    pub async fn next(&mut self) -> Option<HostSignal> {
        std::future::pending().await
    }
}
