//! Proactive session refresh for Session Keeper clients.
//!
//! This crate provides:
//! - A coordinator that renews the session before it expires
//! - Single-flight refresh shared by timers, host signals and manual retries
//! - Classification of refresh failures into transient and terminal
//! - Explicit FSM-based refresh state tracking
//! - The provider and host boundaries the embedding application implements

mod clock;
mod config;
mod coordinator;
mod error;
mod host;
mod notice;
mod provider;
mod refresh_fsm;
mod session;

#[cfg(test)]
mod tests;

pub use clock::{Clock, SystemClock};
pub use config::{
    RefreshConfig, DEFAULT_CHECK_INTERVAL, DEFAULT_FAILURE_ALERT_AFTER, DEFAULT_REFRESH_THRESHOLD,
};
pub use coordinator::{RefreshCoordinator, RefreshHandle, StateCallback};
pub use error::{AuthError, AuthResult, FailureClass};
pub use host::{HostSignal, HostSignals};
pub use notice::{NoticeCallback, NoticeKind, UserNotice};
pub use provider::{AuthEvents, AuthProvider};
pub use refresh_fsm::refresh_machine;
pub use refresh_fsm::{RefreshMachine, RefreshMachineInput, RefreshMachineState, RefreshState};
pub use session::{AuthEvent, AuthEventKind, Session};
