//! Integration tests for the session refresh coordinator.
//!
//! All tests run on paused tokio time; the coordinator reads wall time
//! through a clock bound to it.
//!
//! - `harness.rs`       - Mock provider, test clock and recorders
//! - `scheduling.rs`    - Timer arming, re-arming and immediate refresh
//! - `single_flight.rs` - At most one provider refresh in flight
//! - `auth_events.rs`   - Reactions to provider auth events
//! - `host_events.rs`   - Reactions to visibility and connectivity signals
//! - `failures.rs`      - Terminal vs. transient refresh failures
//! - `lifecycle.rs`     - Start, stop and drop

mod failures;
mod host_events;
