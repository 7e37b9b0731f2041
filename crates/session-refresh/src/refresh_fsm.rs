//! Refresh scheduling state machine using rust-fsm.
//!
//! Tracks what the coordinator is currently doing about the session's
//! expiry. The machine never decides anything by itself; the coordinator
//! feeds it inputs as timers are armed and refreshes start and settle.
//!
//! ## State Diagram
//!
//! ```text
//! ┌─────────────────┐   Arm    ┌─────────────────┐
//! │      Idle       │ ───────► │    Scheduled    │ ◄──┐ Arm (replace)
//! └────────┬────────┘ ◄─────── └────────┬────────┘ ───┘
//!          │          Disarm            │
//!          │ BeginRefresh               │ BeginRefresh
//!          ▼                            ▼
//!        ┌──────────────────────────────────┐
//!        │            Refreshing            │ ◄── Arm / Disarm
//!        └───────┬──────────────────┬───────┘
//!                │ SettleArmed      │ SettleIdle
//!                ▼                  ▼
//!            Scheduled             Idle
//! ```

use rust_fsm::*;
use serde::{Deserialize, Serialize};

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub refresh_machine(Idle)

    Idle => {
        Arm => Scheduled,
        Disarm => Idle,
        BeginRefresh => Refreshing
    },
    Scheduled => {
        // Re-arming replaces the pending timer
        Arm => Scheduled,
        Disarm => Idle,
        BeginRefresh => Refreshing
    },
    Refreshing => {
        // Auth events may re-arm while the refresh is outstanding
        Arm => Refreshing,
        Disarm => Refreshing,
        SettleArmed => Scheduled,
        SettleIdle => Idle
    }
}

pub use refresh_machine::Input as RefreshMachineInput;
pub use refresh_machine::State as RefreshMachineState;
pub use refresh_machine::StateMachine as RefreshMachine;

/// Coordinator state for external consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshState {
    /// No timer armed and no refresh running.
    Idle,
    /// A one-shot refresh timer is armed.
    Scheduled,
    /// A refresh call is outstanding.
    Refreshing,
}

impl RefreshState {
    /// Returns true while a refresh call is outstanding.
    pub fn is_refreshing(&self) -> bool {
        matches!(self, RefreshState::Refreshing)
    }
}

impl From<&RefreshMachineState> for RefreshState {
    fn from(state: &RefreshMachineState) -> Self {
        match state {
            RefreshMachineState::Idle => RefreshState::Idle,
            RefreshMachineState::Scheduled => RefreshState::Scheduled,
            RefreshMachineState::Refreshing => RefreshState::Refreshing,
        }
    }
}
