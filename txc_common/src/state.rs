//! Operating-mode enum for the control executive.
//!
//! `#[repr(u8)]` keeps the state one byte wide for compact status records.

use serde::{Deserialize, Serialize};
use static_assertions::assert_eq_size;

/// Operating mode of the device (exactly one is current at any time).
///
/// `Fault` is a trap state: no guard leaves it, only a process restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum State {
    /// Ready, motor stopped, speed setpoint at idle default.
    #[default]
    Idle = 0,
    /// Motor driven forward.
    Running = 1,
    /// Stopped by operator switch.
    Stopped = 2,
    /// Transient error; returns to Idle after the dwell.
    Error = 3,
    /// Latched fault; terminal within the machine.
    Fault = 4,
}

assert_eq_size!(State, u8);

impl State {
    /// Every state, in declaration order.
    pub const ALL: [State; 5] = [
        State::Idle,
        State::Running,
        State::Stopped,
        State::Error,
        State::Fault,
    ];

    /// Convert from raw `u8`. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Idle),
            1 => Some(Self::Running),
            2 => Some(Self::Stopped),
            3 => Some(Self::Error),
            4 => Some(Self::Fault),
            _ => None,
        }
    }

    /// Status label published while this state is current.
    #[inline]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Running => "RUNNING",
            Self::Stopped => "STOPPED",
            Self::Error => "ERROR",
            Self::Fault => "FAULT",
        }
    }

    /// Whether the state has no outgoing transition.
    #[inline]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Fault)
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
