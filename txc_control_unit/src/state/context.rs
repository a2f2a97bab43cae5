//! Mutable control record shared by a loop and its controller.
//!
//! Fields are writable only from inside this crate (controller handlers).
//! Hosts read them through accessors and steer the machine with
//! `request_transition` or the fault hook.

use std::time::Instant;

use txc_common::consts::{DEFAULT_IDLE_SPEED, ERR_NONE};
use txc_common::state::State;

/// Result of a transition request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionResult {
    /// Request accepted; the engine enters this state on its next evaluate.
    Ok(State),
    /// Request rejected; reason.
    Rejected(&'static str),
}

/// Per-loop control record.
#[derive(Debug, Clone)]
pub struct ControlContext {
    pub(crate) current: State,
    pub(crate) target: State,
    pub(crate) error_code: i32,
    pub(crate) status: &'static str,
    pub(crate) motor_speed: i32,
    pub(crate) position: i64,
    pub(crate) entered_at: Option<Instant>,
    pub(crate) transitions: u64,
}

impl ControlContext {
    /// Fresh record: Idle, no error, motor speed at `idle_speed`.
    pub fn new(idle_speed: i32) -> Self {
        Self {
            current: State::Idle,
            target: State::Idle,
            error_code: ERR_NONE,
            status: State::Idle.label(),
            motor_speed: idle_speed,
            position: 0,
            entered_at: None,
            transitions: 0,
        }
    }

    /// Active state.
    #[inline]
    pub const fn current(&self) -> State {
        self.current
    }

    /// State the engine will enter on its next evaluate.
    #[inline]
    pub const fn target(&self) -> State {
        self.target
    }

    /// Error code (0 = none).
    #[inline]
    pub const fn error_code(&self) -> i32 {
        self.error_code
    }

    /// Human-readable status label.
    #[inline]
    pub const fn status(&self) -> &'static str {
        self.status
    }

    /// Motor speed setpoint.
    #[inline]
    pub const fn motor_speed(&self) -> i32 {
        self.motor_speed
    }

    /// Position counter.
    #[inline]
    pub const fn position(&self) -> i64 {
        self.position
    }

    /// When the current state was entered (`None` before the first transition).
    #[inline]
    pub const fn entered_at(&self) -> Option<Instant> {
        self.entered_at
    }

    /// Number of transitions committed.
    #[inline]
    pub const fn transitions(&self) -> u64 {
        self.transitions
    }

    /// Whether a fault has been latched.
    #[inline]
    pub fn is_faulted(&self) -> bool {
        self.current == State::Fault
    }

    /// Ask the engine to move to `target` on its next evaluate.
    ///
    /// Rejected once a fault is latched, and for `Fault` itself, which is
    /// entered only through the fault hook.
    pub fn request_transition(&mut self, target: State) -> TransitionResult {
        if self.is_faulted() {
            return TransitionResult::Rejected("fault latched; restart required");
        }
        if target == State::Fault {
            return TransitionResult::Rejected("fault is entered only through latch_fault");
        }
        self.target = target;
        TransitionResult::Ok(target)
    }
}

impl Default for ControlContext {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE_SPEED)
    }
}
