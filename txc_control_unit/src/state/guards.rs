//! Transition selection.
//!
//! `select_target` is pure: it looks only at the active state, the tick's
//! snapshot and the time spent in the state. The first true guard wins.
//!
//! | From    | Guard (in order)                 | To      |
//! |---------|----------------------------------|---------|
//! | Idle    | `switch(start)`                  | Running |
//! | Running | `switch(stop)`                   | Stopped |
//! | Running | `sensor(error)`                  | Error   |
//! | Stopped | `switch(start)`                  | Idle    |
//! | Error   | time in state >= dwell           | Idle    |
//! | Fault   | none                             | -       |

use std::time::Duration;

use txc_common::config::{ChannelConfig, EngineConfig};
use txc_common::device::ChannelId;
use txc_common::snapshot::{SampleSet, SensorSnapshot};
use txc_common::state::State;

/// Channels and timings the guards consult.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardConfig {
    /// Idle → Running, Stopped → Idle.
    pub start_switch: ChannelId,
    /// Running → Stopped.
    pub stop_switch: ChannelId,
    /// Running → Error.
    pub error_sensor: ChannelId,
    /// Minimum time in Error.
    pub error_dwell: Duration,
}

impl GuardConfig {
    /// Build from the `[engine]` and `[channels]` sections.
    pub fn from_config(engine: &EngineConfig, channels: &ChannelConfig) -> Self {
        Self {
            start_switch: channels.start_switch,
            stop_switch: channels.stop_switch,
            error_sensor: channels.error_sensor,
            error_dwell: engine.error_dwell(),
        }
    }

    /// Channels the guards read.
    pub const fn sample_set(&self) -> SampleSet {
        SampleSet::new()
            .switch(self.start_switch)
            .switch(self.stop_switch)
            .sensor(self.error_sensor)
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default(), &ChannelConfig::default())
    }
}

/// Next target for `current`, or `None` to stay.
pub fn select_target(
    current: State,
    snapshot: &SensorSnapshot,
    time_in_state: Duration,
    guards: &GuardConfig,
) -> Option<State> {
    match current {
        State::Idle => snapshot.switch(guards.start_switch).then_some(State::Running),
        State::Running => {
            if snapshot.switch(guards.stop_switch) {
                Some(State::Stopped)
            } else if snapshot.sensor(guards.error_sensor) {
                Some(State::Error)
            } else {
                None
            }
        }
        State::Stopped => snapshot.switch(guards.start_switch).then_some(State::Idle),
        State::Error => (time_in_state >= guards.error_dwell).then_some(State::Idle),
        State::Fault => None,
    }
}
