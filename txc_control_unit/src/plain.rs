//! Plain control loop.
//!
//! Per tick, in order:
//! 1. Emergency interlock: all emergency sensors active → motor off,
//!    error code 1, halt. Status is left as it was. The motor-off write is
//!    best-effort; a trip halts even if the write fails.
//! 2. Motor forward at the speed setpoint while the run switch is pressed,
//!    otherwise off.
//! 3. Position counter +1.
//!
//! The interlock is checked before any drive command so a tripped tick
//! never turns the motor on.

use std::time::Instant;

use tracing::warn;
use txc_common::config::ChannelConfig;
use txc_common::consts::ERR_EMERGENCY_STOP;
use txc_common::device::{ChannelId, DeviceError, DeviceIo};
use txc_common::snapshot::{SampleSet, SensorSnapshot};

use crate::controller::{Controller, HaltReason, TickOutcome};
use crate::safety::interlock::EmergencyInterlock;
use crate::state::context::ControlContext;
use crate::state::engine;

/// Run-switch motor control behind the emergency interlock.
#[derive(Debug, Clone)]
pub struct PlainLoop {
    interlock: EmergencyInterlock,
    run_switch: ChannelId,
}

impl PlainLoop {
    /// Build from the `[channels]` section.
    pub fn new(channels: &ChannelConfig) -> Self {
        Self {
            interlock: EmergencyInterlock::new(channels.estop_sensors.clone()),
            run_switch: channels.run_switch,
        }
    }

    /// The interlock guarding this loop.
    pub fn interlock(&self) -> &EmergencyInterlock {
        &self.interlock
    }
}

impl Default for PlainLoop {
    fn default() -> Self {
        Self::new(&ChannelConfig::default())
    }
}

impl Controller for PlainLoop {
    fn name(&self) -> &'static str {
        "plain"
    }

    fn sample_set(&self) -> SampleSet {
        self.interlock.sample_set().union(SampleSet::new().switch(self.run_switch))
    }

    fn tick(
        &mut self,
        snapshot: &SensorSnapshot,
        ctx: &mut ControlContext,
        device: &mut dyn DeviceIo,
    ) -> Result<TickOutcome, DeviceError> {
        if ctx.is_faulted() {
            return Ok(TickOutcome::Halt(HaltReason::Faulted));
        }

        if self.interlock.is_tripped(snapshot) {
            ctx.error_code = ERR_EMERGENCY_STOP;
            if let Err(e) = device.set_motor(0, 0) {
                warn!("Emergency stop: motor-off command failed: {e}");
            }
            warn!(
                "Emergency stop activated (sensors {:?})",
                self.interlock.sensors()
            );
            return Ok(TickOutcome::Halt(HaltReason::EmergencyStop));
        }

        if snapshot.switch(self.run_switch) {
            device.set_motor(ctx.motor_speed, 0)?;
        } else {
            device.set_motor(0, 0)?;
        }
        ctx.position += 1;
        Ok(TickOutcome::Continue)
    }

    fn latch_fault(
        &mut self,
        ctx: &mut ControlContext,
        device: &mut dyn DeviceIo,
        cause: &str,
        at: Instant,
    ) -> TickOutcome {
        engine::latch_fault(ctx, device, cause, at);
        TickOutcome::Halt(HaltReason::Faulted)
    }
}
