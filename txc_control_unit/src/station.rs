//! Workpiece station sequencer.
//!
//! Moves a workpiece past the inspection sensor and sorts it:
//!
//! ```text
//! Idle ──tick──▶ Travelling ──travel time──▶ Inspecting ──tick──▶ Complete
//!        motor fwd              motor off         accept/reject output
//! ```
//!
//! The inspection sensor channel equals the workpiece id. Inspection uses
//! the snapshot of the tick after the conveyor stopped, so the reading is
//! taken with the workpiece at rest. Every phase is a single non-blocking
//! tick; the loop driver paces the sequence.

use std::time::{Duration, Instant};

use tracing::{debug, info};
use txc_common::config::StationConfig;
use txc_common::device::{ChannelId, DeviceError, DeviceIo};
use txc_common::snapshot::{SampleSet, SensorSnapshot};

use crate::controller::{Controller, HaltReason, TickOutcome};
use crate::state::context::ControlContext;
use crate::state::engine;

/// Sequence phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationPhase {
    /// Not started.
    Idle,
    /// Conveyor running since the given instant.
    Travelling(Instant),
    /// Conveyor stopped, waiting for the inspection reading.
    Inspecting,
    /// Sorted.
    Complete(WorkpieceOutcome),
}

/// Inspection result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkpieceOutcome {
    /// Sensor active; accept output raised.
    Accepted,
    /// Sensor inactive; reject output raised.
    Rejected,
}

/// One-workpiece sorting sequence.
#[derive(Debug, Clone)]
pub struct WorkpieceStation {
    workpiece: ChannelId,
    travel: Duration,
    accept_output: ChannelId,
    reject_output: ChannelId,
    phase: StationPhase,
}

impl WorkpieceStation {
    /// Sequence for `workpiece` using the `[station]` section.
    pub fn new(workpiece: ChannelId, config: &StationConfig) -> Self {
        Self {
            workpiece,
            travel: config.travel(),
            accept_output: config.accept_output,
            reject_output: config.reject_output,
            phase: StationPhase::Idle,
        }
    }

    /// Workpiece id (also the inspection sensor channel).
    pub const fn workpiece(&self) -> ChannelId {
        self.workpiece
    }

    /// Current phase.
    pub const fn phase(&self) -> StationPhase {
        self.phase
    }

    /// Check that both sorting outputs exist on `device`.
    ///
    /// # Errors
    /// Returns `DeviceError::InvalidChannel` for the first output outside
    /// the device's output range.
    pub fn check_outputs(&self, device: &dyn DeviceIo) -> Result<(), DeviceError> {
        let limit = device.output_channels();
        match [self.accept_output, self.reject_output]
            .into_iter()
            .find(|&ch| ch as usize >= limit)
        {
            Some(ch) => Err(DeviceError::InvalidChannel(ch)),
            None => Ok(()),
        }
    }
}

impl Controller for WorkpieceStation {
    fn name(&self) -> &'static str {
        "workpiece"
    }

    fn sample_set(&self) -> SampleSet {
        SampleSet::new().sensor(self.workpiece)
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

        match self.phase {
            StationPhase::Idle => {
                info!("Processing workpiece {}", self.workpiece);
                device.set_motor(ctx.motor_speed, 0)?;
                self.phase = StationPhase::Travelling(snapshot.taken_at());
            }
            StationPhase::Travelling(since) => {
                let travelled = snapshot.taken_at().saturating_duration_since(since);
                if travelled >= self.travel {
                    device.set_motor(0, 0)?;
                    debug!("Workpiece {} at inspection after {travelled:?}", self.workpiece);
                    self.phase = StationPhase::Inspecting;
                }
            }
            StationPhase::Inspecting => {
                let (output, outcome) = if snapshot.sensor(self.workpiece) {
                    (self.accept_output, WorkpieceOutcome::Accepted)
                } else {
                    (self.reject_output, WorkpieceOutcome::Rejected)
                };
                device.set_digital_output(output, true)?;
                info!("Workpiece {} {outcome:?}", self.workpiece);
                self.phase = StationPhase::Complete(outcome);
                return Ok(TickOutcome::Halt(HaltReason::SequenceComplete(outcome)));
            }
            StationPhase::Complete(outcome) => {
                return Ok(TickOutcome::Halt(HaltReason::SequenceComplete(outcome)));
            }
        }
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
