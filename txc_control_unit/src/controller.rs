//! Controller seam between the loop driver and control logic.

use std::time::Instant;

use txc_common::device::{DeviceError, DeviceIo};
use txc_common::snapshot::{SampleSet, SensorSnapshot};

use crate::state::context::ControlContext;
use crate::state::engine;
use crate::station::WorkpieceOutcome;

/// What the loop driver should do after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Keep ticking.
    Continue,
    /// Leave the loop.
    Halt(HaltReason),
}

/// Why a controller halted its loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltReason {
    /// Emergency interlock tripped.
    EmergencyStop,
    /// Station sequence finished.
    SequenceComplete(WorkpieceOutcome),
    /// Controller cannot continue after a latched fault.
    Faulted,
}

/// Control logic driven once per tick by `CycleRunner`.
///
/// # Contract
///
/// - `sample_set` is stable for the lifetime of the controller; the loop
///   reads exactly those channels into the snapshot passed to `tick`.
/// - `tick` must not block; it may call actuators on `device`.
/// - A `DeviceError` returned from `tick` is handled by the loop: stalls
///   count as overruns, anything else latches a fault through `latch_fault`.
pub trait Controller {
    /// Short identifier for logs.
    fn name(&self) -> &'static str;

    /// Channels to sample each tick.
    fn sample_set(&self) -> SampleSet;

    /// Run one tick against a fresh snapshot.
    fn tick(
        &mut self,
        snapshot: &SensorSnapshot,
        ctx: &mut ControlContext,
        device: &mut dyn DeviceIo,
    ) -> Result<TickOutcome, DeviceError>;

    /// Force the Fault state after a collaborator failure and tell the loop
    /// whether to keep ticking. The default keeps the loop alive in Fault.
    fn latch_fault(
        &mut self,
        ctx: &mut ControlContext,
        device: &mut dyn DeviceIo,
        cause: &str,
        at: Instant,
    ) -> TickOutcome {
        engine::latch_fault(ctx, device, cause, at);
        TickOutcome::Continue
    }
}
