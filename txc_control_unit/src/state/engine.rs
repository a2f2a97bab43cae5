//! FSM execution engine.
//!
//! One `evaluate` per tick:
//! 1. If `target != current`, run the entry activity of `target` once and
//!    commit it as `current`.
//! 2. Run the do activity of `current`, which picks the next `target`
//!    through `guards::select_target`. The do activity never writes
//!    `current`.
//!
//! Entry activities own every actuator call; guards are pure.

use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, error, warn};
use txc_common::config::{ChannelConfig, DwellPolicy, EngineConfig};
use txc_common::consts::{ERR_LATCHED_FAULT, ERR_NONE, ERR_TRANSIENT};
use txc_common::device::{DeviceError, DeviceIo};
use txc_common::snapshot::{SampleSet, SensorSnapshot};
use txc_common::state::State;

use crate::controller::{Controller, TickOutcome};
use crate::state::context::ControlContext;
use crate::state::guards::{GuardConfig, select_target};

/// Five-state operating-mode machine.
#[derive(Debug, Clone)]
pub struct Engine {
    guards: GuardConfig,
    idle_speed: i32,
    dwell_policy: DwellPolicy,
}

impl Engine {
    /// Build from the `[engine]` and `[channels]` sections.
    pub fn new(engine: &EngineConfig, channels: &ChannelConfig) -> Self {
        Self {
            guards: GuardConfig::from_config(engine, channels),
            idle_speed: engine.idle_speed,
            dwell_policy: engine.dwell_policy,
        }
    }

    /// Guard channels and timings.
    pub const fn guards(&self) -> &GuardConfig {
        &self.guards
    }

    /// Dwell realisation in use.
    pub const fn dwell_policy(&self) -> DwellPolicy {
        self.dwell_policy
    }

    /// Run one engine step against `snapshot`.
    ///
    /// # Errors
    /// Propagates the first `DeviceError` raised by an entry activity. The
    /// transition is then not committed; `current` keeps its old value.
    pub fn evaluate(
        &self,
        snapshot: &SensorSnapshot,
        ctx: &mut ControlContext,
        device: &mut dyn DeviceIo,
    ) -> Result<(), DeviceError> {
        if ctx.target != ctx.current {
            self.enter(ctx.target, snapshot.taken_at(), ctx, device)?;
        }
        self.do_activity(snapshot, ctx);
        Ok(())
    }

    fn enter(
        &self,
        state: State,
        at: Instant,
        ctx: &mut ControlContext,
        device: &mut dyn DeviceIo,
    ) -> Result<(), DeviceError> {
        let from = ctx.current;
        match state {
            State::Idle => {
                device.set_speed(self.idle_speed)?;
                ctx.motor_speed = self.idle_speed;
                ctx.error_code = ERR_NONE;
            }
            State::Running => device.set_motor(ctx.motor_speed, 0)?,
            State::Stopped => device.set_motor(0, 0)?,
            State::Error => {
                device.set_motor(0, 0)?;
                ctx.error_code = ERR_TRANSIENT;
            }
            State::Fault => {
                device.set_motor(0, 0)?;
                ctx.error_code = ERR_LATCHED_FAULT;
            }
        }
        ctx.status = state.label();
        ctx.current = state;
        ctx.entered_at = Some(at);
        ctx.transitions += 1;
        debug!("State: {from} -> {state}");
        Ok(())
    }

    fn do_activity(&self, snapshot: &SensorSnapshot, ctx: &mut ControlContext) {
        if ctx.current == State::Error && self.dwell_policy == DwellPolicy::Blocking {
            debug!("Error dwell: blocking for {:?}", self.guards.error_dwell);
            thread::sleep(self.guards.error_dwell);
            ctx.target = State::Idle;
            return;
        }

        let time_in_state = ctx
            .entered_at
            .map(|t| snapshot.taken_at().saturating_duration_since(t))
            .unwrap_or(Duration::ZERO);
        if let Some(next) = select_target(ctx.current, snapshot, time_in_state, &self.guards) {
            ctx.target = next;
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(&EngineConfig::default(), &ChannelConfig::default())
    }
}

impl Controller for Engine {
    fn name(&self) -> &'static str {
        "fsm"
    }

    fn sample_set(&self) -> SampleSet {
        self.guards.sample_set()
    }

    fn tick(
        &mut self,
        snapshot: &SensorSnapshot,
        ctx: &mut ControlContext,
        device: &mut dyn DeviceIo,
    ) -> Result<TickOutcome, DeviceError> {
        self.evaluate(snapshot, ctx, device)?;
        Ok(TickOutcome::Continue)
    }
}

/// Force the Fault state.
///
/// Turns the motor off on a best-effort basis (a failing device must not
/// prevent the latch), sets error code 3 and status "FAULT", and pins both
/// `current` and `target` to Fault. Repeated calls keep the original entry
/// time.
pub fn latch_fault(ctx: &mut ControlContext, device: &mut dyn DeviceIo, cause: &str, at: Instant) {
    if let Err(e) = device.set_motor(0, 0) {
        warn!("Motor off during fault latch failed: {e}");
    }
    if !ctx.is_faulted() {
        error!("Fault latched in {}: {cause}", ctx.current);
        ctx.entered_at = Some(at);
        ctx.transitions += 1;
    }
    ctx.error_code = ERR_LATCHED_FAULT;
    ctx.status = State::Fault.label();
    ctx.current = State::Fault;
    ctx.target = State::Fault;
}
