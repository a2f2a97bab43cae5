//! Fixed-period loop driver: sample → control → sleep.
//!
//! ## Tick
//! 1. Check cancellation and the optional tick limit.
//! 2. Capture a `SensorSnapshot` of the controller's `SampleSet`.
//! 3. Run `Controller::tick` with the snapshot, the context and the device.
//! 4. Sleep the remainder of the period. A tick longer than the period
//!    skips the sleep and counts an overrun; the loop keeps going.
//!
//! ## Failures
//! A `DeviceError::Timeout` from the snapshot or the tick is a stall: the
//! tick is abandoned and counted, then paced like any other tick (sleep
//! the remainder, overrun only past the period). Any other device error is
//! logged and latched as Fault through `Controller::latch_fault`. Nothing
//! escapes the loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};
use txc_common::consts::DEFAULT_REPORT_INTERVAL;
use txc_common::device::{DeviceError, DeviceIo};
use txc_common::snapshot::SensorSnapshot;

use crate::controller::{Controller, HaltReason, TickOutcome};
use crate::state::context::ControlContext;

// ─── Cycle Statistics ───────────────────────────────────────────────

/// O(1) per-tick timing statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleStats {
    /// Total ticks executed.
    pub cycle_count: u64,
    /// Last tick duration [ns].
    pub last_cycle_ns: i64,
    /// Minimum tick duration [ns].
    pub min_cycle_ns: i64,
    /// Maximum tick duration [ns].
    pub max_cycle_ns: i64,
    /// Running sum for average computation.
    pub sum_cycle_ns: i64,
    /// Ticks that exceeded the period.
    pub overruns: u64,
    /// Ticks abandoned on a device timeout.
    pub stalls: u64,
    /// Faults latched by the loop.
    pub faults_latched: u64,
}

impl CycleStats {
    /// Create a new zeroed stats instance.
    pub const fn new() -> Self {
        Self {
            cycle_count: 0,
            last_cycle_ns: 0,
            min_cycle_ns: i64::MAX,
            max_cycle_ns: 0,
            sum_cycle_ns: 0,
            overruns: 0,
            stalls: 0,
            faults_latched: 0,
        }
    }

    /// Record a tick duration.
    #[inline]
    pub fn record(&mut self, duration_ns: i64) {
        self.cycle_count += 1;
        self.last_cycle_ns = duration_ns;
        self.min_cycle_ns = self.min_cycle_ns.min(duration_ns);
        self.max_cycle_ns = self.max_cycle_ns.max(duration_ns);
        self.sum_cycle_ns = self.sum_cycle_ns.saturating_add(duration_ns);
    }

    /// Average tick time [ns] (returns 0 if no ticks).
    #[inline]
    pub fn avg_cycle_ns(&self) -> i64 {
        if self.cycle_count == 0 {
            0
        } else {
            self.sum_cycle_ns / self.cycle_count as i64
        }
    }
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Cancellation ───────────────────────────────────────────────────

/// Cloneable stop flag, checked at tick boundaries.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// New, not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the loop to stop after the current tick.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether a stop was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ─── Loop Exit ──────────────────────────────────────────────────────

/// Why `CycleRunner::run` returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// Cancellation token signalled.
    Cancelled,
    /// Configured tick limit reached.
    TickLimit,
    /// Controller halted the loop.
    Halted(HaltReason),
}

/// Result of a loop run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopExit {
    /// Exit cause.
    pub reason: ExitReason,
    /// Ticks executed in this run.
    pub ticks: u64,
}

enum TickResult {
    Done(TickOutcome),
    Stalled(DeviceError),
}

// ─── Cycle Runner ───────────────────────────────────────────────────

/// Loop driver owning the device and the control context.
pub struct CycleRunner<D: DeviceIo> {
    device: D,
    ctx: ControlContext,
    stats: CycleStats,
    tick_limit: Option<u64>,
    report_interval: u64,
}

impl<D: DeviceIo> CycleRunner<D> {
    /// Runner over `device` starting from `ctx`.
    pub fn new(device: D, ctx: ControlContext) -> Self {
        Self {
            device,
            ctx,
            stats: CycleStats::new(),
            tick_limit: None,
            report_interval: DEFAULT_REPORT_INTERVAL,
        }
    }

    /// Stop after `limit` ticks per run.
    #[must_use]
    pub fn with_tick_limit(mut self, limit: Option<u64>) -> Self {
        self.tick_limit = limit;
        self
    }

    /// Ticks between debug statistics reports (0 disables).
    #[must_use]
    pub fn with_report_interval(mut self, interval: u64) -> Self {
        self.report_interval = interval;
        self
    }

    /// Control context (read-only).
    pub fn context(&self) -> &ControlContext {
        &self.ctx
    }

    /// Mutable context, for host requests between runs.
    pub fn context_mut(&mut self) -> &mut ControlContext {
        &mut self.ctx
    }

    /// Timing statistics.
    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    /// The device.
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Mutable device, for scripting inputs between runs.
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Run `controller` every `period` until cancelled, halted, or the tick
    /// limit is reached.
    pub fn run<C: Controller + ?Sized>(
        &mut self,
        controller: &mut C,
        period: Duration,
        stop: &CancellationToken,
    ) -> LoopExit {
        info!(
            "Entering {} loop on '{}' (period={period:?}, channels={})",
            controller.name(),
            self.device.name(),
            controller.sample_set().len()
        );

        let period_ns = duration_ns(period);
        let mut ticks = 0u64;
        let mut last_status = self.ctx.status();

        let reason = loop {
            if stop.is_cancelled() {
                break ExitReason::Cancelled;
            }
            if self.tick_limit.is_some_and(|limit| ticks >= limit) {
                break ExitReason::TickLimit;
            }

            let tick_start = Instant::now();
            let result = self.tick_once(controller, tick_start);
            ticks += 1;

            let elapsed = tick_start.elapsed();
            let elapsed_ns = duration_ns(elapsed);
            self.stats.record(elapsed_ns);

            if self.ctx.status() != last_status {
                info!(
                    "Status: {last_status} -> {} (error_code={})",
                    self.ctx.status(),
                    self.ctx.error_code()
                );
                last_status = self.ctx.status();
            }

            let stall = match result {
                TickResult::Done(TickOutcome::Halt(reason)) => break ExitReason::Halted(reason),
                TickResult::Done(TickOutcome::Continue) => None,
                TickResult::Stalled(e) => {
                    self.stats.stalls += 1;
                    Some(e)
                }
            };

            if elapsed > period {
                self.note_overrun(elapsed_ns, period_ns, stall.as_ref());
            } else {
                if let Some(e) = &stall {
                    debug!("Tick abandoned: {e}");
                }
                thread::sleep(period - elapsed);
            }

            if self.report_interval > 0 && self.stats.cycle_count % self.report_interval == 0 {
                debug!(
                    "Loop: {} ticks, avg={}ns, max={}ns, overruns={}, state={}, position={}",
                    self.stats.cycle_count,
                    self.stats.avg_cycle_ns(),
                    self.stats.max_cycle_ns,
                    self.stats.overruns,
                    self.ctx.current(),
                    self.ctx.position()
                );
            }
        };

        info!(
            "{} loop stopped after {ticks} ticks ({reason:?}, overruns: {}, error_code={})",
            controller.name(),
            self.stats.overruns,
            self.ctx.error_code()
        );
        LoopExit { reason, ticks }
    }

    fn tick_once<C: Controller + ?Sized>(&mut self, controller: &mut C, now: Instant) -> TickResult {
        let set = controller.sample_set();
        let result = SensorSnapshot::capture(&mut self.device, &set, now)
            .and_then(|snapshot| controller.tick(&snapshot, &mut self.ctx, &mut self.device));

        match result {
            Ok(outcome) => TickResult::Done(outcome),
            Err(e) if e.is_stall() => TickResult::Stalled(e),
            Err(e) => {
                if self.ctx.is_faulted() {
                    debug!("Device failure while faulted: {e}");
                } else {
                    error!("Device failure in {} tick: {e}", controller.name());
                    self.stats.faults_latched += 1;
                }
                TickResult::Done(controller.latch_fault(
                    &mut self.ctx,
                    &mut self.device,
                    &e.to_string(),
                    now,
                ))
            }
        }
    }

    fn note_overrun(&mut self, elapsed_ns: i64, period_ns: i64, stall: Option<&DeviceError>) {
        self.stats.overruns += 1;
        let n = self.stats.overruns;
        if n <= 10 || n % 1000 == 0 {
            match stall {
                Some(e) => warn!("Overrun #{n}: tick abandoned ({e})"),
                None => warn!("Overrun #{n}: tick took {elapsed_ns}ns (period {period_ns}ns)"),
            }
        }
    }
}

fn duration_ns(d: Duration) -> i64 {
    i64::try_from(d.as_nanos()).unwrap_or(i64::MAX)
}
