//! # TXC Control Unit
//!
//! Runs one control loop against one device until it halts, reaches its
//! tick limit, or receives Ctrl-C.
//!
//! Exit codes: 0 on normal termination, 1 on startup failure, 2 when a
//! panic escapes the loop.

use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;
use txc_common::config::{ControllerConfig, LogLevel};
use txc_common::consts::{EXIT_INTERNAL_FAULT, EXIT_OK, EXIT_STARTUP_FAILURE, MAX_CHANNELS};
use txc_common::device::{ChannelId, DeviceIo};
use txc_control_unit::cycle::{CancellationToken, CycleRunner, LoopExit};
use txc_control_unit::error::ControlError;
use txc_control_unit::plain::PlainLoop;
use txc_control_unit::state::context::ControlContext;
use txc_control_unit::state::engine::Engine;
use txc_control_unit::station::WorkpieceStation;
use txc_hal::{DeviceRegistry, TimeoutDevice};

/// Control loop to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Five-state operating-mode machine.
    Fsm,
    /// Run-switch motor control with emergency interlock.
    Plain,
    /// Single workpiece travel/inspect/sort sequence.
    Workpiece,
}

/// TXC Control Unit - cyclic control-loop executive
#[derive(Parser, Debug)]
#[command(name = "txc_control_unit")]
#[command(version)]
#[command(about = "Cyclic control loop with FSM engine and emergency interlock")]
struct Args {
    /// Path to the TOML configuration (defaults apply when omitted).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Control loop to run.
    #[arg(long, value_enum, default_value_t = Mode::Fsm)]
    mode: Mode,

    /// Workpiece id for `--mode workpiece` (also its inspection sensor).
    #[arg(long, default_value_t = 1)]
    workpiece_id: ChannelId,

    /// Stop after this many ticks.
    #[arg(long)]
    max_ticks: Option<u64>,

    /// Override `[cycle] period_ms`.
    #[arg(long)]
    period_ms: Option<u64>,

    /// Registered device to drive.
    #[arg(long, default_value = "simulation")]
    device: String,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            // Subscriber not up yet.
            eprintln!("FATAL: {e}");
            process::exit(EXIT_STARTUP_FAILURE);
        }
    };
    setup_tracing(&args, config.shared.log_level);

    info!(
        "TXC Control Unit v{} starting ({})",
        env!("CARGO_PKG_VERSION"),
        config.shared.service_name
    );

    let code = match panic::catch_unwind(AssertUnwindSafe(|| run(&args, &config))) {
        Ok(Ok(exit)) => {
            info!("Loop exited: {:?} after {} ticks", exit.reason, exit.ticks);
            EXIT_OK
        }
        Ok(Err(e)) => {
            error!("FATAL: {e}");
            EXIT_STARTUP_FAILURE
        }
        Err(_) => {
            error!("Internal fault: control loop panicked");
            EXIT_INTERNAL_FAULT
        }
    };

    info!("TXC Control Unit shutdown complete");
    process::exit(code);
}

fn load_config(args: &Args) -> Result<ControllerConfig, ControlError> {
    let mut config = match &args.config {
        Some(path) => ControllerConfig::load_validated(path)?,
        None => ControllerConfig::default(),
    };
    if let Some(period_ms) = args.period_ms {
        config.cycle.period_ms = period_ms;
        config.validate()?;
    }
    if args.mode == Mode::Workpiece && args.workpiece_id as usize >= MAX_CHANNELS {
        return Err(ControlError::InvalidArgument(format!(
            "--workpiece-id {} out of range 0..{MAX_CHANNELS}",
            args.workpiece_id
        )));
    }
    Ok(config)
}

fn run(args: &Args, config: &ControllerConfig) -> Result<LoopExit, ControlError> {
    let registry = DeviceRegistry::with_builtin();
    let mut device: Box<dyn DeviceIo + Send> = registry.create(&args.device, config)?;
    info!("Device '{}' created", device.name());

    if let Some(budget) = config.cycle.device_timeout() {
        device = Box::new(TimeoutDevice::spawn(device, budget)?);
        info!("Stall guard enabled ({budget:?} per device call)");
    }

    let stop = CancellationToken::new();
    let handler_token = stop.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        handler_token.cancel();
    })?;

    let ctx = ControlContext::new(config.engine.idle_speed);
    let mut runner = CycleRunner::new(device, ctx)
        .with_tick_limit(args.max_ticks)
        .with_report_interval(config.cycle.report_interval);
    let period = config.cycle.period();

    let exit = match args.mode {
        Mode::Fsm => {
            let mut engine = Engine::new(&config.engine, &config.channels);
            runner.run(&mut engine, period, &stop)
        }
        Mode::Plain => {
            let mut plain = PlainLoop::new(&config.channels);
            runner.run(&mut plain, period, &stop)
        }
        Mode::Workpiece => {
            let mut station = WorkpieceStation::new(args.workpiece_id, &config.station);
            station.check_outputs(runner.device())?;
            runner.run(&mut station, period, &stop)
        }
    };

    let stats = runner.stats();
    info!(
        "Final: state={}, status={}, error_code={}, position={}, ticks={}, avg={}ns, max={}ns, overruns={}, stalls={}",
        runner.context().current(),
        runner.context().status(),
        runner.context().error_code(),
        runner.context().position(),
        stats.cycle_count,
        stats.avg_cycle_ns(),
        stats.max_cycle_ns,
        stats.overruns,
        stats.stalls
    );
    Ok(exit)
}

/// Setup tracing subscriber based on CLI arguments and configuration.
fn setup_tracing(args: &Args, configured: LogLevel) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        match configured {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
