//! Integration test: workpiece station sequence through the loop driver.

use std::time::{Duration, Instant};

use txc_common::config::StationConfig;
use txc_control_unit::controller::HaltReason;
use txc_control_unit::cycle::{CancellationToken, CycleRunner, ExitReason};
use txc_control_unit::state::context::ControlContext;
use txc_control_unit::station::{StationPhase, WorkpieceOutcome, WorkpieceStation};
use txc_hal::{ActuatorCall, FakeDevice, SimulatedDevice};

const PERIOD: Duration = Duration::from_millis(5);

fn short_station() -> StationConfig {
    StationConfig {
        travel_ms: 20,
        ..StationConfig::default()
    }
}

#[test]
fn accepted_workpiece_travels_then_sorts() {
    let dev = FakeDevice::new().with_sensor(3, true);
    let mut runner = CycleRunner::new(dev, ControlContext::default()).with_tick_limit(Some(100));
    let mut station = WorkpieceStation::new(3, &short_station());

    let start = Instant::now();
    let exit = runner.run(&mut station, PERIOD, &CancellationToken::new());

    assert_eq!(
        exit.reason,
        ExitReason::Halted(HaltReason::SequenceComplete(WorkpieceOutcome::Accepted))
    );
    assert!(start.elapsed() >= Duration::from_millis(20));
    assert_eq!(station.phase(), StationPhase::Complete(WorkpieceOutcome::Accepted));

    let calls = runner.device().calls();
    assert_eq!(calls.first(), Some(&ActuatorCall::Motor { left: 512, right: 0 }));
    assert_eq!(
        &calls[calls.len() - 2..],
        &[
            ActuatorCall::Motor { left: 0, right: 0 },
            ActuatorCall::DigitalOutput {
                channel: 1,
                value: true
            },
        ]
    );
    assert_eq!(runner.context().position(), 0);
}

#[test]
fn rejected_workpiece_raises_reject_output() {
    let mut runner = CycleRunner::new(FakeDevice::new(), ControlContext::default())
        .with_tick_limit(Some(100));
    let mut station = WorkpieceStation::new(4, &short_station());

    let exit = runner.run(&mut station, PERIOD, &CancellationToken::new());
    assert_eq!(
        exit.reason,
        ExitReason::Halted(HaltReason::SequenceComplete(WorkpieceOutcome::Rejected))
    );
    assert!(runner.device().output(2));
    assert!(!runner.device().output(1));
}

#[test]
fn simulated_device_sorts_by_modulo_pattern() {
    for (id, expected) in [(3, WorkpieceOutcome::Accepted), (4, WorkpieceOutcome::Rejected)] {
        let mut runner = CycleRunner::new(SimulatedDevice::new(), ControlContext::default())
            .with_tick_limit(Some(100));
        let mut station = WorkpieceStation::new(id, &short_station());
        let exit = runner.run(&mut station, PERIOD, &CancellationToken::new());
        assert_eq!(
            exit.reason,
            ExitReason::Halted(HaltReason::SequenceComplete(expected))
        );
    }
}

#[test]
fn tick_limit_interrupts_long_travel() {
    let mut runner =
        CycleRunner::new(FakeDevice::new(), ControlContext::default()).with_tick_limit(Some(2));
    let mut station = WorkpieceStation::new(1, &StationConfig::default());

    let exit = runner.run(&mut station, PERIOD, &CancellationToken::new());
    assert_eq!(exit.reason, ExitReason::TickLimit);
    assert!(matches!(station.phase(), StationPhase::Travelling(_)));
    assert_eq!(runner.device().motor(), (512, 0));
}
