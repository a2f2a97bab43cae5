//! Integration test: FSM engine scenarios.
//!
//! Drives `Engine::evaluate` directly with hand-built snapshots so the
//! dwell can be exercised without waiting in real time.

use std::time::{Duration, Instant};

use txc_common::config::{ChannelConfig, EngineConfig};
use txc_common::consts::{ERR_NONE, ERR_TRANSIENT};
use txc_common::snapshot::SensorSnapshot;
use txc_common::state::State;
use txc_control_unit::state::context::{ControlContext, TransitionResult};
use txc_control_unit::state::engine::{Engine, latch_fault};
use txc_hal::{ActuatorCall, FakeDevice};

// ── Helpers ─────────────────────────────────────────────────────────

fn setup() -> (Engine, ControlContext, FakeDevice) {
    (Engine::default(), ControlContext::default(), FakeDevice::new())
}

fn at(t0: Instant, ms: u64) -> SensorSnapshot {
    SensorSnapshot::at(t0 + Duration::from_millis(ms))
}

// ── Tests ───────────────────────────────────────────────────────────

#[test]
fn start_switch_runs_motor_on_next_evaluate() {
    let (engine, mut ctx, mut dev) = setup();
    let t0 = Instant::now();

    engine.evaluate(&at(t0, 0).with_switch(1, true), &mut ctx, &mut dev).unwrap();
    assert_eq!(ctx.current(), State::Idle);
    assert_eq!(ctx.target(), State::Running);

    engine.evaluate(&at(t0, 100), &mut ctx, &mut dev).unwrap();
    assert_eq!(ctx.current(), State::Running);
    assert_eq!(ctx.status(), "RUNNING");
    assert_eq!(dev.motor(), (512, 0));
}

#[test]
fn each_requested_state_fires_one_entry() {
    for target in [State::Running, State::Stopped, State::Error] {
        let (engine, mut ctx, mut dev) = setup();
        assert_eq!(ctx.request_transition(target), TransitionResult::Ok(target));

        let snap = SensorSnapshot::at(Instant::now());
        engine.evaluate(&snap, &mut ctx, &mut dev).unwrap();
        assert_eq!(ctx.current(), target);
        assert_eq!(ctx.status(), target.label());
        assert_eq!(dev.calls().len(), 1, "{target}");
        assert_eq!(ctx.transitions(), 1);

        // Same snapshot again: do activity only.
        engine.evaluate(&snap, &mut ctx, &mut dev).unwrap();
        assert_eq!(dev.calls().len(), 1, "{target}");
        assert_eq!(ctx.transitions(), 1);
    }
}

#[test]
fn stop_switch_wins_over_error_sensor() {
    let (engine, mut ctx, mut dev) = setup();
    let t0 = Instant::now();
    ctx.request_transition(State::Running);
    engine.evaluate(&at(t0, 0), &mut ctx, &mut dev).unwrap();

    let both = at(t0, 100).with_switch(2, true).with_sensor(1, true);
    engine.evaluate(&both, &mut ctx, &mut dev).unwrap();
    assert_eq!(ctx.target(), State::Stopped);

    engine.evaluate(&at(t0, 200), &mut ctx, &mut dev).unwrap();
    assert_eq!(ctx.current(), State::Stopped);
    assert!(dev.motor_is_off());
}

#[test]
fn error_holds_for_dwell_then_returns_idle() {
    let (engine, mut ctx, mut dev) = setup();
    let t0 = Instant::now();
    ctx.request_transition(State::Running);
    engine.evaluate(&at(t0, 0), &mut ctx, &mut dev).unwrap();

    engine.evaluate(&at(t0, 100).with_sensor(1, true), &mut ctx, &mut dev).unwrap();
    engine.evaluate(&at(t0, 200), &mut ctx, &mut dev).unwrap();
    assert_eq!(ctx.current(), State::Error);
    assert_eq!(ctx.error_code(), ERR_TRANSIENT);
    assert_eq!(ctx.status(), "ERROR");

    // Entered Error at t0+200; dwell is 1 s.
    for ms in [300, 700, 1100] {
        engine.evaluate(&at(t0, ms), &mut ctx, &mut dev).unwrap();
        assert_eq!(ctx.current(), State::Error);
        assert_eq!(ctx.target(), State::Error);
    }

    engine.evaluate(&at(t0, 1200), &mut ctx, &mut dev).unwrap();
    assert_eq!(ctx.target(), State::Idle);
    engine.evaluate(&at(t0, 1300), &mut ctx, &mut dev).unwrap();
    assert_eq!(ctx.current(), State::Idle);
    assert_eq!(ctx.status(), "IDLE");
    assert_eq!(ctx.error_code(), ERR_NONE);
    assert_eq!(dev.calls().last(), Some(&ActuatorCall::Speed(512)));
}

#[test]
fn full_cycle_idle_running_stopped_idle() {
    let (engine, mut ctx, mut dev) = setup();
    let t0 = Instant::now();
    let script = [
        (at(t0, 0).with_switch(1, true), State::Idle),
        (at(t0, 100), State::Running),
        (at(t0, 200).with_switch(2, true), State::Running),
        (at(t0, 300), State::Stopped),
        (at(t0, 400).with_switch(1, true), State::Stopped),
        (at(t0, 500), State::Idle),
    ];
    for (snap, expected) in script {
        engine.evaluate(&snap, &mut ctx, &mut dev).unwrap();
        assert_eq!(ctx.current(), expected);
    }
    assert_eq!(ctx.transitions(), 3);
}

#[test]
fn remapped_channels_drive_guards() {
    let channels = ChannelConfig {
        start_switch: 6,
        stop_switch: 7,
        error_sensor: 5,
        ..ChannelConfig::default()
    };
    let engine = Engine::new(&EngineConfig::default(), &channels);
    let mut ctx = ControlContext::default();
    let mut dev = FakeDevice::new();
    let t0 = Instant::now();

    engine.evaluate(&at(t0, 0).with_switch(1, true), &mut ctx, &mut dev).unwrap();
    assert_eq!(ctx.target(), State::Idle);
    engine.evaluate(&at(t0, 100).with_switch(6, true), &mut ctx, &mut dev).unwrap();
    assert_eq!(ctx.target(), State::Running);
}

#[test]
fn latched_fault_is_absorbing() {
    let (engine, mut ctx, mut dev) = setup();
    let t0 = Instant::now();
    latch_fault(&mut ctx, &mut dev, "driver reported overcurrent", t0);
    assert_eq!(ctx.current(), State::Fault);
    assert_eq!(ctx.status(), "FAULT");
    assert!(matches!(
        ctx.request_transition(State::Idle),
        TransitionResult::Rejected(_)
    ));

    dev.clear_calls();
    let all = at(t0, 5000)
        .with_switch(1, true)
        .with_switch(2, true)
        .with_sensor(1, true);
    for _ in 0..3 {
        engine.evaluate(&all, &mut ctx, &mut dev).unwrap();
    }
    assert_eq!(ctx.current(), State::Fault);
    assert!(dev.calls().is_empty());
}
