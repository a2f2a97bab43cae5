//! Integration test: controllers built from a TOML configuration file.

use std::fs;
use std::time::{Duration, Instant};

use tempfile::TempDir;
use txc_common::config::{ConfigError, ControllerConfig, DwellPolicy};
use txc_common::snapshot::SensorSnapshot;
use txc_common::state::State;
use txc_control_unit::controller::Controller;
use txc_control_unit::plain::PlainLoop;
use txc_control_unit::state::context::ControlContext;
use txc_control_unit::state::engine::Engine;
use txc_control_unit::station::WorkpieceStation;
use txc_hal::FakeDevice;

const CONVEYOR_TOML: &str = r#"
[shared]
service_name = "txc-conveyor-02"

[cycle]
period_ms = 20

[engine]
idle_speed = 300
error_dwell_ms = 250

[channels]
start_switch = 4
stop_switch = 5
error_sensor = 6
run_switch = 7
estop_sensors = [8, 9]

[station]
travel_ms = 500
accept_output = 3
reject_output = 4
"#;

fn write_config(content: &str) -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("txc.toml");
    fs::write(&path, content).unwrap();
    (dir, path)
}

#[test]
fn controllers_follow_configured_channels() {
    let (_dir, path) = write_config(CONVEYOR_TOML);
    let config = ControllerConfig::load_validated(&path).unwrap();
    assert_eq!(config.cycle.period(), Duration::from_millis(20));
    assert_eq!(config.engine.dwell_policy, DwellPolicy::Elapsed);

    let engine = Engine::new(&config.engine, &config.channels);
    let set = engine.sample_set();
    assert!(set.has_switch(4) && set.has_switch(5) && set.has_sensor(6));

    let plain = PlainLoop::new(&config.channels);
    let set = plain.sample_set();
    assert!(set.has_sensor(8) && set.has_sensor(9) && set.has_switch(7));

    let station = WorkpieceStation::new(2, &config.station);
    assert!(station.sample_set().has_sensor(2));
}

#[test]
fn configured_idle_speed_and_dwell_apply() {
    let (_dir, path) = write_config(CONVEYOR_TOML);
    let config = ControllerConfig::load_validated(&path).unwrap();
    let engine = Engine::new(&config.engine, &config.channels);
    let mut ctx = ControlContext::new(config.engine.idle_speed);
    let mut dev = FakeDevice::new();
    let t0 = Instant::now();
    let at = |ms: u64| SensorSnapshot::at(t0 + Duration::from_millis(ms));

    engine.evaluate(&at(0).with_switch(4, true), &mut ctx, &mut dev).unwrap();
    engine.evaluate(&at(20), &mut ctx, &mut dev).unwrap();
    assert_eq!(dev.motor(), (300, 0));

    engine.evaluate(&at(40).with_sensor(6, true), &mut ctx, &mut dev).unwrap();
    engine.evaluate(&at(60), &mut ctx, &mut dev).unwrap();
    assert_eq!(ctx.current(), State::Error);

    engine.evaluate(&at(310), &mut ctx, &mut dev).unwrap();
    assert_eq!(ctx.target(), State::Idle);
}

#[test]
fn blocking_dwell_policy_parses() {
    let (_dir, path) = write_config("[engine]\ndwell_policy = \"blocking\"\n");
    let config = ControllerConfig::load_validated(&path).unwrap();
    let engine = Engine::new(&config.engine, &config.channels);
    assert_eq!(engine.dwell_policy(), DwellPolicy::Blocking);
}

#[test]
fn zero_period_is_rejected() {
    let (_dir, path) = write_config("[cycle]\nperiod_ms = 0\n");
    let err = ControllerConfig::load_validated(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ValidationError(msg) if msg.contains("period_ms")));
}
