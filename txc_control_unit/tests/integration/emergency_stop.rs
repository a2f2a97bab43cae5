//! Integration test: plain control loop and emergency interlock.

use std::time::Duration;

use txc_common::config::{ChannelConfig, ChannelList};
use txc_common::consts::{ERR_EMERGENCY_STOP, ERR_NONE};
use txc_common::device::{ChannelId, DeviceError, DeviceIo};
use txc_control_unit::controller::HaltReason;
use txc_control_unit::cycle::{CancellationToken, CycleRunner, ExitReason};
use txc_control_unit::plain::PlainLoop;
use txc_control_unit::state::context::ControlContext;
use txc_hal::{ActuatorCall, FakeDevice, SimulatedDevice};

const PERIOD: Duration = Duration::from_millis(1);

/// Both emergency sensors active; motor writes never answer in time.
struct JammedMotorDevice {
    motor_writes: u32,
}

impl DeviceIo for JammedMotorDevice {
    fn name(&self) -> &'static str {
        "jammed-motor"
    }

    fn read_sensor(&mut self, channel: ChannelId) -> Result<bool, DeviceError> {
        Ok(channel == 1 || channel == 2)
    }

    fn read_switch(&mut self, _channel: ChannelId) -> Result<bool, DeviceError> {
        Ok(true)
    }

    fn set_motor(&mut self, _left: i32, _right: i32) -> Result<(), DeviceError> {
        self.motor_writes += 1;
        Err(DeviceError::Timeout {
            op: "set_motor",
            after: Duration::from_millis(5),
        })
    }

    fn set_digital_output(&mut self, _channel: ChannelId, _value: bool) -> Result<(), DeviceError> {
        Ok(())
    }

    fn set_speed(&mut self, _value: i32) -> Result<(), DeviceError> {
        Ok(())
    }
}

#[test]
fn both_emergency_sensors_halt_within_one_tick() {
    let dev = FakeDevice::new()
        .with_sensor(1, true)
        .with_sensor(2, true)
        .with_switch(3, true);
    let mut runner = CycleRunner::new(dev, ControlContext::default()).with_tick_limit(Some(10));

    let exit = runner.run(&mut PlainLoop::default(), PERIOD, &CancellationToken::new());
    assert_eq!(exit.reason, ExitReason::Halted(HaltReason::EmergencyStop));
    assert_eq!(exit.ticks, 1);
    assert_eq!(runner.context().error_code(), ERR_EMERGENCY_STOP);
    assert_eq!(runner.context().status(), "IDLE");
    assert_eq!(runner.context().position(), 0);
    assert_eq!(
        runner.device().calls(),
        &[ActuatorCall::Motor { left: 0, right: 0 }]
    );
}

#[test]
fn emergency_stop_halts_when_motor_off_times_out() {
    let dev = JammedMotorDevice { motor_writes: 0 };
    let mut runner = CycleRunner::new(dev, ControlContext::default()).with_tick_limit(Some(5));

    let exit = runner.run(&mut PlainLoop::default(), PERIOD, &CancellationToken::new());
    assert_eq!(exit.reason, ExitReason::Halted(HaltReason::EmergencyStop));
    assert_eq!(exit.ticks, 1);
    assert_eq!(runner.context().error_code(), ERR_EMERGENCY_STOP);
    assert_eq!(runner.device().motor_writes, 1);
    assert_eq!(runner.stats().stalls, 0);
}

#[test]
fn single_emergency_sensor_does_not_trip() {
    let dev = FakeDevice::new().with_sensor(1, true).with_switch(3, true);
    let mut runner = CycleRunner::new(dev, ControlContext::default()).with_tick_limit(Some(3));

    let exit = runner.run(&mut PlainLoop::default(), PERIOD, &CancellationToken::new());
    assert_eq!(exit.reason, ExitReason::TickLimit);
    assert_eq!(runner.context().error_code(), ERR_NONE);
    assert_eq!(runner.context().position(), 3);
    assert_eq!(runner.device().motor(), (512, 0));
}

#[test]
fn interlock_trips_mid_run() {
    let mut runner = CycleRunner::new(FakeDevice::new().with_switch(3, true), ControlContext::default())
        .with_tick_limit(Some(2));
    let stop = CancellationToken::new();
    let mut plain = PlainLoop::default();

    runner.run(&mut plain, PERIOD, &stop);
    assert_eq!(runner.context().position(), 2);

    runner.device_mut().set_sensor(1, true);
    runner.device_mut().set_sensor(2, true);
    let exit = runner.run(&mut plain, PERIOD, &stop);
    assert_eq!(exit.reason, ExitReason::Halted(HaltReason::EmergencyStop));
    assert_eq!(runner.context().position(), 2);
    assert!(runner.device().motor_is_off());
}

#[test]
fn configured_interlock_channels_are_used() {
    let channels = ChannelConfig {
        estop_sensors: ChannelList::from_slice(&[4, 5, 6]).unwrap(),
        ..ChannelConfig::default()
    };
    let dev = FakeDevice::new()
        .with_sensor(1, true)
        .with_sensor(2, true)
        .with_sensor(4, true)
        .with_sensor(5, true);
    let mut runner = CycleRunner::new(dev, ControlContext::default()).with_tick_limit(Some(2));
    let mut plain = PlainLoop::new(&channels);

    let exit = runner.run(&mut plain, PERIOD, &CancellationToken::new());
    assert_eq!(exit.reason, ExitReason::TickLimit);

    runner.device_mut().set_sensor(6, true);
    let exit = runner.run(&mut plain, PERIOD, &CancellationToken::new());
    assert_eq!(exit.reason, ExitReason::Halted(HaltReason::EmergencyStop));
}

#[test]
fn simulated_pattern_never_trips_default_interlock() {
    // Pattern: sensor n active iff n % 3 == 0, so sensors 1 and 2 stay low.
    let mut runner =
        CycleRunner::new(SimulatedDevice::new(), ControlContext::default()).with_tick_limit(Some(3));
    let exit = runner.run(&mut PlainLoop::default(), PERIOD, &CancellationToken::new());
    assert_eq!(exit.reason, ExitReason::TickLimit);
    assert_eq!(runner.context().position(), 3);
    assert_eq!(runner.device().duty()[0], 0);
}
