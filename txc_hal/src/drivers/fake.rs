//! Deterministic test double.
//!
//! `FakeDevice` serves scripted sensor/switch levels, records every
//! actuator call in order, and can be told to fail so hosts can exercise
//! their fault paths.

use txc_common::consts::MAX_CHANNELS;
use txc_common::device::{ChannelId, DeviceError, DeviceIo};

/// One recorded actuator call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorCall {
    /// `set_motor(left, right)`.
    Motor {
        /// Left duty.
        left: i32,
        /// Right duty.
        right: i32,
    },
    /// `set_digital_output(channel, value)`.
    DigitalOutput {
        /// Output channel.
        channel: ChannelId,
        /// Level written.
        value: bool,
    },
    /// `set_speed(value)`.
    Speed(i32),
}

/// Scriptable device that records actuator calls.
#[derive(Debug, Clone, Default)]
pub struct FakeDevice {
    sensors: u64,
    switches: u64,
    calls: Vec<ActuatorCall>,
    reads: u64,
    failure: Option<DeviceError>,
    motor: (i32, i32),
    outputs: u64,
    speed: i32,
}

impl FakeDevice {
    /// Device with every input low and no recorded calls.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: sensor level.
    #[must_use]
    pub fn with_sensor(mut self, channel: ChannelId, value: bool) -> Self {
        self.set_sensor(channel, value);
        self
    }

    /// Builder: switch level.
    #[must_use]
    pub fn with_switch(mut self, channel: ChannelId, value: bool) -> Self {
        self.set_switch(channel, value);
        self
    }

    /// Set a sensor level.
    pub fn set_sensor(&mut self, channel: ChannelId, value: bool) {
        set_bit(&mut self.sensors, channel, value);
    }

    /// Set a switch level.
    pub fn set_switch(&mut self, channel: ChannelId, value: bool) {
        set_bit(&mut self.switches, channel, value);
    }

    /// Make every subsequent call fail with `err`.
    pub fn fail_with(&mut self, err: DeviceError) {
        self.failure = Some(err);
    }

    /// Stop failing.
    pub fn heal(&mut self) {
        self.failure = None;
    }

    /// Actuator calls in the order they were made.
    pub fn calls(&self) -> &[ActuatorCall] {
        &self.calls
    }

    /// Forget recorded calls.
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Number of sensor/switch reads served.
    pub fn reads(&self) -> u64 {
        self.reads
    }

    /// Last motor duty `(left, right)`.
    pub fn motor(&self) -> (i32, i32) {
        self.motor
    }

    /// Whether the motor is currently commanded off.
    pub fn motor_is_off(&self) -> bool {
        self.motor == (0, 0)
    }

    /// Last level written to a digital output.
    pub fn output(&self, channel: ChannelId) -> bool {
        get_bit(self.outputs, channel)
    }

    /// Last speed setpoint.
    pub fn speed(&self) -> i32 {
        self.speed
    }

    fn check(&self, channel: ChannelId) -> Result<(), DeviceError> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        if channel as usize >= MAX_CHANNELS {
            return Err(DeviceError::InvalidChannel(channel));
        }
        Ok(())
    }
}

fn set_bit(bank: &mut u64, channel: ChannelId, value: bool) {
    if (channel as usize) < MAX_CHANNELS {
        if value {
            *bank |= 1u64 << channel;
        } else {
            *bank &= !(1u64 << channel);
        }
    }
}

fn get_bit(bank: u64, channel: ChannelId) -> bool {
    (channel as usize) < MAX_CHANNELS && bank & (1u64 << channel) != 0
}

impl DeviceIo for FakeDevice {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn read_sensor(&mut self, channel: ChannelId) -> Result<bool, DeviceError> {
        self.check(channel)?;
        self.reads += 1;
        Ok(get_bit(self.sensors, channel))
    }

    fn read_switch(&mut self, channel: ChannelId) -> Result<bool, DeviceError> {
        self.check(channel)?;
        self.reads += 1;
        Ok(get_bit(self.switches, channel))
    }

    fn set_motor(&mut self, left_duty: i32, right_duty: i32) -> Result<(), DeviceError> {
        self.check(0)?;
        self.motor = (left_duty, right_duty);
        self.calls.push(ActuatorCall::Motor {
            left: left_duty,
            right: right_duty,
        });
        Ok(())
    }

    fn set_digital_output(&mut self, channel: ChannelId, value: bool) -> Result<(), DeviceError> {
        self.check(channel)?;
        set_bit(&mut self.outputs, channel, value);
        self.calls.push(ActuatorCall::DigitalOutput { channel, value });
        Ok(())
    }

    fn set_speed(&mut self, value: i32) -> Result<(), DeviceError> {
        self.check(0)?;
        self.speed = value;
        self.calls.push(ActuatorCall::Speed(value));
        Ok(())
    }
}
