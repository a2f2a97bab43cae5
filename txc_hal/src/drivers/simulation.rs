//! Simulated device.
//!
//! Readings follow a fixed pattern so a run without hardware is
//! reproducible: switch `n` is pressed iff `n % 2 == 0`, sensor `n` is active
//! iff `n % 3 == 0`. Channels listed in the simulation config are forced
//! on; with the pattern disabled every other channel reads `false`.
//! Actuator writes land in a duty array and are logged.

use tracing::{debug, info};
use txc_common::config::SimulationConfig;
use txc_common::consts::MAX_CHANNELS;
use txc_common::device::{ChannelId, DeviceError, DeviceIo};

/// Number of duty slots on the simulated output stage.
pub const DUTY_SLOTS: usize = 8;

/// Simulated device implementing `DeviceIo`.
#[derive(Debug, Clone)]
pub struct SimulatedDevice {
    use_modulo_pattern: bool,
    sensors_on: u64,
    switches_on: u64,
    /// Output stage: `duty[0]`/`duty[1]` are the motor, higher slots digital outputs.
    duty: [i32; DUTY_SLOTS],
    speed: i32,
}

impl SimulatedDevice {
    /// Simulated device using the modulo pattern and no overrides.
    pub fn new() -> Self {
        Self::from_config(&SimulationConfig::default())
    }

    /// Build from the `[simulation]` config section.
    pub fn from_config(config: &SimulationConfig) -> Self {
        let mask = |list: &[ChannelId]| {
            list.iter()
                .filter(|&&ch| (ch as usize) < MAX_CHANNELS)
                .fold(0u64, |acc, &ch| acc | (1u64 << ch))
        };
        Self {
            use_modulo_pattern: config.use_modulo_pattern,
            sensors_on: mask(config.sensors_on.as_slice()),
            switches_on: mask(config.switches_on.as_slice()),
            duty: [0; DUTY_SLOTS],
            speed: 0,
        }
    }

    /// Current duty array.
    pub fn duty(&self) -> &[i32; DUTY_SLOTS] {
        &self.duty
    }

    /// Last speed setpoint.
    pub fn speed(&self) -> i32 {
        self.speed
    }

    fn check(channel: ChannelId) -> Result<(), DeviceError> {
        if channel as usize >= MAX_CHANNELS {
            return Err(DeviceError::InvalidChannel(channel));
        }
        Ok(())
    }
}

impl Default for SimulatedDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceIo for SimulatedDevice {
    fn name(&self) -> &'static str {
        "simulation"
    }

    fn read_sensor(&mut self, channel: ChannelId) -> Result<bool, DeviceError> {
        Self::check(channel)?;
        let forced = self.sensors_on & (1u64 << channel) != 0;
        Ok(forced || (self.use_modulo_pattern && channel % 3 == 0))
    }

    fn read_switch(&mut self, channel: ChannelId) -> Result<bool, DeviceError> {
        Self::check(channel)?;
        let forced = self.switches_on & (1u64 << channel) != 0;
        Ok(forced || (self.use_modulo_pattern && channel % 2 == 0))
    }

    fn set_motor(&mut self, left_duty: i32, right_duty: i32) -> Result<(), DeviceError> {
        self.duty[0] = left_duty;
        self.duty[1] = right_duty;
        match left_duty.signum() {
            0 => info!("Motor turned off"),
            1 => info!("Motor turned right (duty {left_duty})"),
            _ => info!("Motor turned left (duty {left_duty})"),
        }
        Ok(())
    }

    fn set_digital_output(&mut self, channel: ChannelId, value: bool) -> Result<(), DeviceError> {
        let slot = channel as usize;
        if slot >= DUTY_SLOTS {
            return Err(DeviceError::InvalidChannel(channel));
        }
        self.duty[slot] = i32::from(value);
        info!("Output {channel} set to {value}");
        Ok(())
    }

    fn set_speed(&mut self, value: i32) -> Result<(), DeviceError> {
        self.speed = value;
        debug!("Speed set to: {value}");
        Ok(())
    }

    fn output_channels(&self) -> usize {
        DUTY_SLOTS
    }
}
