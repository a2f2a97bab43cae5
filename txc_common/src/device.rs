//! Device-abstraction trait and error types.
//!
//! This module defines:
//! - `DeviceIo` trait - the narrow interface the engine drives hardware through
//! - `DeviceError` enum - error types for collaborator calls
//! - `ChannelId` - logical channel identifier

use std::time::Duration;
use thiserror::Error;

use crate::consts::MAX_CHANNELS;

/// Logical channel identifier (`0..MAX_CHANNELS`).
pub type ChannelId = u8;

/// Error types for device operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    /// Device is not reachable at all.
    #[error("Device unavailable: {0}")]
    Unavailable(String),

    /// Channel id outside the device's range.
    #[error("Invalid channel: {0}")]
    InvalidChannel(ChannelId),

    /// Hardware communication error.
    #[error("Communication error: {0}")]
    Communication(String),

    /// Call did not complete within the stall budget.
    #[error("{op} timed out after {after:?}")]
    Timeout {
        /// Operation that stalled.
        op: &'static str,
        /// Budget that was exceeded.
        after: Duration,
    },
}

impl DeviceError {
    /// Whether the error is a stall rather than a device failure.
    ///
    /// Stalls are scheduling overruns; everything else latches a fault.
    #[inline]
    pub const fn is_stall(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Interface to the sensors and actuators of one device.
///
/// Implementations are expected to be non-blocking. Drivers that can block
/// are wrapped in a stall guard by the host.
///
/// # Contract
///
/// | Operation | Side effect |
/// |-----------|-------------|
/// | `read_sensor` / `read_switch` | None |
/// | `set_motor` | Sets left/right duty |
/// | `set_digital_output` | Sets one binary output |
/// | `set_speed` | Updates the setpoint consulted by actuator calls |
pub trait DeviceIo {
    /// Returns the device's identifier (e.g., "simulation", "fake").
    fn name(&self) -> &'static str;

    /// Read a boolean sensor channel.
    fn read_sensor(&mut self, channel: ChannelId) -> Result<bool, DeviceError>;

    /// Read an operator switch channel.
    fn read_switch(&mut self, channel: ChannelId) -> Result<bool, DeviceError>;

    /// Set motor duty (signed; negative is reverse).
    fn set_motor(&mut self, left_duty: i32, right_duty: i32) -> Result<(), DeviceError>;

    /// Set a binary output.
    fn set_digital_output(&mut self, channel: ChannelId, value: bool) -> Result<(), DeviceError>;

    /// Update the speed setpoint.
    fn set_speed(&mut self, value: i32) -> Result<(), DeviceError>;

    /// Number of digital output channels (`0..n` are writable).
    fn output_channels(&self) -> usize {
        MAX_CHANNELS
    }
}

impl<D: DeviceIo + ?Sized> DeviceIo for Box<D> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn read_sensor(&mut self, channel: ChannelId) -> Result<bool, DeviceError> {
        (**self).read_sensor(channel)
    }

    fn read_switch(&mut self, channel: ChannelId) -> Result<bool, DeviceError> {
        (**self).read_switch(channel)
    }

    fn set_motor(&mut self, left_duty: i32, right_duty: i32) -> Result<(), DeviceError> {
        (**self).set_motor(left_duty, right_duty)
    }

    fn set_digital_output(&mut self, channel: ChannelId, value: bool) -> Result<(), DeviceError> {
        (**self).set_digital_output(channel, value)
    }

    fn set_speed(&mut self, value: i32) -> Result<(), DeviceError> {
        (**self).set_speed(value)
    }

    fn output_channels(&self) -> usize {
        (**self).output_channels()
    }
}
