//! Control unit error type.
//!
//! Startup failures surface as `ControlError` and map to exit code 1.
//! Failures inside a running loop never reach this type: the loop driver
//! turns them into a latched fault.

use thiserror::Error;
use txc_common::config::ConfigError;
use txc_common::device::DeviceError;
use txc_hal::RegistryError;

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum ControlError {
    /// Configuration could not be loaded or validated.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Device could not be created or wrapped.
    #[error(transparent)]
    Device(#[from] DeviceError),

    /// Requested device is not registered.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Signal handler installation failed.
    #[error("Signal handler setup failed: {0}")]
    Signal(String),

    /// Command-line argument rejected after parsing.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl From<ctrlc::Error> for ControlError {
    fn from(e: ctrlc::Error) -> Self {
        Self::Signal(e.to_string())
    }
}
