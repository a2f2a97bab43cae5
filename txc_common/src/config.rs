//! Configuration loading traits and types.
//!
//! This module provides a standardized way to load the TOML configuration
//! of the control executive.
//!
//! # Usage
//!
//! ```rust,no_run
//! use txc_common::config::{ConfigError, ControllerConfig};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = ControllerConfig::load_validated(Path::new("txc.toml"))?;
//!     println!("Service: {}", config.shared.service_name);
//!     Ok(())
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::consts::{
    DEFAULT_ERROR_DWELL_MS, DEFAULT_IDLE_SPEED, DEFAULT_PERIOD_MS, DEFAULT_REPORT_INTERVAL,
    DEFAULT_TRAVEL_MS, MAX_CHANNELS, MAX_LISTED_CHANNELS,
};
use crate::device::ChannelId;

/// Fixed-capacity list of channel ids.
pub type ChannelList = heapless::Vec<ChannelId, MAX_LISTED_CHANNELS>;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// File could not be read.
    #[error("Failed to read configuration: {0}")]
    IoError(String),

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed tracing information.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

/// Common fields shared by every TXC process.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "txc-conveyor-01"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SharedConfig {
    /// Logging verbosity level.
    pub log_level: LogLevel,

    /// Application instance identifier.
    pub service_name: String,
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            service_name: "txc-control".to_string(),
        }
    }
}

/// Loop driver timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleConfig {
    /// Control period [ms].
    pub period_ms: u64,
    /// Ticks between periodic statistics reports (0 disables).
    pub report_interval: u64,
    /// Budget for a single device call [ms]; 0 disables the stall guard.
    pub device_timeout_ms: u64,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            period_ms: DEFAULT_PERIOD_MS,
            report_interval: DEFAULT_REPORT_INTERVAL,
            device_timeout_ms: 0,
        }
    }
}

impl CycleConfig {
    /// Control period.
    pub const fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    /// Stall budget, if the guard is enabled.
    pub const fn device_timeout(&self) -> Option<Duration> {
        if self.device_timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.device_timeout_ms))
        }
    }
}

/// How the Error-state dwell is realised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DwellPolicy {
    /// Elapsed-time guard over the snapshot timestamp; the tick never blocks.
    #[default]
    Elapsed,
    /// Synchronous wait inside the Error do-activity; stalls the schedule.
    Blocking,
}

/// State machine engine parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Speed setpoint applied on entering Idle.
    pub idle_speed: i32,
    /// Minimum time in Error before returning to Idle [ms].
    pub error_dwell_ms: u64,
    /// Dwell realisation.
    pub dwell_policy: DwellPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            idle_speed: DEFAULT_IDLE_SPEED,
            error_dwell_ms: DEFAULT_ERROR_DWELL_MS,
            dwell_policy: DwellPolicy::Elapsed,
        }
    }
}

impl EngineConfig {
    /// Error-state dwell.
    pub const fn error_dwell(&self) -> Duration {
        Duration::from_millis(self.error_dwell_ms)
    }
}

/// Logical channel assignment for guards and the interlock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Idle → Running, Stopped → Idle.
    pub start_switch: ChannelId,
    /// Running → Stopped.
    pub stop_switch: ChannelId,
    /// Running → Error.
    pub error_sensor: ChannelId,
    /// Plain loop: motor forward while pressed.
    pub run_switch: ChannelId,
    /// Plain loop: all active at once trips the emergency interlock.
    pub estop_sensors: ChannelList,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            start_switch: 1,
            stop_switch: 2,
            error_sensor: 1,
            run_switch: 3,
            estop_sensors: ChannelList::from_slice(&[1, 2]).unwrap_or_default(),
        }
    }
}

/// Workpiece station sequence parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    /// Conveyor travel time before inspection [ms].
    pub travel_ms: u64,
    /// Output raised for an accepted workpiece.
    pub accept_output: ChannelId,
    /// Output raised for a rejected workpiece.
    pub reject_output: ChannelId,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            travel_ms: DEFAULT_TRAVEL_MS,
            accept_output: 1,
            reject_output: 2,
        }
    }
}

impl StationConfig {
    /// Conveyor travel time.
    pub const fn travel(&self) -> Duration {
        Duration::from_millis(self.travel_ms)
    }
}

/// Simulated device readings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Use the `n % 3` / `n % 2` reading pattern for channels not listed below.
    pub use_modulo_pattern: bool,
    /// Sensors forced active.
    pub sensors_on: ChannelList,
    /// Switches forced pressed.
    pub switches_on: ChannelList,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            use_modulo_pattern: true,
            sensors_on: ChannelList::new(),
            switches_on: ChannelList::new(),
        }
    }
}

/// Complete controller configuration (one TOML file).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub shared: SharedConfig,
    pub cycle: CycleConfig,
    pub engine: EngineConfig,
    pub channels: ChannelConfig,
    pub station: StationConfig,
    pub simulation: SimulationConfig,
}

impl ControllerConfig {
    /// Load and validate a configuration file.
    pub fn load_validated(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::load(path)?;
        config.validate()?;
        debug!(
            "Loaded configuration '{}' from {}",
            config.shared.service_name,
            path.display()
        );
        Ok(config)
    }

    /// Parse and validate a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if:
    /// - `service_name` is empty
    /// - `period_ms` is zero
    /// - `estop_sensors` is empty
    /// - any channel id is outside `0..MAX_CHANNELS`
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shared.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        if self.cycle.period_ms == 0 {
            return Err(ConfigError::ValidationError(
                "cycle.period_ms must be > 0".to_string(),
            ));
        }
        if self.channels.estop_sensors.is_empty() {
            return Err(ConfigError::ValidationError(
                "channels.estop_sensors cannot be empty".to_string(),
            ));
        }

        let c = &self.channels;
        let s = &self.station;
        let singles = [
            ("channels.start_switch", c.start_switch),
            ("channels.stop_switch", c.stop_switch),
            ("channels.error_sensor", c.error_sensor),
            ("channels.run_switch", c.run_switch),
            ("station.accept_output", s.accept_output),
            ("station.reject_output", s.reject_output),
        ];
        for (field, ch) in singles {
            check_channel(field, ch)?;
        }
        let lists = [
            ("channels.estop_sensors", &c.estop_sensors),
            ("simulation.sensors_on", &self.simulation.sensors_on),
            ("simulation.switches_on", &self.simulation.switches_on),
        ];
        for (field, list) in lists {
            for &ch in list.iter() {
                check_channel(field, ch)?;
            }
        }
        Ok(())
    }
}

fn check_channel(field: &str, channel: ChannelId) -> Result<(), ConfigError> {
    if channel as usize >= MAX_CHANNELS {
        return Err(ConfigError::ValidationError(format!(
            "{field}: channel {channel} out of range 0..{MAX_CHANNELS}"
        )));
    }
    Ok(())
}

/// Trait for loading configuration from TOML files.
///
/// This trait provides a default implementation that works with any type
/// implementing `serde::de::DeserializeOwned`.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound(path.display().to_string())
            } else {
                ConfigError::IoError(format!("{}: {e}", path.display()))
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation: any deserializable struct can be loaded.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}
