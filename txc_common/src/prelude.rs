//! Prelude module for common re-exports.
//!
//! ```rust
//! use txc_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{
    ConfigError, ConfigLoader, ControllerConfig, DwellPolicy, LogLevel, SharedConfig,
};

// ─── Constants ──────────────────────────────────────────────────────
pub use crate::consts::{
    ERR_EMERGENCY_STOP, ERR_LATCHED_FAULT, ERR_NONE, ERR_TRANSIENT, MAX_CHANNELS,
};

// ─── Device & Snapshot ──────────────────────────────────────────────
pub use crate::device::{ChannelId, DeviceError, DeviceIo};
pub use crate::snapshot::{SampleSet, SensorSnapshot};
pub use crate::state::State;
