//! TXC Common Library
//!
//! Shared types for the TXC control executive: the operating-mode enum,
//! the per-tick sensor snapshot, the device-abstraction trait consumed by
//! the engine, and TOML configuration loading.
//!
//! # Module Structure
//!
//! - [`consts`] - Error codes, exit codes and timing defaults
//! - [`state`] - Operating-mode enum (`State`)
//! - [`device`] - `DeviceIo` trait and `DeviceError`
//! - [`snapshot`] - `SensorSnapshot` and `SampleSet`
//! - [`config`] - Configuration loading traits and types
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use txc_common::prelude::*;
//! ```

pub mod config;
pub mod consts;
pub mod device;
pub mod prelude;
pub mod snapshot;
pub mod state;
