//! Device implementations.
//!
//! - [`simulation`] - Software-simulated device for development runs
//! - [`fake`] - Deterministic, scriptable test double
//!
//! # Adding New Devices
//!
//! 1. Create a new submodule under `drivers/`
//! 2. Implement the `DeviceIo` trait from `txc_common::device`
//! 3. Register a factory in `DeviceRegistry::with_builtin()`

pub mod fake;
pub mod simulation;
