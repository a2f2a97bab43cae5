//! # TXC HAL Library
//!
//! Device-abstraction implementations for the TXC control executive.
//! Devices implement the `DeviceIo` trait defined in `txc_common::device`.
//!
//! # Module Structure
//!
//! - [`device_registry`] - Device factory registration
//! - [`drivers`] - Device implementations (simulation, fake)
//! - [`timeout`] - Stall guard running a device on a worker thread
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      txc_hal                             │
//! │  ┌────────────────┐   ┌──────────────┐   ┌────────────┐  │
//! │  │ DeviceRegistry │──►│  DeviceIo    │◄──│ Timeout-   │  │
//! │  │  (by name)     │   │  (trait obj) │   │ Device     │  │
//! │  └────────────────┘   └──────┬───────┘   └────────────┘  │
//! │                              │                           │
//! │               ┌──────────────┴─────────────┐             │
//! │               ▼                            ▼             │
//! │      SimulatedDevice                  FakeDevice         │
//! └──────────────────────────────────────────────────────────┘
//! ```

#![deny(missing_docs)]

pub mod device_registry;
pub mod drivers;
pub mod timeout;

// Re-export key types for convenience
pub use crate::device_registry::{DeviceFactory, DeviceRegistry, RegistryError};
pub use crate::drivers::fake::{ActuatorCall, FakeDevice};
pub use crate::drivers::simulation::SimulatedDevice;
pub use crate::timeout::TimeoutDevice;
