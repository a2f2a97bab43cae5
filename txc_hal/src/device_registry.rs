//! Device registry.
//!
//! Provides a `DeviceRegistry` struct for registering and retrieving device
//! factories by name. Constructor-injected, no global state.

use std::collections::HashMap;

use thiserror::Error;
use txc_common::config::ControllerConfig;
use txc_common::device::DeviceIo;

use crate::drivers::simulation::SimulatedDevice;

/// Boxed device that can be moved to a worker thread.
pub type BoxedDevice = Box<dyn DeviceIo + Send>;

/// Factory function type for creating device instances.
pub type DeviceFactory = fn(&ControllerConfig) -> BoxedDevice;

/// Registry errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A factory with this name already exists.
    #[error("Device '{0}' is already registered")]
    Duplicate(&'static str),

    /// No factory with this name.
    #[error("Device not found: {0}")]
    NotFound(String),
}

/// Registry of available devices.
pub struct DeviceRegistry {
    factories: HashMap<&'static str, DeviceFactory>,
}

impl DeviceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry holding every built-in device.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.factories.insert("simulation", create_simulated);
        registry
    }

    /// Register a device factory.
    ///
    /// # Errors
    /// Returns `RegistryError::Duplicate` if the name is taken.
    pub fn register(
        &mut self,
        name: &'static str,
        factory: DeviceFactory,
    ) -> Result<(), RegistryError> {
        if self.factories.contains_key(name) {
            return Err(RegistryError::Duplicate(name));
        }
        self.factories.insert(name, factory);
        Ok(())
    }

    /// Create a device instance by name.
    ///
    /// # Errors
    /// Returns `RegistryError::NotFound` if no device with the given name is registered.
    pub fn create(&self, name: &str, config: &ControllerConfig) -> Result<BoxedDevice, RegistryError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
        Ok(factory(config))
    }

    /// List all registered device names, sorted.
    pub fn list(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

fn create_simulated(config: &ControllerConfig) -> BoxedDevice {
    Box::new(SimulatedDevice::from_config(&config.simulation))
}
