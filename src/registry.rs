//! Registry - name → LED handle lookup
//!
//! Sequencers address their target by name. Passing a `Registry` explicitly
//! keeps independent instances (tests, multiple boards) isolated from each
//! other.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;
use tracing::debug;

use crate::led::LedHandle;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("an actuator named '{0}' is already registered")]
    AlreadyRegistered(String),
}

#[derive(Clone, Default)]
pub struct Registry {
    leds: Arc<RwLock<HashMap<String, LedHandle>>>,
}

impl Registry {
    pub fn new() -> Self { Self::default() }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, LedHandle>> {
        self.leds.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, LedHandle>> {
        self.leds.write().unwrap_or_else(|p| p.into_inner())
    }

    /// Register under the handle's own name. A name held by a dead actor
    /// can be taken over.
    pub fn register(&self, led: LedHandle) -> Result<(), RegistryError> {
        let mut leds = self.write();
        if let Some(existing) = leds.get(led.name()) {
            if existing.is_alive() {
                return Err(RegistryError::AlreadyRegistered(led.name().to_string()));
            }
            debug!(led = led.name(), "replacing dead registration");
        }
        leds.insert(led.name().to_string(), led);
        Ok(())
    }

    /// Live handle for `name`, if any
    pub fn lookup(&self, name: &str) -> Option<LedHandle> {
        self.read().get(name).filter(|led| led.is_alive()).cloned()
    }

    pub fn unregister(&self, name: &str) -> Option<LedHandle> { self.write().remove(name) }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().keys().cloned().collect();
        names.sort();
        names
    }
}
