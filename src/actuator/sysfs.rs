//! Linux sysfs attribute backend
//!
//! Works with `/sys/class/leds/<name>/brightness` and exported
//! `/sys/class/gpio/gpioN/value` files: writing `1` or `0` drives the line.

use super::{Actuator, ActuatorError};
use crate::core::Bit;
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug)]
pub struct SysfsActuator {
    path: PathBuf,
    last: Bit,
}

impl SysfsActuator {
    /// Open an attribute file. The file must already exist (exported pin or
    /// registered LED).
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ActuatorError> {
        let path = path.into();
        let raw = std::fs::read_to_string(&path)?;
        let last = parse_level(&raw).unwrap_or_default();
        Ok(Self { path, last })
    }
}

/// Brightness files may hold values above 1; anything non-zero is on
fn parse_level(raw: &str) -> Option<Bit> {
    raw.trim().parse::<u32>().ok().map(|v| Bit::from(v > 0))
}

impl Actuator for SysfsActuator {
    fn set(&mut self, state: Bit) -> Result<(), ActuatorError> {
        std::fs::write(&self.path, state.to_string())?;
        self.last = state;
        Ok(())
    }

    fn read(&self) -> Bit {
        match std::fs::read_to_string(&self.path).ok().and_then(|raw| parse_level(&raw)) {
            Some(bit) => bit,
            None => {
                debug!(path = %self.path.display(), "unreadable level, using last written");
                self.last
            }
        }
    }
}
