//! Actuator: the pin an LED actor drives
//!
//! The schedulers only need two operations: write a [`Bit`] and read it back.
//! Backends:
//!
//! | Backend | Use |
//! |---------|-----|
//! | [`SimulatedActuator`] | tests, demos, hosts without hardware |
//! | [`SysfsActuator`] | Linux LED class / GPIO attribute files (`sysfs` feature) |

mod simulated;
#[cfg(feature = "sysfs")]
mod sysfs;

pub use simulated::{SimulatedActuator, SimulatedProbe};
#[cfg(feature = "sysfs")]
pub use sysfs::SysfsActuator;

use crate::core::Bit;
use thiserror::Error;

/// Errors raised by an actuator write
#[derive(Error, Debug)]
pub enum ActuatorError {
    #[error("actuator I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("actuator write failed: {0}")]
    WriteFailed(String),
}

/// Binary output capability
pub trait Actuator: Send + 'static {
    fn set(&mut self, state: Bit) -> Result<(), ActuatorError>;
    fn read(&self) -> Bit;
}

impl Actuator for Box<dyn Actuator> {
    fn set(&mut self, state: Bit) -> Result<(), ActuatorError> { (**self).set(state) }
    fn read(&self) -> Bit { (**self).read() }
}
