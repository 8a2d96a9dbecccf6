//! In-memory actuator with an observation probe

use super::{Actuator, ActuatorError};
use crate::core::Bit;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct SimState {
    state: Bit,
    history: Vec<Bit>,
    fail_next_write: bool,
}

/// Simulated pin. Every successful write is appended to the history that the
/// paired [`SimulatedProbe`] exposes.
#[derive(Debug, Default)]
pub struct SimulatedActuator {
    inner: Arc<Mutex<SimState>>,
}

/// Read-side view of a [`SimulatedActuator`], kept by tests and the CLI
#[derive(Debug, Clone)]
pub struct SimulatedProbe {
    inner: Arc<Mutex<SimState>>,
}

fn lock(inner: &Mutex<SimState>) -> MutexGuard<'_, SimState> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl SimulatedActuator {
    pub fn new() -> Self { Self::default() }

    /// Actuator plus a probe sharing its state
    pub fn with_probe() -> (Self, SimulatedProbe) {
        let actuator = Self::new();
        let probe = actuator.probe();
        (actuator, probe)
    }

    pub fn probe(&self) -> SimulatedProbe {
        SimulatedProbe { inner: self.inner.clone() }
    }
}

impl Actuator for SimulatedActuator {
    fn set(&mut self, state: Bit) -> Result<(), ActuatorError> {
        let mut sim = lock(&self.inner);
        if sim.fail_next_write {
            sim.fail_next_write = false;
            return Err(ActuatorError::WriteFailed("simulated failure".into()));
        }
        sim.state = state;
        sim.history.push(state);
        Ok(())
    }

    fn read(&self) -> Bit { lock(&self.inner).state }
}

impl SimulatedProbe {
    pub fn state(&self) -> Bit { lock(&self.inner).state }

    /// Every successful write, oldest first
    pub fn history(&self) -> Vec<Bit> { lock(&self.inner).history.clone() }

    pub fn write_count(&self) -> usize { lock(&self.inner).history.len() }

    /// Number of writes that switched the pin off
    pub fn off_writes(&self) -> usize {
        lock(&self.inner).history.iter().filter(|b| **b == Bit::Off).count()
    }

    /// Make the next write fail once
    pub fn fail_next_write(&self) { lock(&self.inner).fail_next_write = true; }

    pub fn clear_history(&self) { lock(&self.inner).history.clear(); }
}
