//! Configuration - which LEDs exist and which sequencers drive them
//!
//! ```json
//! {
//!   "leds": [
//!     { "name": "status", "backend": "simulated" },
//!     { "name": "power", "backend": { "sysfs": { "path": "/sys/class/leds/pwr/brightness" } } }
//!   ],
//!   "sequencers": [
//!     { "options": { "led_target": "status", "intervals": [100, 400], "resets": [10000] } }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::actuator::{Actuator, ActuatorError, SimulatedActuator};
use crate::led::{LedActor, LedHandle};
use crate::registry::{Registry, RegistryError};
use crate::runtime::Shutdown;
use crate::sequencer::{PatternOptions, Sequencer, SequencerError, SequencerHandle, DEFAULT_TARGET};

pub const CONFIG_ENV: &str = "LEDPULSE_CONFIG";
pub const CONFIG_FILE: &str = "config.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },

    #[error("invalid config {path}: {source}")]
    Parse { path: PathBuf, source: serde_json::Error },

    #[error("led '{0}' is configured more than once")]
    DuplicateLed(String),

    #[error("sequencer targets unknown led '{0}'")]
    UnknownTarget(String),

    #[error("led '{name}' could not be opened: {source}")]
    Actuator { name: String, source: ActuatorError },

    #[error("led '{0}' needs the sysfs feature")]
    BackendUnavailable(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Sequencer(#[from] SequencerError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Simulated,
    Sysfs { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedConfig {
    pub name: String,
    #[serde(default)]
    pub backend: Backend,
}

impl LedConfig {
    pub fn simulated(name: impl Into<String>) -> Self {
        Self { name: name.into(), backend: Backend::Simulated }
    }

    pub fn sysfs(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self { name: name.into(), backend: Backend::Sysfs { path: path.into() } }
    }

    fn open(&self) -> Result<Box<dyn Actuator>, ConfigError> {
        match &self.backend {
            Backend::Simulated => Ok(Box::new(SimulatedActuator::new())),
            #[cfg(feature = "sysfs")]
            Backend::Sysfs { path } => crate::actuator::SysfsActuator::open(path)
                .map(|a| Box::new(a) as Box<dyn Actuator>)
                .map_err(|source| ConfigError::Actuator { name: self.name.clone(), source }),
            #[cfg(not(feature = "sysfs"))]
            Backend::Sysfs { .. } => Err(ConfigError::BackendUnavailable(self.name.clone())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencerConfig {
    #[serde(default)]
    pub options: PatternOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedpulseConfig {
    #[serde(default)]
    pub leds: Vec<LedConfig>,
    #[serde(default)]
    pub sequencers: Vec<SequencerConfig>,
}

impl Default for LedpulseConfig {
    fn default() -> Self {
        Self { leds: vec![LedConfig::simulated(DEFAULT_TARGET)], sequencers: Vec::new() }
    }
}

/// `<config_dir>/ledpulse/config.json`, when the platform has a config dir
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("ledpulse").join(CONFIG_FILE))
}

impl LedpulseConfig {
    pub fn new() -> Self { Self { leds: Vec::new(), sequencers: Vec::new() } }
    pub fn with_led(mut self, led: LedConfig) -> Self { self.leds.push(led); self }
    pub fn with_sequencer(mut self, options: PatternOptions) -> Self {
        self.sequencers.push(SequencerConfig { options });
        self
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load and validate a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        let config = Self::from_json(&raw)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
        config.validate()?;
        debug!(path = %path.display(), leds = config.leds.len(), "config loaded");
        Ok(config)
    }

    /// Resolve the effective config: `explicit`, then `$LEDPULSE_CONFIG`,
    /// then the per-user default path. An explicit or env path must exist;
    /// a missing per-user file falls back to the built-in default.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|v| !v.is_empty()) {
            return Self::load(PathBuf::from(path));
        }
        match default_path() {
            Some(path) if path.exists() => Self::load(path),
            _ => {
                debug!("no config file, using built-in default");
                Ok(Self::default())
            }
        }
    }

    /// Reject duplicate LED names and sequencers aimed at LEDs not in the file
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = std::collections::HashSet::new();
        for led in &self.leds {
            if !seen.insert(led.name.as_str()) {
                return Err(ConfigError::DuplicateLed(led.name.clone()));
            }
        }
        for sequencer in &self.sequencers {
            let target = sequencer.options.led_target.as_deref().unwrap_or(DEFAULT_TARGET);
            if !seen.contains(target) {
                return Err(ConfigError::UnknownTarget(target.to_string()));
            }
        }
        Ok(())
    }

    /// Spawn every LED actor, register it, then start the sequencers.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(&self, registry: &Registry, shutdown: &Shutdown) -> Result<Running, ConfigError> {
        self.validate()?;
        let mut running = Running::default();

        for led in &self.leds {
            let actuator = led.open()?;
            let (handle, task) = LedActor::spawn(led.name.clone(), actuator, shutdown.subscribe());
            running.tasks.push(task);
            registry.register(handle.clone())?;
            running.leds.push(handle);
        }

        for sequencer in &self.sequencers {
            let (handle, task) =
                Sequencer::start(registry, sequencer.options.clone(), shutdown.subscribe())?;
            running.tasks.push(task);
            running.sequencers.push(handle);
        }

        info!(leds = running.leds.len(), sequencers = running.sequencers.len(), "config spawned");
        Ok(running)
    }
}

/// Actors started from a config
#[derive(Default)]
pub struct Running {
    pub leds: Vec<LedHandle>,
    pub sequencers: Vec<SequencerHandle>,
    pub tasks: Vec<JoinHandle<()>>,
}

impl Running {
    pub fn led(&self, name: &str) -> Option<&LedHandle> {
        self.leds.iter().find(|led| led.name() == name)
    }

    /// Wait for every actor task to exit
    pub async fn join(self) {
        for task in self.tasks {
            let _ = task.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_single_simulated_status_led() {
        let config = LedpulseConfig::default();
        assert_eq!(config.leds, vec![LedConfig::simulated("status")]);
        assert!(config.sequencers.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn backend_forms_parse() {
        let config = LedpulseConfig::from_json(
            r#"{"leds": [
                {"name": "a"},
                {"name": "b", "backend": "simulated"},
                {"name": "c", "backend": {"sysfs": {"path": "/tmp/led"}}}
            ]}"#,
        )
        .unwrap();
        assert_eq!(config.leds[0].backend, Backend::Simulated);
        assert_eq!(config.leds[1].backend, Backend::Simulated);
        assert_eq!(config.leds[2], LedConfig::sysfs("c", "/tmp/led"));
    }

    #[test]
    fn sequencer_options_parse_through_pattern_options() {
        let config = LedpulseConfig::from_json(
            r#"{"leds": [{"name": "status"}],
                "sequencers": [{"options": {"intervals": [5, 10], "overlapping": true, "resets": null}}]}"#,
        )
        .unwrap();
        let options = &config.sequencers[0].options;
        assert_eq!(options.intervals, Some(vec![5, 10]));
        assert_eq!(options.overlapping, Some(true));
        assert_eq!(options.resets, Some(None));
    }

    #[test]
    fn duplicate_led_rejected() {
        let config = LedpulseConfig::new()
            .with_led(LedConfig::simulated("x"))
            .with_led(LedConfig::simulated("x"));
        assert!(matches!(config.validate(), Err(ConfigError::DuplicateLed(name)) if name == "x"));
    }

    #[test]
    fn sequencer_default_target_must_exist() {
        let config = LedpulseConfig::new()
            .with_led(LedConfig::simulated("power"))
            .with_sequencer(PatternOptions::new());
        assert!(matches!(config.validate(), Err(ConfigError::UnknownTarget(name)) if name == "status"));
    }
}
