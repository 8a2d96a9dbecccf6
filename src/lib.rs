//! Ledpulse: blink schedulers and pattern sequencers for binary actuators.
//!
//! # Architecture
//!
//! ```text
//! LedpulseConfig (entry point)
//!   │
//!   ├── Registry  name → LedHandle
//!   │
//!   ├── LedActor (one per actuator)
//!   │     ├── Actuator: SimulatedActuator | SysfsActuator
//!   │     └── Timers<Countdown>  on/off toggles with a countdown
//!   │
//!   └── Sequencer (optional, one per program)
//!         └── Timers<Tick>  trigger and reset timelines
//! ```
//!
//! # LED commands
//!
//! | Command | Method | Description |
//! |---------|--------|-------------|
//! | set | `led.set(raw)` | Write 0 or 1; anything else is rejected |
//! | toggle | `led.toggle()` | Flip the pin |
//! | blink | `led.blink(interval, times)` | Replace the running countdown |
//! | start_blink | `led.start_blink(interval, times)` | Layer another countdown |
//! | cancel_blink | `led.cancel_blink()` | Stop the tracked countdown |
//!
//! # Usage
//!
//! ```ignore
//! use ledpulse::{LedActor, PatternOptions, Registry, Sequencer, Shutdown, SimulatedActuator};
//!
//! let shutdown = Shutdown::new();
//! let registry = Registry::new();
//! let (led, _task) = LedActor::spawn("status", SimulatedActuator::new(), shutdown.subscribe());
//! registry.register(led.clone())?;
//!
//! led.blink(250, 3).await?;
//!
//! let (seq, _task) = Sequencer::start(
//!     &registry,
//!     PatternOptions::new().with_intervals(vec![100, 400]).with_resets(vec![10_000]),
//!     shutdown.subscribe(),
//! )?;
//! seq.pause().await?;
//! ```

pub mod actuator;
pub mod config;
pub mod core;
pub mod led;
pub mod logging;
pub mod registry;
pub mod runtime;
pub mod sequencer;
pub mod timer;

pub use actuator::{Actuator, ActuatorError, SimulatedActuator, SimulatedProbe};
#[cfg(feature = "sysfs")]
pub use actuator::SysfsActuator;
pub use config::{Backend, ConfigError, LedConfig, LedpulseConfig, Running};
pub use core::Bit;
pub use led::{LedActor, LedError, LedHandle, LedStatus, INFINITE};
pub use registry::{Registry, RegistryError};
pub use runtime::Shutdown;
pub use sequencer::{PatternOptions, PatternState, Sequencer, SequencerError, SequencerHandle};
pub use timer::{CancelResult, TimerRef, Timers};
