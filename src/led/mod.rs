//! LED: one actor per actuator, hosting its blink scheduler
//!
//! # Architecture
//!
//! ```text
//! LedHandle (cheap clone)
//!     │  mpsc (commands, optional oneshot reply)
//!     ▼
//! LedActor ──► Actuator (simulated / sysfs)
//!     ▲
//!     └── Timers<Countdown> (delayed self-messages)
//! ```
//!
//! Awaiting methods (`blink`, `set`, ...) return the outcome of the command.
//! `cast_*` methods only enqueue and are what other actors use, so no actor
//! ever waits on another one.

mod actor;
pub mod countdown;

pub use actor::LedActor;
pub use countdown::{Countdown, INFINITE};

use crate::actuator::ActuatorError;
use crate::core::Bit;
use crate::timer::CancelResult;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

/// LED command errors
#[derive(Error, Debug)]
pub enum LedError {
    #[error("invalid actuator command: state {0} is not 0 or 1")]
    InvalidCommand(u8),

    #[error(transparent)]
    Actuator(#[from] ActuatorError),

    #[error("led actor has shut down")]
    ActorShutdown,
}

/// Point-in-time view of an LED actor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedStatus {
    pub name: String,
    pub state: Bit,
    /// A tracked blink countdown is in flight
    pub blinking: bool,
    /// All pending blink timers, including untracked overlapping chains
    pub pending_timers: usize,
}

type Reply<T> = Option<oneshot::Sender<T>>;

pub(crate) enum LedCommand {
    Set { raw: u8, reply: Reply<Result<(), LedError>> },
    Toggle { reply: oneshot::Sender<Result<Bit, LedError>> },
    Read { reply: oneshot::Sender<Bit> },
    Status { reply: oneshot::Sender<LedStatus> },
    Blink {
        interval_ms: u32,
        times: i64,
        /// Cancel the tracked countdown before starting
        exclusive: bool,
        reply: Reply<Result<(), LedError>>,
    },
    CancelBlink { reply: Reply<CancelResult> },
}

/// Handle for talking to an LED actor
#[derive(Clone)]
pub struct LedHandle {
    tx: mpsc::UnboundedSender<LedCommand>,
    name: Arc<str>,
}

impl std::fmt::Debug for LedHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedHandle")
            .field("name", &self.name)
            .field("alive", &self.is_alive())
            .finish()
    }
}

impl LedHandle {
    pub(crate) fn new(tx: mpsc::UnboundedSender<LedCommand>, name: &str) -> Self {
        Self { tx, name: Arc::from(name) }
    }

    pub fn name(&self) -> &str { &self.name }

    /// `false` once the actor task has exited
    pub fn is_alive(&self) -> bool { !self.tx.is_closed() }

    async fn call<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> LedCommand) -> Result<T, LedError> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(make(reply)).map_err(|_| LedError::ActorShutdown)?;
        rx.await.map_err(|_| LedError::ActorShutdown)
    }

    fn cast(&self, command: LedCommand) -> Result<(), LedError> {
        self.tx.send(command).map_err(|_| LedError::ActorShutdown)
    }

    // ------------------------------------------------------------------------
    // Direct state
    // ------------------------------------------------------------------------

    /// Set the pin from a raw value. Anything but 0 or 1 is rejected and
    /// leaves the pin untouched.
    pub async fn set(&self, raw: u8) -> Result<(), LedError> {
        self.call(|reply| LedCommand::Set { raw, reply: Some(reply) }).await?
    }

    pub async fn on(&self) -> Result<(), LedError> { self.set(Bit::On.as_u8()).await }

    pub async fn off(&self) -> Result<(), LedError> { self.set(Bit::Off.as_u8()).await }

    /// Flip the pin, returning the new state
    pub async fn toggle(&self) -> Result<Bit, LedError> {
        self.call(|reply| LedCommand::Toggle { reply }).await?
    }

    pub async fn read(&self) -> Result<Bit, LedError> {
        self.call(|reply| LedCommand::Read { reply }).await
    }

    pub async fn status(&self) -> Result<LedStatus, LedError> {
        self.call(|reply| LedCommand::Status { reply }).await
    }

    // ------------------------------------------------------------------------
    // Blink scheduler
    // ------------------------------------------------------------------------

    /// Replace any running countdown with a new one. `times` of
    /// [`INFINITE`] blinks until cancelled.
    pub async fn blink(&self, interval_ms: u32, times: i64) -> Result<(), LedError> {
        self.call(|reply| LedCommand::Blink { interval_ms, times, exclusive: true, reply: Some(reply) })
            .await?
    }

    /// Start a countdown without cancelling the running one. The previous
    /// chain keeps firing on its own until it runs out.
    pub async fn start_blink(&self, interval_ms: u32, times: i64) -> Result<(), LedError> {
        self.call(|reply| LedCommand::Blink { interval_ms, times, exclusive: false, reply: Some(reply) })
            .await?
    }

    /// Cancel the tracked countdown; the pin keeps its current state
    pub async fn cancel_blink(&self) -> Result<CancelResult, LedError> {
        self.call(|reply| LedCommand::CancelBlink { reply: Some(reply) }).await
    }

    // ------------------------------------------------------------------------
    // Fire-and-forget variants
    // ------------------------------------------------------------------------

    pub fn cast_set(&self, state: Bit) -> Result<(), LedError> {
        self.cast(LedCommand::Set { raw: state.as_u8(), reply: None })
    }

    pub fn cast_blink(&self, interval_ms: u32, times: i64) -> Result<(), LedError> {
        self.cast(LedCommand::Blink { interval_ms, times, exclusive: true, reply: None })
    }

    pub fn cast_start_blink(&self, interval_ms: u32, times: i64) -> Result<(), LedError> {
        self.cast(LedCommand::Blink { interval_ms, times, exclusive: false, reply: None })
    }

    pub fn cast_cancel_blink(&self) -> Result<(), LedError> {
        self.cast(LedCommand::CancelBlink { reply: None })
    }
}
