//! Sequencer: cycles an LED through a program of blink intervals
//!
//! A program is a list of blink intervals and a list of durations. Every
//! trigger pops one of each: the LED blinks at `interval` for `duration`,
//! then the next trigger fires. Both lists wrap around independently.
//! An optional reset timeline periodically rewinds the cursors.
//!
//! ```text
//!              Trigger (every duration)        Reset (every resets[i])
//!                    │                                 │
//!  SequencerHandle ──► Sequencer actor ── pops ──► PatternState
//!   pause/play/           │
//!   reset/change          └── cast_blink / cast_start_blink ──► LedActor
//! ```
//!
//! | Mode | Trigger sends | Pause |
//! |------|---------------|-------|
//! | exclusive | `blink(interval, ∞)`, replacing the running countdown | cancels the LED's countdown |
//! | overlapping | `start_blink(interval, n)`, countdowns layer up | running countdowns finish on their own |

mod actor;
mod options;
mod state;

pub use actor::Sequencer;
pub use options::PatternOptions;
pub use state::{
    overlapping_times, PatternState, Program, DEFAULT_DURATIONS, DEFAULT_INTERVALS, DEFAULT_TARGET,
};

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SequencerError {
    #[error("no actuator process named '{0}'")]
    NoActuatorProcess(String),

    #[error("sequencer has shut down")]
    ActorShutdown,
}

pub(crate) enum SequencerCommand {
    Pause { reply: oneshot::Sender<()> },
    Play { reply: oneshot::Sender<()> },
    Reset { reply: oneshot::Sender<()> },
    Change { options: PatternOptions, reply: oneshot::Sender<Result<(), SequencerError>> },
    State { reply: oneshot::Sender<PatternState> },
}

/// Handle for controlling a running sequencer
#[derive(Clone)]
pub struct SequencerHandle {
    tx: mpsc::UnboundedSender<SequencerCommand>,
}

impl SequencerHandle {
    pub(crate) fn new(tx: mpsc::UnboundedSender<SequencerCommand>) -> Self { Self { tx } }

    pub fn is_alive(&self) -> bool { !self.tx.is_closed() }

    async fn call<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> SequencerCommand,
    ) -> Result<T, SequencerError> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(make(reply)).map_err(|_| SequencerError::ActorShutdown)?;
        rx.await.map_err(|_| SequencerError::ActorShutdown)
    }

    /// Stop triggering and switch the LED off
    pub async fn pause(&self) -> Result<(), SequencerError> {
        self.call(|reply| SequencerCommand::Pause { reply }).await
    }

    /// Resume from the current cursor; no-op while running
    pub async fn play(&self) -> Result<(), SequencerError> {
        self.call(|reply| SequencerCommand::Play { reply }).await
    }

    /// Rewind both cursors to the program start and switch the LED off
    pub async fn reset(&self) -> Result<(), SequencerError> {
        self.call(|reply| SequencerCommand::Reset { reply }).await
    }

    /// Reconfigure live. Takes effect from the next trigger; the pending
    /// trigger keeps its original delay.
    pub async fn change(&self, options: PatternOptions) -> Result<(), SequencerError> {
        self.call(|reply| SequencerCommand::Change { options, reply }).await?
    }

    pub async fn state(&self) -> Result<PatternState, SequencerError> {
        self.call(|reply| SequencerCommand::State { reply }).await
    }
}
