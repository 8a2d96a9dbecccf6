//! Sequencer actor: drives an LED actor along a program of intervals

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::options::PatternOptions;
use super::state::{overlapping_times, PatternState};
use super::{SequencerCommand, SequencerError, SequencerHandle};
use crate::core::Bit;
use crate::led::{LedError, LedHandle, INFINITE};
use crate::registry::Registry;
use crate::timer::{Fired, Timers};

/// Self-messages on the sequencer's two timelines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tick {
    Trigger,
    Reset,
}

/// Entry point for pattern sequencers
pub struct Sequencer {
    state: PatternState,
    led: LedHandle,
    registry: Registry,
    timers: Timers<Tick>,
    /// The target actor went away; the loop stops after the current event
    target_lost: bool,
}

impl Sequencer {
    /// Start a sequencer. The target is resolved here, so a missing actuator
    /// fails immediately instead of on the first trigger.
    pub fn start(
        registry: &Registry,
        options: PatternOptions,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(SequencerHandle, JoinHandle<()>), SequencerError> {
        let state = PatternState::new(&options);
        let led = registry
            .lookup(&state.led_target)
            .ok_or_else(|| SequencerError::NoActuatorProcess(state.led_target.clone()))?;

        let (tx, rx) = mpsc::unbounded_channel();
        let (timers, fired) = Timers::new();
        let sequencer = Self { state, led, registry: registry.clone(), timers, target_lost: false };
        let task = tokio::spawn(sequencer.run(rx, fired, shutdown));
        Ok((SequencerHandle::new(tx), task))
    }

    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<SequencerCommand>,
        mut fired: mpsc::UnboundedReceiver<Fired<Tick>>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        info!(led = %self.state.led_target, overlapping = self.state.overlapping, "sequencer started");
        self.arm_reset();
        // The first trigger runs before the mailbox is read
        self.trigger();

        let mut listening = true;
        while !self.target_lost {
            tokio::select! {
                signal = shutdown.recv(), if listening => match signal {
                    Err(broadcast::error::RecvError::Closed) => listening = false,
                    _ => break,
                },
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(delivery) = fired.recv() => self.handle_fired(delivery),
            }
        }

        if self.target_lost {
            warn!(led = %self.state.led_target, "target actuator gone, sequencer stopping");
        }
        self.timers.clear();
        info!(led = %self.state.led_target, "sequencer stopped");
    }

    fn handle_command(&mut self, command: SequencerCommand) {
        match command {
            SequencerCommand::Pause { reply } => {
                self.pause();
                let _ = reply.send(());
            }
            SequencerCommand::Play { reply } => {
                if self.state.is_running() {
                    debug!("play ignored, already running");
                } else {
                    self.trigger();
                }
                let _ = reply.send(());
            }
            SequencerCommand::Reset { reply } => {
                self.reset();
                let _ = reply.send(());
            }
            SequencerCommand::Change { options, reply } => {
                let _ = reply.send(self.change(options));
            }
            SequencerCommand::State { reply } => {
                let _ = reply.send(self.state.clone());
            }
        }
    }

    fn handle_fired(&mut self, delivery: Fired<Tick>) {
        let timer = delivery.timer;
        match self.timers.accept(delivery) {
            Some(Tick::Trigger) if self.state.trigger_handle == Some(timer) => self.trigger(),
            Some(Tick::Reset) if self.state.reset_handle == Some(timer) => {
                self.state.reset_handle = None;
                self.reset();
                self.arm_reset();
            }
            Some(tick) => debug!(?tick, %timer, "ignoring superseded tick"),
            None => {}
        }
    }

    /// Advance both cursors, fire the LED and schedule the next trigger
    fn trigger(&mut self) {
        let Some((interval, duration)) = self.state.next_step() else {
            warn!("program is empty, sequencer idle");
            self.state.trigger_handle = None;
            return;
        };

        let sent = if self.state.overlapping {
            self.led.cast_start_blink(interval, overlapping_times(interval, duration))
        } else {
            self.led.cast_blink(interval, INFINITE)
        };
        self.check(sent);

        debug!(interval, duration, "trigger");
        self.state.trigger_handle = Some(self.timers.schedule_ms(duration, Tick::Trigger));
    }

    /// Overlapping countdowns already handed to the LED keep running
    fn pause(&mut self) {
        self.timers.cancel_opt(self.state.trigger_handle.take());
        if !self.state.overlapping {
            let sent = self.led.cast_cancel_blink();
            self.check(sent);
        }
        let sent = self.led.cast_set(Bit::Off);
        self.check(sent);
        debug!("paused");
    }

    fn reset(&mut self) {
        self.state.restore();
        let sent = self.led.cast_set(Bit::Off);
        self.check(sent);
        debug!("reset to program start");
    }

    fn arm_reset(&mut self) {
        if let Some(delay) = self.state.next_reset_delay() {
            self.state.reset_handle = Some(self.timers.schedule_ms(delay, Tick::Reset));
        }
    }

    fn change(&mut self, options: PatternOptions) -> Result<(), SequencerError> {
        let retarget = match &options.led_target {
            Some(name) if *name != self.state.led_target => Some(
                self.registry
                    .lookup(name)
                    .ok_or_else(|| SequencerError::NoActuatorProcess(name.clone()))?,
            ),
            _ => None,
        };

        if let Some(led) = retarget {
            // Release the previous actuator before switching
            let _ = self.led.cast_cancel_blink();
            let _ = self.led.cast_set(Bit::Off);
            self.led = led;
        }

        if self.state.apply_change(&options) {
            self.timers.cancel_opt(self.state.reset_handle.take());
            self.arm_reset();
        }
        info!(led = %self.state.led_target, program = ?self.state.program, "program changed");
        Ok(())
    }

    fn check(&mut self, sent: Result<(), LedError>) {
        if let Err(e) = sent {
            warn!(led = %self.state.led_target, "led command failed: {}", e);
            self.target_lost = true;
        }
    }
}
