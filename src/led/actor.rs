//! LED actor: owns the actuator and the blink timer bookkeeping

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::countdown::Countdown;
use super::{LedCommand, LedError, LedHandle, LedStatus};
use crate::actuator::Actuator;
use crate::core::Bit;
use crate::timer::{CancelResult, Fired, TimerRef, Timers};

/// Per-actuator actor. All pin writes happen on its task.
pub struct LedActor {
    name: String,
    actuator: Box<dyn Actuator>,
    timers: Timers<Countdown>,
    /// The tracked countdown, i.e. the one `blink` and `cancel_blink` act on
    blink: Option<TimerRef>,
}

fn respond<T>(reply: Option<oneshot::Sender<T>>, value: T) {
    if let Some(reply) = reply {
        let _ = reply.send(value);
    }
}

impl LedActor {
    /// Spawn an actor for `actuator`.
    ///
    /// Returns the handle and the task's JoinHandle. The actor exits when the
    /// shutdown signal fires or every handle is dropped, switching the pin
    /// off on the way out.
    pub fn spawn(
        name: impl Into<String>,
        actuator: impl Actuator,
        shutdown: broadcast::Receiver<()>,
    ) -> (LedHandle, JoinHandle<()>) {
        let name = name.into();
        let (tx, rx) = mpsc::unbounded_channel();
        let (timers, fired) = Timers::new();
        let handle = LedHandle::new(tx, &name);

        let actor = Self { name, actuator: Box::new(actuator), timers, blink: None };
        let task = tokio::spawn(actor.run(rx, fired, shutdown));
        (handle, task)
    }

    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<LedCommand>,
        mut fired: mpsc::UnboundedReceiver<Fired<Countdown>>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        info!(led = %self.name, "led actor started");
        let mut listening = true;

        loop {
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

        self.stop();
    }

    fn handle_command(&mut self, command: LedCommand) {
        match command {
            LedCommand::Set { raw, reply } => {
                let result = match Bit::try_from(raw) {
                    Ok(bit) => self.write(bit),
                    Err(e) => {
                        warn!(led = %self.name, "rejected command: {}", e);
                        Err(LedError::InvalidCommand(raw))
                    }
                };
                respond(reply, result);
            }
            LedCommand::Toggle { reply } => {
                let next = self.actuator.read().toggled();
                let _ = reply.send(self.write(next).map(|_| next));
            }
            LedCommand::Read { reply } => {
                let _ = reply.send(self.actuator.read());
            }
            LedCommand::Status { reply } => {
                let _ = reply.send(self.status());
            }
            LedCommand::Blink { interval_ms, times, exclusive, reply } => {
                if exclusive {
                    self.timers.cancel_opt(self.blink.take());
                }
                respond(reply, self.start(interval_ms, times));
            }
            LedCommand::CancelBlink { reply } => {
                let result: CancelResult = self.timers.cancel_opt(self.blink.take());
                respond(reply, result);
            }
        }
    }

    /// Write On and arm the countdown. The timer is armed and tracked even
    /// when the write fails; the error still goes back to the caller.
    fn start(&mut self, interval_ms: u32, times: i64) -> Result<(), LedError> {
        // A zero interval would spin the actor
        let interval_ms = interval_ms.max(1);
        let written = self.write(Bit::On);
        let timer = self.timers.schedule_ms(interval_ms, Countdown::after_start(interval_ms, times));
        debug!(led = %self.name, interval_ms, times, %timer, "blink started");
        self.blink = Some(timer);
        written
    }

    fn handle_fired(&mut self, delivery: Fired<Countdown>) {
        let timer = delivery.timer;
        let Some(countdown) = self.timers.accept(delivery) else { return };

        let step = countdown.step();
        // Errors are already logged; the chain keeps going
        let _ = self.write(step.write);

        let next = step.next.map(|c| self.timers.schedule_ms(c.interval_ms, c));
        if self.blink == Some(timer) {
            if next.is_none() {
                debug!(led = %self.name, "blink finished");
            }
            self.blink = next;
        }
    }

    fn write(&mut self, state: Bit) -> Result<(), LedError> {
        self.actuator.set(state).map_err(|e| {
            warn!(led = %self.name, %state, "actuator write failed: {}", e);
            LedError::from(e)
        })
    }

    fn status(&self) -> LedStatus {
        LedStatus {
            name: self.name.clone(),
            state: self.actuator.read(),
            blinking: self.blink.is_some(),
            pending_timers: self.timers.pending_count(),
        }
    }

    fn stop(&mut self) {
        self.timers.clear();
        self.blink = None;
        let _ = self.write(Bit::Off);
        info!(led = %self.name, "led actor stopped");
    }
}
