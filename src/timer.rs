//! Timer - cancellable delayed self-messages
//!
//! Every actor owns one [`Timers`] set. Scheduling spawns a sleeping task that
//! posts a [`Fired`] envelope into the actor's timer inbox; the actor selects
//! on that inbox next to its command mailbox.
//!
//! ```text
//! actor ── schedule(delay, msg) ──► sleep task ──(deadline)──► timer inbox
//!   ▲                                                              │
//!   └──────────────────── accept(fired) → Some(msg) ◄──────────────┘
//! ```
//!
//! Cancellation aborts the sleep task, but the task may already have posted
//! its envelope. [`Timers::accept`] is the second gate: only timers still
//! marked pending are handed back, so a cancelled timer never delivers.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

/// Opaque reference to a scheduled delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TimerRef(u64);

impl fmt::Display for TimerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#timer<{}>", self.0)
    }
}

/// Envelope posted by a timer task when its deadline passes
#[derive(Debug)]
pub struct Fired<M> {
    pub timer: TimerRef,
    pub message: M,
}

/// Outcome of a cancel request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelResult {
    /// Delivery revoked before it reached the owner
    Cancelled { remaining: Duration },
    /// Handle was absent, already delivered or already cancelled
    NotPending,
}

impl CancelResult {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CancelResult::Cancelled { .. })
    }

    /// Remaining milliseconds, `None` for the no-op sentinel
    pub fn remaining_ms(&self) -> Option<u64> {
        match self {
            CancelResult::Cancelled { remaining } => Some(remaining.as_millis() as u64),
            CancelResult::NotPending => None,
        }
    }
}

struct Pending {
    deadline: Instant,
    task: JoinHandle<()>,
}

/// Timer set owned by a single actor
pub struct Timers<M> {
    tx: mpsc::UnboundedSender<Fired<M>>,
    pending: HashMap<TimerRef, Pending>,
    next_id: u64,
}

impl<M: Send + 'static> Timers<M> {
    /// Create a timer set and the inbox its deliveries arrive on
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Fired<M>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, pending: HashMap::new(), next_id: 0 }, rx)
    }

    /// Deliver `message` to the owner's inbox after `delay`. Must be called
    /// from within a tokio runtime.
    pub fn schedule(&mut self, delay: Duration, message: M) -> TimerRef {
        self.next_id += 1;
        let timer = TimerRef(self.next_id);
        let deadline = Instant::now() + delay;
        let tx = self.tx.clone();

        let task = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            // Owner gone means nobody is waiting for this delivery
            let _ = tx.send(Fired { timer, message });
        });

        self.pending.insert(timer, Pending { deadline, task });
        timer
    }

    /// Convenience wrapper over [`Timers::schedule`] taking milliseconds
    pub fn schedule_ms(&mut self, delay_ms: u32, message: M) -> TimerRef {
        self.schedule(Duration::from_millis(u64::from(delay_ms)), message)
    }

    /// Revoke a pending delivery. Calling twice returns `NotPending` the
    /// second time.
    pub fn cancel(&mut self, timer: TimerRef) -> CancelResult {
        match self.pending.remove(&timer) {
            Some(pending) => {
                pending.task.abort();
                CancelResult::Cancelled {
                    remaining: pending.deadline.saturating_duration_since(Instant::now()),
                }
            }
            None => {
                debug!(%timer, "cancel ignored, timer not pending");
                CancelResult::NotPending
            }
        }
    }

    pub fn cancel_opt(&mut self, timer: Option<TimerRef>) -> CancelResult {
        match timer {
            Some(timer) => self.cancel(timer),
            None => {
                debug!("cancel ignored, no timer");
                CancelResult::NotPending
            }
        }
    }

    /// Element-wise cancel; never fails
    pub fn cancel_all<I>(&mut self, timers: I) -> Vec<CancelResult>
    where
        I: IntoIterator<Item = Option<TimerRef>>,
    {
        timers.into_iter().map(|t| self.cancel_opt(t)).collect()
    }

    /// Abort every outstanding timer (actor shutdown)
    pub fn clear(&mut self) {
        for (_, pending) in self.pending.drain() {
            pending.task.abort();
        }
    }

    /// Admit a delivery from the inbox. Returns `None` for a timer that was
    /// cancelled after its task already posted.
    pub fn accept(&mut self, fired: Fired<M>) -> Option<M> {
        if self.pending.remove(&fired.timer).is_some() {
            Some(fired.message)
        } else {
            debug!(timer = %fired.timer, "discarding stale timer delivery");
            None
        }
    }

    pub fn is_pending(&self, timer: TimerRef) -> bool { self.pending.contains_key(&timer) }

    pub fn pending_count(&self) -> usize { self.pending.len() }
}

impl<M> Drop for Timers<M> {
    fn drop(&mut self) {
        for (_, pending) in self.pending.drain() {
            pending.task.abort();
        }
    }
}
