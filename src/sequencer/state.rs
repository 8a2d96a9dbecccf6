//! Pattern state and its pure transitions
//!
//! The actor holds one [`PatternState`] and calls these methods from its
//! message handlers; everything timer- or LED-related stays in the actor, so
//! the cursor logic here is testable without a runtime.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::options::PatternOptions;
use crate::timer::TimerRef;

pub const DEFAULT_TARGET: &str = "status";
pub const DEFAULT_INTERVALS: [u32; 3] = [100, 250, 500];
pub const DEFAULT_DURATIONS: [u32; 3] = [2000, 2000, 2000];

/// Baseline the queues refill from. Only replaced by a change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub intervals: Vec<u32>,
    pub durations: Vec<u32>,
    pub resets: Option<Vec<u32>>,
}

impl Default for Program {
    fn default() -> Self {
        Self {
            intervals: DEFAULT_INTERVALS.to_vec(),
            durations: DEFAULT_DURATIONS.to_vec(),
            resets: None,
        }
    }
}

fn non_empty(list: &Option<Vec<u32>>) -> Option<&Vec<u32>> {
    list.as_ref().filter(|l| !l.is_empty())
}

/// Normalized reset update: `None` keep, `Some(None)` disable, `Some(Some)` replace
fn resets_update(options: &PatternOptions) -> Option<Option<Vec<u32>>> {
    match &options.resets {
        None => None,
        Some(None) => Some(None),
        Some(Some(list)) if list.is_empty() => None,
        Some(Some(list)) => Some(Some(list.clone())),
    }
}

impl Program {
    /// Overlay `options` on this program; unset fields keep their value
    pub fn merge(&self, options: &PatternOptions) -> Program {
        Program {
            intervals: non_empty(&options.intervals).unwrap_or(&self.intervals).clone(),
            durations: non_empty(&options.durations).unwrap_or(&self.durations).clone(),
            resets: resets_update(options).unwrap_or_else(|| self.resets.clone()),
        }
    }
}

/// Live sequencer state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternState {
    pub led_target: String,
    pub intervals: VecDeque<u32>,
    pub durations: VecDeque<u32>,
    pub resets: Option<VecDeque<u32>>,
    pub overlapping: bool,
    pub program: Program,
    /// Set while running, cleared while paused
    pub trigger_handle: Option<TimerRef>,
    /// Pending reset timer, if the reset timeline is armed
    pub reset_handle: Option<TimerRef>,
}

fn pop_refill(queue: &mut VecDeque<u32>, source: &[u32]) -> Option<u32> {
    if queue.is_empty() {
        queue.extend(source.iter().copied());
    }
    queue.pop_front()
}

impl PatternState {
    pub fn new(options: &PatternOptions) -> Self {
        let program = Program::default().merge(options);
        Self {
            led_target: options.led_target.clone().unwrap_or_else(|| DEFAULT_TARGET.to_string()),
            intervals: program.intervals.iter().copied().collect(),
            durations: program.durations.iter().copied().collect(),
            resets: program.resets.as_ref().map(|r| r.iter().copied().collect()),
            overlapping: options.overlapping.unwrap_or(false),
            program,
            trigger_handle: None,
            reset_handle: None,
        }
    }

    pub fn is_running(&self) -> bool { self.trigger_handle.is_some() }

    /// Pop the next `(interval, duration)` pair, refilling either queue from
    /// the program when it has run dry. `None` only for an empty program.
    pub fn next_step(&mut self) -> Option<(u32, u32)> {
        let interval = pop_refill(&mut self.intervals, &self.program.intervals);
        let duration = pop_refill(&mut self.durations, &self.program.durations);
        interval.zip(duration)
    }

    /// Delay before the next reset, or `None` when the timeline is disabled
    pub fn next_reset_delay(&mut self) -> Option<u32> {
        let source = self.program.resets.as_deref()?;
        let queue = self.resets.get_or_insert_with(VecDeque::new);
        pop_refill(queue, source)
    }

    /// Rewind both cursors to the start of the program
    pub fn restore(&mut self) {
        self.intervals = self.program.intervals.iter().copied().collect();
        self.durations = self.program.durations.iter().copied().collect();
    }

    /// Apply a live reconfiguration. Returns `true` when the reset timeline
    /// was replaced or disabled and must be re-armed by the caller.
    pub fn apply_change(&mut self, options: &PatternOptions) -> bool {
        self.program = self.program.merge(options);
        if let Some(target) = &options.led_target {
            self.led_target = target.clone();
        }
        if let Some(overlapping) = options.overlapping {
            self.overlapping = overlapping;
        }
        self.restore();

        let replaced = resets_update(options).is_some();
        if replaced {
            self.resets = self.program.resets.as_ref().map(|r| r.iter().copied().collect());
        }
        replaced
    }
}

/// Countdown length for an overlapping trigger: enough pulses to roughly fill
/// the trigger window, at least one
pub fn overlapping_times(interval_ms: u32, duration_ms: u32) -> i64 {
    let period = u64::from(interval_ms.max(1)) * 2;
    (u64::from(duration_ms) / period).max(1) as i64
}
