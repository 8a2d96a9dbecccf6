//! Countdown: the on/off alternation driven by blink timers
//!
//! Only the transition into Off consumes a count, so a finite countdown of
//! `n` performs exactly `n` off-writes and always ends with the pin off.
//!
//! ```text
//! times = 2:  On ─► (Off,2) ─► (On,1) ─► (Off,1) ─► stop
//! times = -1: On ─► (Off,-1) ─► (On,-1) ─► (Off,-1) ─► ... until cancelled
//! ```

use crate::core::Bit;

/// Marker for an endless countdown
pub const INFINITE: i64 = -1;

/// Payload of one pending blink timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    pub state: Bit,
    pub interval_ms: u32,
    pub times: i64,
}

/// What a delivered countdown asks the actor to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub write: Bit,
    pub next: Option<Countdown>,
}

impl Countdown {
    /// First timer payload after a blink start has written On
    pub fn after_start(interval_ms: u32, times: i64) -> Self {
        Self { state: Bit::Off, interval_ms, times }
    }

    pub fn step(self) -> Step {
        let Countdown { state, interval_ms, times } = self;

        if times < 0 {
            return Step {
                write: state,
                next: Some(Countdown { state: state.toggled(), interval_ms, times: INFINITE }),
            };
        }
        if times == 0 {
            return Step { write: state, next: None };
        }

        match state {
            Bit::Off => {
                let remaining = times - 1;
                let next = (remaining > 0)
                    .then_some(Countdown { state: Bit::On, interval_ms, times: remaining });
                Step { write: Bit::Off, next }
            }
            Bit::On => Step {
                write: Bit::On,
                next: Some(Countdown { state: Bit::Off, interval_ms, times }),
            },
        }
    }
}
