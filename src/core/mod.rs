//! Shared value types used by every layer

pub mod bit;

pub use bit::{Bit, InvalidBit};
