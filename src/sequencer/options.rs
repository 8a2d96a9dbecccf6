//! Sequencer options: the partial configuration accepted by start and change

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

/// Options for [`Sequencer::start`](super::Sequencer::start) and
/// [`SequencerHandle::change`](super::SequencerHandle::change).
///
/// Unset fields fall back to the current program (or the built-in default at
/// start). Empty lists count as unset.
///
/// `resets` has three states: `None` keeps the current reset timeline,
/// `Some(None)` disables it, `Some(Some(list))` replaces it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawOptions")]
pub struct PatternOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub led_target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intervals: Option<Vec<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub durations: Option<Vec<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlapping: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resets: Option<Option<Vec<u32>>>,
}

/// Wire shape: `overlapping` is taken loosely so bad input degrades to false
#[derive(Deserialize)]
struct RawOptions {
    #[serde(default)]
    led_target: Option<String>,
    #[serde(default)]
    intervals: Option<Vec<u32>>,
    #[serde(default)]
    durations: Option<Vec<u32>>,
    #[serde(default)]
    overlapping: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    resets: Option<Option<Vec<u32>>>,
}

/// Distinguishes an explicit `null` from a missing key
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

fn coerce_bool(option: &str, value: Value) -> bool {
    match value {
        Value::Bool(b) => b,
        other => {
            warn!(option, value = %other, "expected a boolean, using false");
            false
        }
    }
}

impl From<RawOptions> for PatternOptions {
    fn from(raw: RawOptions) -> Self {
        Self {
            led_target: raw.led_target,
            intervals: raw.intervals,
            durations: raw.durations,
            overlapping: raw.overlapping.map(|v| coerce_bool("overlapping", v)),
            resets: raw.resets,
        }
    }
}

impl PatternOptions {
    pub fn new() -> Self { Self::default() }

    /// Parse options from JSON, e.g. a config file entry or a control message
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    pub fn with_target(mut self, name: impl Into<String>) -> Self { self.led_target = Some(name.into()); self }
    pub fn with_intervals(mut self, intervals: Vec<u32>) -> Self { self.intervals = Some(intervals); self }
    pub fn with_durations(mut self, durations: Vec<u32>) -> Self { self.durations = Some(durations); self }
    pub fn with_overlapping(mut self, overlapping: bool) -> Self { self.overlapping = Some(overlapping); self }
    pub fn with_resets(mut self, resets: Vec<u32>) -> Self { self.resets = Some(Some(resets)); self }
    pub fn without_resets(mut self) -> Self { self.resets = Some(None); self }
}
