//! Bit: the two states of a binary actuator

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Requested state fell outside `{0, 1}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid actuator state {0}, expected 0 or 1")]
pub struct InvalidBit(pub u8);

/// On/off state of an LED or relay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Bit {
    #[default]
    Off,
    On,
}

impl Bit {
    pub fn as_u8(self) -> u8 {
        match self {
            Bit::Off => 0,
            Bit::On => 1,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Bit::Off => Bit::On,
            Bit::On => Bit::Off,
        }
    }

    pub fn is_on(self) -> bool { self == Bit::On }
}

impl TryFrom<u8> for Bit {
    type Error = InvalidBit;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Bit::Off),
            1 => Ok(Bit::On),
            other => Err(InvalidBit(other)),
        }
    }
}

impl From<bool> for Bit {
    fn from(on: bool) -> Self { if on { Bit::On } else { Bit::Off } }
}

impl fmt::Display for Bit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

impl Serialize for Bit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for Bit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = u8::deserialize(deserializer)?;
        Bit::try_from(raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_from_raw_values() {
        assert_eq!(Bit::try_from(0), Ok(Bit::Off));
        assert_eq!(Bit::try_from(1), Ok(Bit::On));
        assert_eq!(Bit::try_from(2), Err(InvalidBit(2)));
    }

    #[test]
    fn toggles() {
        assert_eq!(Bit::Off.toggled(), Bit::On);
        assert_eq!(Bit::On.toggled().toggled(), Bit::On);
    }

    #[test]
    fn serializes_as_number() {
        assert_eq!(serde_json::to_string(&Bit::On).unwrap(), "1");
        let bit: Bit = serde_json::from_str("0").unwrap();
        assert_eq!(bit, Bit::Off);
        assert!(serde_json::from_str::<Bit>("7").is_err());
    }
}
