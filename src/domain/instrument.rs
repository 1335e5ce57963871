use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier for a tradable security, as supplied by the host platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Instrument(String);

impl Instrument {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Instrument {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for Instrument {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Book side of a strategy position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// Multiplier applied to a side's weight: +1 for longs, -1 for shorts
    pub fn sign(&self) -> f64 {
        match self {
            Side::Long => 1.0,
            Side::Short => -1.0,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => f.write_str("long"),
            Side::Short => f.write_str("short"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instrument_serializes_as_bare_string() {
        let instrument = Instrument::from("AAPL");
        assert_eq!(serde_json::to_string(&instrument).unwrap(), "\"AAPL\"");

        let back: Instrument = serde_json::from_str("\"MSFT\"").unwrap();
        assert_eq!(back.as_str(), "MSFT");
    }

    #[test]
    fn test_side_sign() {
        assert_eq!(Side::Long.sign(), 1.0);
        assert_eq!(Side::Short.sign(), -1.0);
        assert_eq!(Side::Short.to_string(), "short");
    }
}
