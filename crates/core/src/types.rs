//! Market types shared across the workspace.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Broker-assigned identifier of a tradable instrument.
///
/// Dhan security ids are numeric but the scrip master delivers them as
/// strings, and they are only ever echoed back to the API, so the string
/// form is kept as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecurityId(pub String);

impl SecurityId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SecurityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for SecurityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Option right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptionRight {
    Call,
    Put,
}

impl OptionRight {
    /// Suffix used in exchange trading symbols.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Call => "CE",
            Self::Put => "PE",
        }
    }
}

impl std::fmt::Display for OptionRight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.suffix())
    }
}

/// Direction of a leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => f.write_str("BUY"),
            Self::Sell => f.write_str("SELL"),
        }
    }
}

/// Last traded price as reported by the data feed.
///
/// The feed signals failures in-band, so "no price" is a value here rather
/// than an error. Callers decide per call site whether an unavailable quote
/// is skipped, substituted with zero, or fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quote {
    Known(Decimal),
    Unavailable,
}

impl Quote {
    /// The price, if the feed had one.
    #[must_use]
    pub const fn price(self) -> Option<Decimal> {
        match self {
            Self::Known(price) => Some(price),
            Self::Unavailable => None,
        }
    }
}
