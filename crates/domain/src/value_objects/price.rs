use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Price of one unit of an asset, in the quote currency.
///
/// Comparisons use the feed's reported value without rounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Price {
    pub value: Decimal,
}

impl Price {
    #[must_use]
    pub fn new(value: Decimal) -> Self {
        Self { value }
    }

    /// Scales the price by a multiplier, e.g. to derive a sell target.
    #[must_use]
    pub fn scaled(&self, multiplier: Decimal) -> Self {
        Self {
            value: self.value * multiplier,
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl From<Decimal> for Price {
    fn from(value: Decimal) -> Self {
        Self { value }
    }
}
