use crate::error::EngineError;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed decimal precision of the settlement asset (USDC).
pub const SETTLEMENT_DECIMALS: u32 = 6;

/// An amount of the settlement asset, held in minor units (10^-6).
///
/// Conversion from a trade always truncates toward zero; the vendor must
/// never mint more than `quantity * price` is worth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SettlementAmount {
    pub minor_units: u64,
}

impl SettlementAmount {
    #[must_use]
    pub fn from_minor_units(minor_units: u64) -> Self {
        Self { minor_units }
    }

    /// Computes the settlement amount for selling `quantity` units at
    /// `price`, floored to minor units.
    ///
    /// # Errors
    /// Returns [`EngineError::InvalidRequest`] when the trade value is
    /// negative or does not fit in minor units; a value like that must
    /// never silently settle as zero.
    pub fn from_trade(quantity: Decimal, price: Decimal) -> Result<Self, EngineError> {
        let scale = Decimal::from(10u64.pow(SETTLEMENT_DECIMALS));
        let minor_units = quantity
            .checked_mul(price)
            .and_then(|value| value.checked_mul(scale))
            .and_then(|scaled| scaled.floor().to_u64())
            .ok_or_else(|| {
                EngineError::InvalidRequest(format!(
                    "trade value {quantity} x {price} is outside the settleable range"
                ))
            })?;
        Ok(Self { minor_units })
    }

    /// Human-readable settlement units.
    #[must_use]
    pub fn to_decimal(&self) -> Decimal {
        Decimal::from(self.minor_units) / Decimal::from(10u64.pow(SETTLEMENT_DECIMALS))
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.minor_units == 0
    }
}

impl fmt::Display for SettlementAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}
