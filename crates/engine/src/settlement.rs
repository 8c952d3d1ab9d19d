//! Settlement execution against the ledger.
//!
//! Converts a sold quantity into settlement-asset minor units (floored,
//! never rounded up) and moves them to the owner, either by authority mint
//! or by a two-party vend out of the vendor pool. The executor waits a
//! bounded time for confirmation and never resubmits on its own: an
//! unconfirmed submission may still land, and resubmitting would risk
//! paying twice.

use hodl_clients::{AccountAddress, Confirmation, LedgerClient, SigningKey, VendPayload};
use hodl_domain::prelude::*;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// How settlement funds reach the seller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SettlementMode {
    /// The vendor key mints settlement units directly to the seller.
    /// Unbounded; suited to devnet economies.
    #[default]
    AuthorityMint,
    /// Two-party exchange out of the vendor's pool. Bounded by pool
    /// inventory; both the vendor and the seller sign.
    Vend,
}

/// Executor configuration.
pub struct SettlementConfig {
    pub mode: SettlementMode,
    /// Vendor key: mint authority in mint mode, pool co-signer in vend mode.
    pub vendor_key: Option<SigningKey>,
    /// Seller co-signature for vend mode.
    pub seller_key: Option<SigningKey>,
    /// Bounded confirmation wait.
    pub confirmation_timeout: Duration,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            mode: SettlementMode::AuthorityMint,
            vendor_key: None,
            seller_key: None,
            confirmation_timeout: Duration::from_secs(30),
        }
    }
}

/// Performs the on-ledger side of an execution.
pub struct SettlementExecutor {
    ledger: Arc<dyn LedgerClient>,
    config: SettlementConfig,
}

impl SettlementExecutor {
    #[must_use]
    pub fn new(ledger: Arc<dyn LedgerClient>, config: SettlementConfig) -> Self {
        Self { ledger, config }
    }

    /// Sells `quantity` of `symbol` at `price` and credits the owner.
    ///
    /// Atomic from the caller's point of view: returns the confirmed
    /// transaction id and amount, or an error with no implied ledger state.
    ///
    /// # Errors
    /// - [`EngineError::InvalidRequest`] when the trade value cannot be
    ///   represented in settlement minor units.
    /// - [`EngineError::ConfigurationMissing`] when no vendor key is set.
    /// - [`EngineError::MissingCosigner`] in vend mode without both keys.
    /// - [`EngineError::SettlementTimeout`] when confirmation does not
    ///   arrive in time; the caller must treat the attempt as failed and
    ///   must not resubmit blindly.
    /// - [`EngineError::SettlementFailed`] for ledger rejections.
    pub async fn execute(
        &self,
        owner: &AccountAddress,
        symbol: &str,
        quantity: Decimal,
        price: Price,
    ) -> Result<(String, SettlementAmount), EngineError> {
        let amount = SettlementAmount::from_trade(quantity, price.value)?;
        if amount.is_zero() {
            // Dust position: nothing to credit, but the sale still counts.
            warn!(symbol = %symbol, quantity = %quantity, price = %price, "settlement amount floors to zero");
        }

        let vendor = self
            .config
            .vendor_key
            .as_ref()
            .ok_or_else(|| EngineError::ConfigurationMissing("vendor signing key".to_string()))?;

        let tx_id = match self.config.mode {
            SettlementMode::AuthorityMint => self.ledger.mint_to(vendor, owner, amount).await?,
            SettlementMode::Vend => {
                let payload = VendPayload {
                    buyer: owner.clone(),
                    symbol: symbol.to_string(),
                    quantity,
                    settlement: amount,
                };
                self.ledger
                    .vend(&payload, Some(vendor), self.config.seller_key.as_ref())
                    .await?
            }
        };

        match self
            .ledger
            .wait_for_confirmation(&tx_id, self.config.confirmation_timeout)
            .await?
        {
            Confirmation::Confirmed => {
                info!(symbol = %symbol, tx_id = %tx_id, amount = %amount, "settlement confirmed");
                Ok((tx_id.0, amount))
            }
            Confirmation::TimedOut => Err(EngineError::SettlementTimeout { tx_id: tx_id.0 }),
            Confirmation::Failed(reason) => Err(EngineError::SettlementFailed(reason)),
        }
    }
}
