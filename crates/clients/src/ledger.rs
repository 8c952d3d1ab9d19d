//! Settlement ledger client.
//!
//! Settlement credits the seller in a 6-decimal stable asset. Two paths
//! exist: `mint_to`, where a mint authority issues fresh units, and `vend`,
//! a two-party transfer out of a vendor pool that both the vendor and the
//! buyer must sign. [`DevnetLedger`] simulates both against an in-memory
//! balance book with a configurable confirmation delay and failure
//! injection, which is what the tests and the demo CLI run against.

use async_trait::async_trait;
use hodl_domain::prelude::*;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info};
use zeroize::Zeroizing;

/// On-ledger account address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccountAddress(pub String);

impl AccountAddress {
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hash of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransactionId(pub String);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Signing identity. The secret is wiped from memory on drop and never
/// appears in Debug output or logs.
pub struct SigningKey {
    address: AccountAddress,
    secret: Zeroizing<String>,
}

impl SigningKey {
    #[must_use]
    pub fn new(address: AccountAddress, secret: impl Into<String>) -> Self {
        Self {
            address,
            secret: Zeroizing::new(secret.into()),
        }
    }

    /// Loads a key from an environment variable of the form
    /// `address:secret`.
    ///
    /// # Errors
    /// Returns [`EngineError::ConfigurationMissing`] when the variable is
    /// unset or malformed.
    pub fn from_env(var: &str) -> Result<Self, EngineError> {
        let raw = std::env::var(var)
            .map_err(|_| EngineError::ConfigurationMissing(var.to_string()))?;
        let (address, secret) = raw
            .split_once(':')
            .ok_or_else(|| EngineError::ConfigurationMissing(format!("{var} (address:secret)")))?;
        Ok(Self::new(AccountAddress::new(address), secret))
    }

    #[must_use]
    pub fn address(&self) -> &AccountAddress {
        &self.address
    }

    fn can_sign(&self) -> bool {
        !self.secret.is_empty()
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("address", &self.address)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Final status of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    /// The transaction landed on the ledger.
    Confirmed,
    /// The ledger did not confirm within the allowed window. The
    /// transaction may still land later; callers must not resubmit.
    TimedOut,
    /// The ledger rejected the transaction.
    Failed(String),
}

/// A two-party vend: the buyer hands over tokens, the vendor pays out of
/// its settlement pool. Both parties sign.
#[derive(Debug, Clone)]
pub struct VendPayload {
    pub buyer: AccountAddress,
    pub symbol: String,
    pub quantity: Decimal,
    pub settlement: SettlementAmount,
}

/// Settlement ledger operations.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Mints settlement units to `recipient`, signed by the mint authority.
    async fn mint_to(
        &self,
        authority: &SigningKey,
        recipient: &AccountAddress,
        amount: SettlementAmount,
    ) -> Result<TransactionId, EngineError>;

    /// Submits a vend. Both signers are required; a missing one is
    /// [`EngineError::MissingCosigner`].
    async fn vend(
        &self,
        payload: &VendPayload,
        vendor: Option<&SigningKey>,
        buyer: Option<&SigningKey>,
    ) -> Result<TransactionId, EngineError>;

    /// Waits for a submitted transaction to reach a final status, up to
    /// `timeout`.
    async fn wait_for_confirmation(
        &self,
        tx: &TransactionId,
        timeout: Duration,
    ) -> Result<Confirmation, EngineError>;

    /// Settlement balance of an account, in minor units.
    async fn balance(&self, address: &AccountAddress) -> Result<SettlementAmount, EngineError>;
}

#[derive(Debug, Clone)]
struct PendingTx {
    ready_at: Instant,
    outcome: Confirmation,
}

#[derive(Default)]
struct LedgerBook {
    balances: HashMap<AccountAddress, u64>,
    transactions: HashMap<TransactionId, PendingTx>,
    fail_next: Option<String>,
}

/// In-memory ledger simulator.
pub struct DevnetLedger {
    mint_authority: AccountAddress,
    confirmation_delay: Duration,
    book: Arc<RwLock<LedgerBook>>,
}

impl DevnetLedger {
    #[must_use]
    pub fn new(mint_authority: AccountAddress) -> Self {
        Self {
            mint_authority,
            confirmation_delay: Duration::from_millis(50),
            book: Arc::new(RwLock::new(LedgerBook::default())),
        }
    }

    /// Sets how long a submitted transaction takes to confirm.
    #[must_use]
    pub fn with_confirmation_delay(mut self, delay: Duration) -> Self {
        self.confirmation_delay = delay;
        self
    }

    /// Makes the next submitted transaction fail with `reason`.
    pub async fn fail_next_submission(&self, reason: impl Into<String>) {
        self.book.write().await.fail_next = Some(reason.into());
    }

    /// Credits an account directly, outside any transaction. Used to seed
    /// vendor pools.
    pub async fn credit(&self, address: &AccountAddress, amount: SettlementAmount) {
        let mut book = self.book.write().await;
        *book.balances.entry(address.clone()).or_default() += amount.minor_units;
    }

    fn new_tx_id() -> TransactionId {
        TransactionId(format!("0x{:032x}", rand::random::<u128>()))
    }

    async fn submit(
        &self,
        apply: impl FnOnce(&mut LedgerBook) -> Result<(), EngineError>,
    ) -> Result<TransactionId, EngineError> {
        let mut book = self.book.write().await;
        let tx_id = Self::new_tx_id();
        let ready_at = Instant::now() + self.confirmation_delay;

        let outcome = if let Some(reason) = book.fail_next.take() {
            Confirmation::Failed(reason)
        } else {
            apply(&mut book)?;
            Confirmation::Confirmed
        };

        book.transactions
            .insert(tx_id.clone(), PendingTx { ready_at, outcome });
        Ok(tx_id)
    }
}

#[async_trait]
impl LedgerClient for DevnetLedger {
    async fn mint_to(
        &self,
        authority: &SigningKey,
        recipient: &AccountAddress,
        amount: SettlementAmount,
    ) -> Result<TransactionId, EngineError> {
        if authority.address() != &self.mint_authority || !authority.can_sign() {
            return Err(EngineError::SettlementFailed(
                "signer is not the mint authority".to_string(),
            ));
        }

        let recipient = recipient.clone();
        let tx_id = self
            .submit(move |book| {
                *book.balances.entry(recipient).or_default() += amount.minor_units;
                Ok(())
            })
            .await?;

        info!(tx_id = %tx_id, amount = %amount, "mint submitted");
        Ok(tx_id)
    }

    async fn vend(
        &self,
        payload: &VendPayload,
        vendor: Option<&SigningKey>,
        buyer: Option<&SigningKey>,
    ) -> Result<TransactionId, EngineError> {
        let vendor = vendor
            .filter(|k| k.can_sign())
            .ok_or_else(|| EngineError::MissingCosigner("vendor".to_string()))?;
        let buyer_key = buyer
            .filter(|k| k.can_sign())
            .ok_or_else(|| EngineError::MissingCosigner("buyer".to_string()))?;
        if buyer_key.address() != &payload.buyer {
            return Err(EngineError::MissingCosigner("buyer".to_string()));
        }

        let vendor_address = vendor.address().clone();
        let buyer_address = payload.buyer.clone();
        let amount = payload.settlement;
        let tx_id = self
            .submit(move |book| {
                let pool = book.balances.entry(vendor_address).or_default();
                let Some(remaining) = pool.checked_sub(amount.minor_units) else {
                    return Err(EngineError::SettlementFailed(
                        "vendor pool has insufficient balance".to_string(),
                    ));
                };
                *pool = remaining;
                *book.balances.entry(buyer_address).or_default() += amount.minor_units;
                Ok(())
            })
            .await?;

        info!(
            tx_id = %tx_id,
            symbol = %payload.symbol,
            quantity = %payload.quantity,
            amount = %payload.settlement,
            "vend submitted"
        );
        Ok(tx_id)
    }

    async fn wait_for_confirmation(
        &self,
        tx: &TransactionId,
        timeout: Duration,
    ) -> Result<Confirmation, EngineError> {
        let deadline = Instant::now() + timeout;
        let pending = {
            let book = self.book.read().await;
            book.transactions.get(tx).cloned()
        };
        let Some(pending) = pending else {
            return Err(EngineError::SettlementFailed(format!(
                "unknown transaction {tx}"
            )));
        };

        if pending.ready_at > deadline {
            tokio::time::sleep_until(deadline).await;
            debug!(tx_id = %tx, "confirmation window elapsed");
            return Ok(Confirmation::TimedOut);
        }

        tokio::time::sleep_until(pending.ready_at).await;
        Ok(pending.outcome)
    }

    async fn balance(&self, address: &AccountAddress) -> Result<SettlementAmount, EngineError> {
        let book = self.book.read().await;
        Ok(SettlementAmount::from_minor_units(
            book.balances.get(address).copied().unwrap_or_default(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn authority() -> SigningKey {
        SigningKey::new(AccountAddress::new("0xauthority"), "secret")
    }

    fn ledger() -> DevnetLedger {
        DevnetLedger::new(AccountAddress::new("0xauthority"))
            .with_confirmation_delay(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn mint_credits_recipient_after_confirmation() {
        let ledger = ledger();
        let seller = AccountAddress::new("0xseller");
        let amount = SettlementAmount::from_minor_units(1_000_000);

        let tx = ledger.mint_to(&authority(), &seller, amount).await.unwrap();
        let status = ledger
            .wait_for_confirmation(&tx, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(status, Confirmation::Confirmed);
        assert_eq!(ledger.balance(&seller).await.unwrap(), amount);
    }

    #[tokio::test]
    async fn mint_requires_the_authority_key() {
        let ledger = ledger();
        let rogue = SigningKey::new(AccountAddress::new("0xrogue"), "secret");
        let err = ledger
            .mint_to(
                &rogue,
                &AccountAddress::new("0xseller"),
                SettlementAmount::from_minor_units(1),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::SettlementFailed(_)));
    }

    #[tokio::test]
    async fn vend_needs_both_signers() {
        let ledger = ledger();
        let payload = VendPayload {
            buyer: AccountAddress::new("0xbuyer"),
            symbol: "DOGE".into(),
            quantity: dec!(50),
            settlement: SettlementAmount::from_minor_units(1_000_000),
        };
        let vendor = SigningKey::new(AccountAddress::new("0xvendor"), "vsecret");

        let err = ledger.vend(&payload, Some(&vendor), None).await.unwrap_err();
        assert!(matches!(err, EngineError::MissingCosigner(ref who) if who == "buyer"));

        let err = ledger
            .vend(
                &payload,
                None,
                Some(&SigningKey::new(payload.buyer.clone(), "bsecret")),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::MissingCosigner(ref who) if who == "vendor"));
    }

    #[tokio::test]
    async fn vend_moves_funds_from_pool_to_buyer() {
        let ledger = ledger();
        let vendor_addr = AccountAddress::new("0xvendor");
        let buyer_addr = AccountAddress::new("0xbuyer");
        ledger
            .credit(&vendor_addr, SettlementAmount::from_minor_units(5_000_000))
            .await;

        let payload = VendPayload {
            buyer: buyer_addr.clone(),
            symbol: "DOGE".into(),
            quantity: dec!(50),
            settlement: SettlementAmount::from_minor_units(1_000_000),
        };
        let vendor = SigningKey::new(vendor_addr.clone(), "vsecret");
        let buyer = SigningKey::new(buyer_addr.clone(), "bsecret");

        let tx = ledger
            .vend(&payload, Some(&vendor), Some(&buyer))
            .await
            .unwrap();
        assert_eq!(
            ledger
                .wait_for_confirmation(&tx, Duration::from_secs(1))
                .await
                .unwrap(),
            Confirmation::Confirmed
        );
        assert_eq!(
            ledger.balance(&buyer_addr).await.unwrap().minor_units,
            1_000_000
        );
        assert_eq!(
            ledger.balance(&vendor_addr).await.unwrap().minor_units,
            4_000_000
        );
    }

    #[tokio::test]
    async fn vend_rejects_underfunded_pool() {
        let ledger = ledger();
        let payload = VendPayload {
            buyer: AccountAddress::new("0xbuyer"),
            symbol: "DOGE".into(),
            quantity: dec!(50),
            settlement: SettlementAmount::from_minor_units(1_000_000),
        };
        let vendor = SigningKey::new(AccountAddress::new("0xvendor"), "vsecret");
        let buyer = SigningKey::new(payload.buyer.clone(), "bsecret");

        let err = ledger
            .vend(&payload, Some(&vendor), Some(&buyer))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::SettlementFailed(_)));
    }

    #[tokio::test]
    async fn slow_confirmation_times_out_without_resubmission() {
        let ledger = DevnetLedger::new(AccountAddress::new("0xauthority"))
            .with_confirmation_delay(Duration::from_secs(60));
        let tx = ledger
            .mint_to(
                &authority(),
                &AccountAddress::new("0xseller"),
                SettlementAmount::from_minor_units(1),
            )
            .await
            .unwrap();

        let status = ledger
            .wait_for_confirmation(&tx, Duration::from_millis(5))
            .await
            .unwrap();
        assert_eq!(status, Confirmation::TimedOut);
    }

    #[tokio::test]
    async fn injected_failure_reports_through_confirmation() {
        let ledger = ledger();
        ledger.fail_next_submission("sequence number too old").await;

        let seller = AccountAddress::new("0xseller");
        let tx = ledger
            .mint_to(&authority(), &seller, SettlementAmount::from_minor_units(7))
            .await
            .unwrap();
        let status = ledger
            .wait_for_confirmation(&tx, Duration::from_secs(1))
            .await
            .unwrap();
        assert!(matches!(status, Confirmation::Failed(_)));
        // A failed transaction never credits.
        assert!(ledger.balance(&seller).await.unwrap().is_zero());
    }

    #[test]
    fn signing_key_debug_redacts_secret() {
        let key = SigningKey::new(AccountAddress::new("0xauthority"), "hunter2");
        let rendered = format!("{key:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("redacted"));
    }
}
