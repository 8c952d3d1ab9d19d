//! Outbound clients: market data feed, multiplier advisory, settlement ledger.
//!
//! Each concern is a trait so the engine can run against the real services
//! or against in-process fakes. The concrete implementations here talk to a
//! CoinMarketCap-compatible quotes API, an OpenAI-compatible chat endpoint,
//! and a simulated devnet ledger.

/// Multiplier advisory client.
pub mod advisory;
/// Settlement ledger client and devnet simulator.
pub mod ledger;
/// Market data feed.
pub mod price_feed;

pub use advisory::{AdvisoryClient, AdvisoryRequest, LlmAdvisory};
pub use ledger::{
    AccountAddress, Confirmation, DevnetLedger, LedgerClient, SigningKey, TransactionId,
    VendPayload,
};
pub use price_feed::{CoinMarketCapFeed, PriceFeed, Quote, RiskRating};
