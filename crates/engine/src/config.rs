//! Runtime configuration.
//!
//! Everything comes from the environment. Missing optional settings fall
//! back to devnet-friendly defaults; settings a selected operation cannot
//! run without surface as `ConfigurationMissing` at the point of use.

use crate::settlement::SettlementMode;
use hodl_domain::prelude::*;
use std::time::Duration;

const DEFAULT_EVAL_INTERVAL_SECS: u64 = 60;
const DEFAULT_SETTLEMENT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_NETWORK: &str = "devnet";

/// Engine-wide settings.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Evaluation interval for the trigger monitor.
    pub eval_interval: Duration,
    /// Bounded wait for settlement confirmation.
    pub settlement_timeout: Duration,
    /// Ledger network name, used for explorer links.
    pub network: String,
    /// How settlements reach the seller.
    pub settlement_mode: SettlementMode,
    /// Postgres connection string. Absent means the in-memory store.
    pub database_url: Option<String>,
    /// Price feed API key.
    pub feed_api_key: Option<String>,
    /// Advisory API key. Absent disables AI-sourced multipliers.
    pub advisory_api_key: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            eval_interval: Duration::from_secs(DEFAULT_EVAL_INTERVAL_SECS),
            settlement_timeout: Duration::from_secs(DEFAULT_SETTLEMENT_TIMEOUT_SECS),
            network: DEFAULT_NETWORK.to_string(),
            settlement_mode: SettlementMode::AuthorityMint,
            database_url: None,
            feed_api_key: None,
            advisory_api_key: None,
        }
    }
}

impl EngineConfig {
    /// Reads configuration from the environment.
    ///
    /// # Errors
    /// Returns [`EngineError::ConfigurationMissing`] for unparseable values;
    /// absent variables take defaults.
    pub fn from_env() -> Result<Self, EngineError> {
        let mut config = Self::default();

        if let Some(secs) = parse_var::<u64>("HODL_EVAL_INTERVAL_SECS")? {
            config.eval_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64>("HODL_SETTLEMENT_TIMEOUT_SECS")? {
            config.settlement_timeout = Duration::from_secs(secs);
        }
        if let Ok(network) = std::env::var("HODL_NETWORK") {
            config.network = network;
        }
        if let Ok(mode) = std::env::var("HODL_SETTLEMENT_MODE") {
            config.settlement_mode = match mode.as_str() {
                "mint" => SettlementMode::AuthorityMint,
                "vend" => SettlementMode::Vend,
                other => {
                    return Err(EngineError::ConfigurationMissing(format!(
                        "HODL_SETTLEMENT_MODE: unknown mode {other:?} (expected mint or vend)"
                    )));
                }
            };
        }
        config.database_url = std::env::var("DATABASE_URL").ok();
        config.feed_api_key = std::env::var("CMC_API_KEY").ok();
        config.advisory_api_key = std::env::var("ADVISORY_API_KEY").ok();

        Ok(config)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>, EngineError> {
    match std::env::var(name) {
        Ok(raw) => raw.parse::<T>().map(Some).map_err(|_| {
            EngineError::ConfigurationMissing(format!("{name}: unparseable value {raw:?}"))
        }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_devnet() {
        let config = EngineConfig::default();
        assert_eq!(config.eval_interval, Duration::from_secs(60));
        assert_eq!(config.network, "devnet");
        assert_eq!(config.settlement_mode, SettlementMode::AuthorityMint);
        assert!(config.database_url.is_none());
    }
}
