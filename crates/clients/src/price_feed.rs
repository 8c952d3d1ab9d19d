//! Market data feed.
//!
//! Quotes come from a CoinMarketCap-compatible `quotes/latest` endpoint.
//! The feed is tolerant of partial responses: symbols the provider does not
//! know are simply absent from the returned map, and the caller decides what
//! a missing symbol means for its own bookkeeping.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hodl_domain::prelude::*;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

const QUOTES_PATH: &str = "/v1/cryptocurrency/quotes/latest";
const DEFAULT_BASE_URL: &str = "https://pro-api.coinmarketcap.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A point-in-time market observation for one symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub symbol: String,
    pub name: String,
    pub price: Price,
    pub change_24h: Decimal,
    pub market_cap: Decimal,
    pub volume_24h: Decimal,
    pub as_of: DateTime<Utc>,
    pub risk: RiskRating,
}

/// Coarse risk label derived from volatility, liquidity and market cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskRating {
    Low,
    Moderate,
    High,
}

impl RiskRating {
    /// Scores a token from its 24h volatility, volume-to-market-cap ratio
    /// and absolute market cap. Each dimension contributes up to 3 points;
    /// 7+ is high risk, 4+ moderate.
    #[must_use]
    pub fn classify(change_24h: Decimal, volume_24h: Decimal, market_cap: Decimal) -> Self {
        let mut score = 0u8;

        let volatility = change_24h.abs();
        if volatility > Decimal::from(20) {
            score += 3;
        } else if volatility > Decimal::from(10) {
            score += 2;
        } else if volatility > Decimal::from(5) {
            score += 1;
        }

        if market_cap > Decimal::ZERO {
            let liquidity_ratio = volume_24h / market_cap;
            if liquidity_ratio < Decimal::new(1, 2) {
                score += 3;
            } else if liquidity_ratio < Decimal::new(5, 2) {
                score += 2;
            } else if liquidity_ratio < Decimal::new(1, 1) {
                score += 1;
            }
        } else {
            // No market cap data reads as illiquid.
            score += 3;
        }

        if market_cap < Decimal::from(10_000_000) {
            score += 3;
        } else if market_cap < Decimal::from(100_000_000) {
            score += 2;
        } else if market_cap < Decimal::from(1_000_000_000) {
            score += 1;
        }

        if score >= 7 {
            RiskRating::High
        } else if score >= 4 {
            RiskRating::Moderate
        } else {
            RiskRating::Low
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskRating::Low => "LOW",
            RiskRating::Moderate => "MODERATE",
            RiskRating::High => "HIGH",
        }
    }
}

/// Source of market quotes.
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Fetches quotes for the given symbols in one round trip.
    ///
    /// Unknown symbols are omitted from the result rather than failing the
    /// whole batch.
    ///
    /// # Errors
    /// Returns [`EngineError::FeedUnavailable`] when the provider cannot be
    /// reached or returns an unusable payload.
    async fn quotes(&self, symbols: &[String]) -> Result<HashMap<String, Quote>, EngineError>;
}

/// CoinMarketCap Pro API client.
pub struct CoinMarketCapFeed {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    convert: String,
}

impl CoinMarketCapFeed {
    /// Builds a feed against the public Pro API.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Builds a feed against an alternate host (sandbox, test server).
    #[must_use]
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            convert: "USD".to_string(),
        }
    }

    /// Overrides the conversion currency (default USD).
    #[must_use]
    pub fn with_convert(mut self, convert: impl Into<String>) -> Self {
        self.convert = convert.into();
        self
    }
}

#[async_trait]
impl PriceFeed for CoinMarketCapFeed {
    async fn quotes(&self, symbols: &[String]) -> Result<HashMap<String, Quote>, EngineError> {
        if symbols.is_empty() {
            return Ok(HashMap::new());
        }

        let url = format!("{}{}", self.base_url, QUOTES_PATH);
        let response = self
            .client
            .get(&url)
            .header("X-CMC_PRO_API_KEY", &self.api_key)
            .query(&[("symbol", symbols.join(",")), ("convert", self.convert.clone())])
            .send()
            .await
            .map_err(|e| EngineError::FeedUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(EngineError::FeedUnavailable(format!(
                "quotes endpoint returned {}",
                response.status()
            )));
        }

        let body: QuotesResponse = response
            .json()
            .await
            .map_err(|e| EngineError::FeedUnavailable(e.to_string()))?;

        let mut quotes = HashMap::with_capacity(body.data.len());
        for (symbol, entry) in body.data {
            let Some(quote) = entry.quote.get(&self.convert) else {
                warn!(symbol = %symbol, convert = %self.convert, "quote missing conversion");
                continue;
            };
            let Some(price) = Decimal::from_f64(quote.price).filter(|p| *p > Decimal::ZERO)
            else {
                warn!(symbol = %symbol, price = quote.price, "unusable price, skipping");
                continue;
            };

            let change_24h = quote
                .percent_change_24h
                .and_then(Decimal::from_f64)
                .unwrap_or_default();
            let market_cap = quote
                .market_cap
                .and_then(Decimal::from_f64)
                .unwrap_or_default();
            let volume_24h = quote
                .volume_24h
                .and_then(Decimal::from_f64)
                .unwrap_or_default();

            quotes.insert(
                symbol.clone(),
                Quote {
                    symbol: entry.symbol,
                    name: entry.name,
                    price: Price::new(price),
                    change_24h,
                    market_cap,
                    volume_24h,
                    as_of: entry.last_updated.unwrap_or_else(Utc::now),
                    risk: RiskRating::classify(change_24h, volume_24h, market_cap),
                },
            );
        }

        debug!(requested = symbols.len(), received = quotes.len(), "fetched quotes");
        Ok(quotes)
    }
}

#[derive(Debug, Deserialize)]
struct QuotesResponse {
    data: HashMap<String, CoinEntry>,
}

#[derive(Debug, Deserialize)]
struct CoinEntry {
    name: String,
    symbol: String,
    #[serde(default)]
    last_updated: Option<DateTime<Utc>>,
    quote: HashMap<String, QuoteEntry>,
}

#[derive(Debug, Deserialize)]
struct QuoteEntry {
    price: f64,
    #[serde(default)]
    percent_change_24h: Option<f64>,
    #[serde(default)]
    market_cap: Option<f64>,
    #[serde(default)]
    volume_24h: Option<f64>,
}
