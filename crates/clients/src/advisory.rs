//! Multiplier advisory client.
//!
//! Asks an OpenAI-compatible chat completion endpoint for take-profit and
//! stop-loss multipliers tailored to a token and risk profile. The model
//! must answer with a bare JSON object; anything else is an
//! [`EngineError::InvalidAdvisoryResponse`]. Range validation happens in
//! the domain layer, not here: this client reports what the model said.

use async_trait::async_trait;
use hodl_domain::prelude::*;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

const CHAT_COMPLETIONS_PATH: &str = "/openai/v1/chat/completions";
const DEFAULT_BASE_URL: &str = "https://api.groq.com";
const DEFAULT_MODEL: &str = "openai/gpt-oss-20b";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Context handed to the advisory for one asset.
#[derive(Debug, Clone)]
pub struct AdvisoryRequest {
    pub risk_profile: RiskProfile,
    pub symbol: String,
    pub current_price: Decimal,
    pub market_cap: Decimal,
    pub change_24h: Decimal,
}

/// Source of suggested multipliers.
#[async_trait]
pub trait AdvisoryClient: Send + Sync {
    /// Suggests multipliers for the asset. Fields the model omitted come
    /// back as `None`.
    ///
    /// # Errors
    /// Returns [`EngineError::InvalidAdvisoryResponse`] when the endpoint
    /// answers with something that is not the expected JSON shape, and
    /// [`EngineError::FeedUnavailable`] when it cannot be reached.
    async fn suggest(&self, request: &AdvisoryRequest) -> Result<SuggestedMultipliers, EngineError>;
}

/// Chat-completion backed advisory.
pub struct LlmAdvisory {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl LlmAdvisory {
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

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
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Overrides the model name.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn prompt(request: &AdvisoryRequest) -> String {
        format!(
            "Generate recommended price multipliers for a {} risk cryptocurrency trading strategy.\n\
             \n\
             Token details:\n\
             - Symbol: {}\n\
             - Current Price: {}\n\
             - Market Cap: {}\n\
             - 24h Change: {}%\n\
             \n\
             IMPORTANT RULES:\n\
             - Take profit multiplier must be GREATER than 1.0 (e.g., 1.5, 2.0, 3.0) to sell when price goes UP\n\
             - Stop loss multiplier must be LESS than 1.0 (e.g., 0.85, 0.7, 0.5) to sell when price goes DOWN\n\
             \n\
             Risk level guidelines:\n\
             - Conservative: takeProfit ~1.5-2.0, stopLoss ~0.85-0.90\n\
             - Moderate: takeProfit ~2.0-2.8, stopLoss ~0.65-0.75\n\
             - Aggressive: takeProfit ~3.0-4.0, stopLoss ~0.45-0.55\n\
             \n\
             Return ONLY valid JSON in this exact format, no explanation:\n\
             {{ \"takeProfit\": number, \"stopLoss\": number }}",
            request.risk_profile.as_str(),
            request.symbol,
            request.current_price,
            request.market_cap,
            request.change_24h,
        )
    }

    fn parse_content(content: &str) -> Result<SuggestedMultipliers, EngineError> {
        let parsed: SuggestedPayload = serde_json::from_str(content.trim()).map_err(|e| {
            EngineError::InvalidAdvisoryResponse(format!("not a multiplier object: {e}"))
        })?;
        Ok(SuggestedMultipliers {
            take_profit: parsed.take_profit.and_then(Decimal::from_f64),
            stop_loss: parsed.stop_loss.and_then(Decimal::from_f64),
        })
    }
}

#[async_trait]
impl AdvisoryClient for LlmAdvisory {
    async fn suggest(&self, request: &AdvisoryRequest) -> Result<SuggestedMultipliers, EngineError> {
        let url = format!("{}{}", self.base_url, CHAT_COMPLETIONS_PATH);
        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": Self::prompt(request) }],
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::FeedUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(EngineError::InvalidAdvisoryResponse(format!(
                "advisory endpoint returned {}",
                response.status()
            )));
        }

        let completion: ChatCompletion = response.json().await.map_err(|e| {
            EngineError::InvalidAdvisoryResponse(format!("malformed completion: {e}"))
        })?;
        let content = completion
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| {
                EngineError::InvalidAdvisoryResponse("completion had no choices".to_string())
            })?;

        let suggested = Self::parse_content(content)?;
        debug!(
            symbol = %request.symbol,
            profile = %request.risk_profile.as_str(),
            take_profit = ?suggested.take_profit,
            stop_loss = ?suggested.stop_loss,
            "advisory responded"
        );
        Ok(suggested)
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SuggestedPayload {
    #[serde(default)]
    take_profit: Option<f64>,
    #[serde(default)]
    stop_loss: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parses_well_formed_content() {
        let suggested =
            LlmAdvisory::parse_content(r#"{ "takeProfit": 2.4, "stopLoss": 0.72 }"#).unwrap();
        assert_eq!(suggested.take_profit, Some(dec!(2.4)));
        assert_eq!(suggested.stop_loss, Some(dec!(0.72)));
    }

    #[test]
    fn partial_content_keeps_missing_field_none() {
        let suggested = LlmAdvisory::parse_content(r#"{ "takeProfit": 1.9 }"#).unwrap();
        assert_eq!(suggested.take_profit, Some(dec!(1.9)));
        assert_eq!(suggested.stop_loss, None);
    }

    #[test]
    fn prose_response_is_rejected() {
        let err = LlmAdvisory::parse_content("Sure! I'd suggest a 2x take profit.").unwrap_err();
        assert!(matches!(err, EngineError::InvalidAdvisoryResponse(_)));
    }

    #[test]
    fn out_of_range_values_pass_through_for_domain_validation() {
        // The client does not judge ranges; validated() in the domain does.
        let suggested =
            LlmAdvisory::parse_content(r#"{ "takeProfit": 0.9, "stopLoss": 1.1 }"#).unwrap();
        assert!(suggested.validated().is_empty());
    }
}
