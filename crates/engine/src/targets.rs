//! Threshold derivation.
//!
//! Targets are the entry price scaled by a multiplier pair. When a side is
//! AI-sourced the advisory's suggestion is used, but only after range
//! validation; a rejected or unreachable advisory degrades to the static
//! risk-profile table and emits an [`EngineEvent::AdvisoryRejected`] so
//! the degradation is observable.

use crate::events::{EngineEvent, EventBus};
use hodl_clients::{AdvisoryClient, AdvisoryRequest, Quote};
use hodl_domain::prelude::*;
use tracing::warn;

/// Resolves the multiplier pair for one asset.
///
/// Sides not flagged as AI-sourced always come from the static table, even
/// when the advisory answered.
pub async fn resolve_multipliers(
    advisory: Option<&dyn AdvisoryClient>,
    profile: RiskProfile,
    ai_take_profit: bool,
    ai_stop_loss: bool,
    quote: &Quote,
    events: &EventBus,
) -> StaticMultipliers {
    let table = profile.static_multipliers();
    if !(ai_take_profit || ai_stop_loss) {
        return table;
    }
    let Some(advisory) = advisory else {
        warn!(symbol = %quote.symbol, "AI thresholds requested but no advisory configured");
        return table;
    };

    let request = AdvisoryRequest {
        risk_profile: profile,
        symbol: quote.symbol.clone(),
        current_price: quote.price.value,
        market_cap: quote.market_cap,
        change_24h: quote.change_24h,
    };
    let validated = match advisory.suggest(&request).await {
        Ok(suggested) => {
            let validated = suggested.validated();
            if validated.is_empty() {
                events.emit(EngineEvent::AdvisoryRejected {
                    strategy_id: None,
                    symbol: quote.symbol.clone(),
                    detail: format!("out-of-range multipliers {suggested:?}"),
                });
            }
            validated
        }
        Err(err) => {
            warn!(symbol = %quote.symbol, error = %err, "advisory unavailable, using static table");
            events.emit(EngineEvent::AdvisoryRejected {
                strategy_id: None,
                symbol: quote.symbol.clone(),
                detail: err.to_string(),
            });
            ValidatedMultipliers::default()
        }
    };

    let resolved = validated.or_static(table);
    StaticMultipliers {
        take_profit: if ai_take_profit {
            resolved.take_profit
        } else {
            table.take_profit
        },
        stop_loss: if ai_stop_loss {
            resolved.stop_loss
        } else {
            table.stop_loss
        },
    }
}

/// Derives both sell targets from an entry price and a multiplier pair.
#[must_use]
pub fn thresholds_from(entry_price: Price, multipliers: StaticMultipliers) -> Thresholds {
    Thresholds::new(
        Some(entry_price.scaled(multipliers.take_profit)),
        Some(entry_price.scaled(multipliers.stop_loss)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use hodl_clients::RiskRating;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    struct FixedAdvisory(SuggestedMultipliers);

    #[async_trait]
    impl AdvisoryClient for FixedAdvisory {
        async fn suggest(
            &self,
            _request: &AdvisoryRequest,
        ) -> Result<SuggestedMultipliers, EngineError> {
            Ok(self.0)
        }
    }

    struct BrokenAdvisory;

    #[async_trait]
    impl AdvisoryClient for BrokenAdvisory {
        async fn suggest(
            &self,
            _request: &AdvisoryRequest,
        ) -> Result<SuggestedMultipliers, EngineError> {
            Err(EngineError::InvalidAdvisoryResponse("not json".into()))
        }
    }

    fn quote(price: Decimal) -> Quote {
        Quote {
            symbol: "DOGE".into(),
            name: "Dogecoin".into(),
            price: Price::new(price),
            change_24h: dec!(-3),
            market_cap: dec!(9_000_000_000),
            volume_24h: dec!(400_000_000),
            as_of: Utc::now(),
            risk: RiskRating::Low,
        }
    }

    #[tokio::test]
    async fn static_only_when_ai_disabled() {
        let advisory = FixedAdvisory(SuggestedMultipliers {
            take_profit: Some(dec!(9.9)),
            stop_loss: Some(dec!(0.01)),
        });
        let m = resolve_multipliers(
            Some(&advisory),
            RiskProfile::Moderate,
            false,
            false,
            &quote(dec!(10)),
            &EventBus::new(),
        )
        .await;
        assert_eq!(m.take_profit, dec!(2.5));
        assert_eq!(m.stop_loss, dec!(0.70));
    }

    #[tokio::test]
    async fn inverted_advisory_falls_back_entirely() {
        // takeProfit 0.9 / stopLoss 1.1 violates both range rules.
        let advisory = FixedAdvisory(SuggestedMultipliers {
            take_profit: Some(dec!(0.9)),
            stop_loss: Some(dec!(1.1)),
        });
        let m = resolve_multipliers(
            Some(&advisory),
            RiskProfile::Aggressive,
            true,
            true,
            &quote(dec!(10)),
            &EventBus::new(),
        )
        .await;
        assert_eq!(m.take_profit, dec!(3.5));
        assert_eq!(m.stop_loss, dec!(0.50));
    }

    #[tokio::test]
    async fn ai_side_uses_valid_suggestion_other_side_stays_static() {
        let advisory = FixedAdvisory(SuggestedMultipliers {
            take_profit: Some(dec!(2.2)),
            stop_loss: Some(dec!(0.6)),
        });
        let m = resolve_multipliers(
            Some(&advisory),
            RiskProfile::Conservative,
            true,
            false,
            &quote(dec!(10)),
            &EventBus::new(),
        )
        .await;
        assert_eq!(m.take_profit, dec!(2.2));
        assert_eq!(m.stop_loss, dec!(0.85));
    }

    #[tokio::test]
    async fn broken_advisory_degrades_and_emits() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let m = resolve_multipliers(
            Some(&BrokenAdvisory),
            RiskProfile::Moderate,
            true,
            true,
            &quote(dec!(10)),
            &bus,
        )
        .await;
        assert_eq!(m.take_profit, dec!(2.5));
        assert!(matches!(
            rx.try_recv().unwrap(),
            EngineEvent::AdvisoryRejected { .. }
        ));
    }

    #[test]
    fn targets_scale_the_entry_price() {
        let thresholds = thresholds_from(
            Price::new(dec!(0.062)),
            RiskProfile::Moderate.static_multipliers(),
        );
        assert_eq!(thresholds.take_profit, Some(Price::new(dec!(0.155))));
        assert_eq!(thresholds.stop_loss, Some(Price::new(dec!(0.0434))));
    }
}
