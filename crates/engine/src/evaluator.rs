//! Pure trigger evaluation.
//!
//! Evaluation is a function from (previous status, fresh quote, thresholds,
//! toggles) to (new status, transition events). It performs no I/O and
//! holds no state; edge detection lives entirely in the comparison between
//! the previous and the new hit flags.

use chrono::{DateTime, Utc};
use hodl_domain::prelude::*;

/// A threshold crossing detected between two consecutive observations.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionEvent {
    pub symbol: String,
    pub reason: TriggerReason,
    pub price: Price,
}

/// Result of one evaluation step for one asset.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub status: AssetStatus,
    pub transitions: Vec<TransitionEvent>,
}

/// Evaluates a fresh quote against an asset's thresholds.
///
/// Hit flags are level-based: `take_profit_hit` whenever the price is at or
/// above the target, `stop_loss_hit` whenever it is at or below. Transition
/// events are edge-based: a side fires only when its flag goes false to
/// true between two observations. No event fires on the very first quote
/// (there is no baseline to edge from), and none fires while an execution
/// is in flight or already completed.
///
/// A `Failed` execution is the one exception to pure edge detection: a
/// side whose condition still holds fires again on the next observation,
/// so a transient ledger failure is retried cycle by cycle until the
/// price leaves the trigger zone or the settlement lands.
///
/// Contradictory thresholds can raise both flags in the same step; both
/// events are surfaced and the coordinator's guard lets only one proceed.
#[must_use]
pub fn evaluate(
    previous: &AssetStatus,
    symbol: &str,
    price: Price,
    observed_at: DateTime<Utc>,
    thresholds: &Thresholds,
    toggles: TriggerToggles,
) -> Evaluation {
    let take_profit_hit = toggles.take_profit
        && thresholds.take_profit.is_some_and(|target| price >= target);
    let stop_loss_hit =
        toggles.stop_loss && thresholds.stop_loss.is_some_and(|target| price <= target);

    let mut status = previous.clone();
    status.last_price = Some(price);
    status.observed_at = Some(observed_at);
    status.take_profit_hit = take_profit_hit;
    status.stop_loss_hit = stop_loss_hit;

    let mut transitions = Vec::new();
    if previous.has_observation() && previous.execution.can_begin_execution() {
        let retry_failed = previous.execution == ExecutionState::Failed;
        if take_profit_hit && (!previous.take_profit_hit || retry_failed) {
            transitions.push(TransitionEvent {
                symbol: symbol.to_string(),
                reason: TriggerReason::TakeProfit,
                price,
            });
        }
        if stop_loss_hit && (!previous.stop_loss_hit || retry_failed) {
            transitions.push(TransitionEvent {
                symbol: symbol.to_string(),
                reason: TriggerReason::StopLoss,
                price,
            });
        }
    }

    Evaluation {
        status,
        transitions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn price(value: Decimal) -> Price {
        Price::new(value)
    }

    fn run_sequence(
        prices: &[Decimal],
        thresholds: Thresholds,
        toggles: TriggerToggles,
    ) -> (AssetStatus, Vec<TransitionEvent>) {
        let mut status = AssetStatus::default();
        let mut all = Vec::new();
        for p in prices {
            let eval = evaluate(&status, "DOGE", price(*p), Utc::now(), &thresholds, toggles);
            status = eval.status;
            all.extend(eval.transitions);
        }
        (status, all)
    }

    #[test]
    fn stop_loss_fires_exactly_once_on_first_crossing() {
        // 10, 10, 9, 11 against a 9.5 stop: one event, at the 10 -> 9 step.
        let thresholds = Thresholds::new(None, Some(price(dec!(9.5))));
        let (_, events) = run_sequence(
            &[dec!(10), dec!(10), dec!(9), dec!(11)],
            thresholds,
            TriggerToggles::default(),
        );
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].reason, TriggerReason::StopLoss);
        assert_eq!(events[0].price, price(dec!(9)));
    }

    #[test]
    fn no_transition_on_first_quote() {
        // First quote already below the stop: flag set, no event.
        let thresholds = Thresholds::new(None, Some(price(dec!(9.5))));
        let eval = evaluate(
            &AssetStatus::default(),
            "DOGE",
            price(dec!(9)),
            Utc::now(),
            &thresholds,
            TriggerToggles::default(),
        );
        assert!(eval.status.stop_loss_hit);
        assert!(eval.transitions.is_empty());
    }

    #[test]
    fn holding_above_threshold_does_not_refire() {
        let thresholds = Thresholds::new(Some(price(dec!(10))), None);
        let (status, events) = run_sequence(
            &[dec!(9), dec!(11), dec!(12), dec!(13)],
            thresholds,
            TriggerToggles::default(),
        );
        assert!(status.take_profit_hit);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].price, price(dec!(11)));
    }

    #[test]
    fn leaving_and_reentering_fires_again() {
        let thresholds = Thresholds::new(None, Some(price(dec!(9.5))));
        let (_, events) = run_sequence(
            &[dec!(10), dec!(9), dec!(11), dec!(9)],
            thresholds,
            TriggerToggles::default(),
        );
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn contradictory_thresholds_surface_both_events() {
        // take_profit 9 < stop_loss 11 and a price of 10 hits both sides.
        let thresholds = Thresholds::new(Some(price(dec!(9))), Some(price(dec!(11))));
        let baseline = evaluate(
            &AssetStatus::default(),
            "DOGE",
            price(dec!(20)),
            Utc::now(),
            &Thresholds::default(),
            TriggerToggles::default(),
        )
        .status;

        let eval = evaluate(
            &baseline,
            "DOGE",
            price(dec!(10)),
            Utc::now(),
            &thresholds,
            TriggerToggles::default(),
        );
        assert!(eval.status.take_profit_hit);
        assert!(eval.status.stop_loss_hit);
        assert_eq!(eval.transitions.len(), 2);
    }

    #[test]
    fn disabled_side_never_sets_its_flag() {
        let thresholds = Thresholds::new(Some(price(dec!(10))), Some(price(dec!(9.5))));
        let toggles = TriggerToggles {
            take_profit: false,
            stop_loss: true,
        };
        let (status, events) = run_sequence(&[dec!(5), dec!(15)], thresholds, toggles);
        assert!(!status.take_profit_hit);
        assert!(events.is_empty());
    }

    #[test]
    fn no_event_while_execution_in_flight_or_done() {
        let thresholds = Thresholds::new(None, Some(price(dec!(9.5))));
        for state in [ExecutionState::Executing, ExecutionState::Executed] {
            let mut previous = AssetStatus {
                last_price: Some(price(dec!(10))),
                observed_at: Some(Utc::now()),
                ..AssetStatus::default()
            };
            previous.execution = state;

            let eval = evaluate(
                &previous,
                "DOGE",
                price(dec!(9)),
                Utc::now(),
                &thresholds,
                TriggerToggles::default(),
            );
            assert!(eval.transitions.is_empty(), "state {state:?} must not fire");
        }
    }

    #[test]
    fn failed_execution_refires_on_next_crossing() {
        let thresholds = Thresholds::new(None, Some(price(dec!(9.5))));
        // Previously hit and failed, price recovered, then crosses again.
        let previous = AssetStatus {
            last_price: Some(price(dec!(11))),
            observed_at: Some(Utc::now()),
            stop_loss_hit: false,
            execution: ExecutionState::Failed,
            failure_reason: Some("ledger unreachable".into()),
            ..AssetStatus::default()
        };

        let eval = evaluate(
            &previous,
            "DOGE",
            price(dec!(9)),
            Utc::now(),
            &thresholds,
            TriggerToggles::default(),
        );
        assert_eq!(eval.transitions.len(), 1);
    }

    #[test]
    fn failed_execution_retries_while_condition_still_holds() {
        // The flag is already set, so there is no fresh edge, but the
        // failed state makes the held condition fire again.
        let thresholds = Thresholds::new(None, Some(price(dec!(9.5))));
        let previous = AssetStatus {
            last_price: Some(price(dec!(9))),
            observed_at: Some(Utc::now()),
            stop_loss_hit: true,
            execution: ExecutionState::Failed,
            failure_reason: Some("sequence number too old".into()),
            ..AssetStatus::default()
        };

        let eval = evaluate(
            &previous,
            "DOGE",
            price(dec!(9)),
            Utc::now(),
            &thresholds,
            TriggerToggles::default(),
        );
        assert_eq!(eval.transitions.len(), 1);
        assert_eq!(eval.transitions[0].reason, TriggerReason::StopLoss);

        // Once the price recovers past the stop, the retry stops too.
        let recovered = evaluate(
            &previous,
            "DOGE",
            price(dec!(11)),
            Utc::now(),
            &thresholds,
            TriggerToggles::default(),
        );
        assert!(recovered.transitions.is_empty());
    }
}
