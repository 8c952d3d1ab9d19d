//! Application state shared across handlers.

use hodl_engine::{EventBus, StrategyService};
use std::sync::Arc;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    /// Strategy command surface.
    pub service: Arc<StrategyService>,
    /// Engine event stream, for push consumers.
    pub events: EventBus,
    /// Ledger network name, used to build explorer links.
    pub network: String,
}

impl AppState {
    #[must_use]
    pub fn new(service: Arc<StrategyService>, events: EventBus, network: impl Into<String>) -> Self {
        Self {
            service,
            events,
            network: network.into(),
        }
    }
}
