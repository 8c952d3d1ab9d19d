//! Trigger monitoring and execution engine.
//!
//! A periodic monitor compares live quotes against per-asset thresholds,
//! detects transitions into a triggered state, and hands them to an
//! execution coordinator that guarantees at most one in-flight settlement
//! per asset. Manual sells enter through the same guard.

/// Runtime configuration.
pub mod config;
/// Execution coordinator and per-symbol guard.
pub mod coordinator;
/// Engine event bus.
pub mod events;
/// Pure trigger evaluation.
pub mod evaluator;
/// Periodic evaluation loop.
pub mod monitor;
/// Strategy command surface.
pub mod service;
/// Settlement execution against the ledger.
pub mod settlement;
/// Threshold derivation from advisory or static multipliers.
pub mod targets;

pub use config::EngineConfig;
pub use coordinator::ExecutionCoordinator;
pub use evaluator::{Evaluation, TransitionEvent, evaluate};
pub use events::{EngineEvent, EventBus, explorer_url};
pub use monitor::{MonitorConfig, TriggerMonitor};
pub use service::{DeployRequest, NewAsset, StrategyPatch, StrategyService, ThresholdPatch};
pub use settlement::{SettlementConfig, SettlementExecutor, SettlementMode};
