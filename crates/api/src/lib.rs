//! REST API for the trigger engine.
//!
//! Endpoints cover the full command surface: deploy, edit and delete
//! strategies, manual sells, quotes, and per-asset execution history.
//! The API is a thin shell over [`hodl_engine::StrategyService`]; all
//! correctness guarantees live in the engine.

/// Error responses.
pub mod error;
/// Request and response models.
pub mod models;
/// Route definitions and handlers.
pub mod routes;
/// Server configuration and startup.
pub mod server;
/// Application state.
pub mod state;

pub use error::ApiError;
pub use server::{ApiServer, ServerConfig};
pub use state::AppState;
