//! HTTP transport for Hearth.
//!
//! Thin axum layer mapping REST endpoints onto orchestrator calls and the
//! model-management client. Carries no orchestration logic of its own.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
