//! HTTP server pieces: the transport adapter that plugs the axum server
//! into the lifecycle coordinator, and the liveness endpoint.

mod adapter;
mod health;

pub use adapter::HttpServerAdapter;
pub use health::{HealthResponse, health_handler, health_router};
