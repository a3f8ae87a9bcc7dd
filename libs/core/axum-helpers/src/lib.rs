//! # Axum Helpers
//!
//! Utilities, middleware, and the HTTP transport adapter for building
//! Axum-based services.
//!
//! ## Modules
//!
//! - **[`server`]**: HTTP transport adapter (lifecycle hook), health endpoint
//! - **[`auth`]**: bearer-token authentication boundary
//! - **[`http`]**: CORS layers
//! - **[`errors`]**: structured error responses
//!
//! ## Quick Start
//!
//! ```ignore
//! use axum::Router;
//! use axum_helpers::server::HttpServerAdapter;
//! use core_config::server::ServerConfig;
//! use core_lifecycle::Coordinator;
//! use std::sync::Arc;
//!
//! let router = Router::new(); // Add your routes
//! let config = ServerConfig::default();
//! let adapter = Arc::new(HttpServerAdapter::new("http-server", config.clone(), router));
//!
//! let mut coordinator = Coordinator::new(config.shutdown_timeout);
//! coordinator.register(adapter);
//! // coordinator.run().await
//! ```

pub mod auth;
pub mod errors;
pub mod http;
pub mod server;

// Re-export auth types
pub use auth::{AuthError, Principal, TokenValidator, bearer_auth_middleware};

// Re-export server types
pub use server::{HealthResponse, HttpServerAdapter, health_router};

// Re-export HTTP middleware
pub use http::{create_cors_layer, create_permissive_cors_layer};

// Re-export error types
pub use errors::ErrorResponse;
