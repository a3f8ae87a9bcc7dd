//! Shared application state passed to request handlers.

use crate::collaborators::{AuthService, UserService, WsSessionHandler};
use axum_helpers::TokenValidator;
use std::sync::Arc;

/// Cloned per handler; only `Arc` pointer clones.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded from environment variables
    pub config: Arc<crate::config::Config>,
    /// External auth collaborator (login/logout)
    pub auth: Arc<dyn AuthService>,
    /// Credential validation boundary used by the bearer middleware
    pub validator: Arc<dyn TokenValidator>,
    /// External user collaborator
    pub users: Arc<dyn UserService>,
    /// Owns upgraded WebSocket connections
    pub ws: Arc<dyn WsSessionHandler>,
}
