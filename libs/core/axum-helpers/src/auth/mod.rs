//! Bearer-token authentication boundary.
//!
//! Authentication logic lives outside this workspace; routes only need a
//! [`TokenValidator`] that can turn a bearer credential into a
//! [`Principal`]. The middleware extracts the credential, delegates
//! validation, and inserts the principal into request extensions.

mod middleware;

pub use middleware::bearer_auth_middleware;

use async_trait::async_trait;
use thiserror::Error;

/// The authenticated identity extracted from a valid credential.
#[derive(Debug, Clone)]
pub struct Principal {
    pub subject: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid or expired credential")]
    InvalidToken,

    #[error("auth backend unavailable: {0}")]
    Unavailable(String),
}

/// Boundary to the external auth collaborator.
#[async_trait]
pub trait TokenValidator: Send + Sync {
    async fn validate(&self, token: &str) -> Result<Principal, AuthError>;
}
