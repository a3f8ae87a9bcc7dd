//! External-collaborator boundaries.
//!
//! Auth, user handling, and the WebSocket session protocol are business
//! plugins: the gateway only invokes them through these traits. The stub
//! implementations below are template placeholders — swap them for real
//! services without touching the wiring.

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use axum_helpers::{AuthError, Principal, TokenValidator};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct Session {
    pub token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

/// Login/logout boundary. Token validation goes through
/// [`TokenValidator`] so the auth middleware stays decoupled from the
/// session API.
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn login(&self, credentials: Credentials) -> Result<Session, AuthError>;
    async fn logout(&self, principal: &Principal) -> Result<(), AuthError>;
}

/// User CRUD boundary.
#[async_trait]
pub trait UserService: Send + Sync {
    async fn create(&self, user: NewUser) -> User;
    async fn list(&self) -> Vec<User>;
}

/// Owns an upgraded WebSocket connection; the message protocol is
/// entirely the collaborator's concern.
#[async_trait]
pub trait WsSessionHandler: Send + Sync {
    async fn handle(&self, socket: WebSocket);
}

/// In-memory auth stub: accepts any credentials, tracks issued tokens.
#[derive(Default)]
pub struct StubAuthService {
    issued: RwLock<HashSet<String>>,
}

impl StubAuthService {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuthService for StubAuthService {
    async fn login(&self, credentials: Credentials) -> Result<Session, AuthError> {
        let token = format!("{}:{}", credentials.username, Uuid::new_v4());
        self.issued.write().unwrap().insert(token.clone());
        debug!(user = %credentials.username, "Issued session token");
        Ok(Session { token })
    }

    async fn logout(&self, principal: &Principal) -> Result<(), AuthError> {
        let mut issued = self.issued.write().unwrap();
        issued.retain(|token| {
            token
                .split_once(':')
                .is_none_or(|(user, _)| user != principal.subject)
        });
        Ok(())
    }
}

#[async_trait]
impl TokenValidator for StubAuthService {
    async fn validate(&self, token: &str) -> Result<Principal, AuthError> {
        if !self.issued.read().unwrap().contains(token) {
            return Err(AuthError::InvalidToken);
        }
        let subject = token
            .split_once(':')
            .map(|(user, _)| user.to_string())
            .ok_or(AuthError::InvalidToken)?;
        Ok(Principal { subject })
    }
}

/// In-memory user stub.
#[derive(Default)]
pub struct StubUserService {
    users: RwLock<Vec<User>>,
}

impl StubUserService {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserService for StubUserService {
    async fn create(&self, user: NewUser) -> User {
        let user = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
        };
        self.users.write().unwrap().push(user.clone());
        user
    }

    async fn list(&self) -> Vec<User> {
        self.users.read().unwrap().clone()
    }
}

/// Placeholder WebSocket session: echoes text frames back to the client.
pub struct EchoSession;

#[async_trait]
impl WsSessionHandler for EchoSession {
    async fn handle(&self, mut socket: WebSocket) {
        while let Some(Ok(message)) = socket.recv().await {
            match message {
                Message::Text(text) => {
                    if socket.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Message::Ping(payload) => {
                    let _ = socket.send(Message::Pong(payload)).await;
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    }
}
