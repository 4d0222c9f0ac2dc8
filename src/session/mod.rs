//! Session resolution: who is making this request?
//!
//! The pipeline only needs "identity or nobody". How the identity is proven
//! (signed access token, fixed development tokens) is up to the `SessionStore`.

pub mod fixed;
pub mod jwt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use fixed::StaticSessionStore;
pub use jwt::JwtSessionStore;

/// Authenticated identity, resolved once per request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
}

impl Identity {
    pub fn new(id: Uuid, email: impl Into<String>) -> Self {
        Self { id, email: email.into() }
    }
}

/// Raw credentials presented with a request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionCredentials {
    access_token: Option<String>,
}

impl SessionCredentials {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            access_token: Some(token.into()),
        }
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Invalid session token: {0}")]
    InvalidToken(String),

    #[error("Session store misconfigured: {0}")]
    Misconfigured(String),
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// `Ok(None)` when no credentials were presented
    async fn current_identity(&self, credentials: &SessionCredentials) -> Result<Option<Identity>, SessionError>;
}

/// Resolve the identity or nothing. Failures are logged here and never handed to
/// callers, so store internals cannot leak into user-facing messages.
pub async fn resolve(store: &dyn SessionStore, credentials: &SessionCredentials) -> Option<Identity> {
    match store.current_identity(credentials).await {
        Ok(Some(identity)) => {
            tracing::debug!("Session resolved for user {}", identity.id);
            Some(identity)
        }
        Ok(None) => {
            tracing::debug!("No session credentials presented");
            None
        }
        Err(e) => {
            tracing::warn!("Session resolution failed: {}", e);
            None
        }
    }
}
