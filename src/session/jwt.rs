use async_trait::async_trait;

use super::{Identity, SessionCredentials, SessionError, SessionStore};
use crate::auth::{decode_jwt, JwtError};

/// Verifies HS256 access tokens signed with the project's JWT secret
#[derive(Clone)]
pub struct JwtSessionStore {
    secret: String,
    audience: Option<String>,
}

impl JwtSessionStore {
    pub fn new(secret: impl Into<String>, audience: Option<String>) -> Result<Self, SessionError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(SessionError::Misconfigured("JWT secret not configured".to_string()));
        }
        Ok(Self { secret, audience })
    }
}

impl std::fmt::Debug for JwtSessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSessionStore")
            .field("audience", &self.audience)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SessionStore for JwtSessionStore {
    async fn current_identity(&self, credentials: &SessionCredentials) -> Result<Option<Identity>, SessionError> {
        let Some(token) = credentials.access_token() else {
            return Ok(None);
        };

        let claims = decode_jwt(token, &self.secret, self.audience.as_deref()).map_err(|e| match e {
            JwtError::InvalidSecret => SessionError::Misconfigured(e.to_string()),
            other => SessionError::InvalidToken(other.to_string()),
        })?;

        Ok(Some(Identity::new(claims.sub, claims.email)))
    }
}
