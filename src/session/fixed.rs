use async_trait::async_trait;
use std::collections::HashMap;

use super::{Identity, SessionCredentials, SessionError, SessionStore};

/// Maps fixed access tokens to identities. Unknown tokens resolve to nobody.
#[derive(Debug, Clone, Default)]
pub struct StaticSessionStore {
    sessions: HashMap<String, Identity>,
}

impl StaticSessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(mut self, token: impl Into<String>, identity: Identity) -> Self {
        self.sessions.insert(token.into(), identity);
        self
    }
}

#[async_trait]
impl SessionStore for StaticSessionStore {
    async fn current_identity(&self, credentials: &SessionCredentials) -> Result<Option<Identity>, SessionError> {
        Ok(credentials
            .access_token()
            .and_then(|token| self.sessions.get(token))
            .cloned())
    }
}
