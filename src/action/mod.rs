//! Validated server actions.
//!
//! A `ValidatedAction` wraps a business handler with the request pipeline:
//!
//! ```text
//! START -> VALIDATE -> [RESOLVE_SESSION -> CHECK_CAPABILITY] -> INVOKE_HANDLER
//! ```
//!
//! Validation, session and capability failures end the invocation with an
//! `ActionState` carrying `error`. The handler runs only when every earlier
//! stage passed. Errors raised by the handler itself are returned as `Err` for
//! the caller to deal with.

pub mod registry;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::capability::{Capability, CapabilityChecker, CapabilityPolicy, Profile, ProfileStore};
use crate::records::{ContentStore, ListingStore, MemoryRecordStore, MessageStore};
use crate::schema::{FormData, FormSchema};
use crate::session::{self, Identity, SessionCredentials, SessionStore};

pub use registry::{Action, ActionRegistry};

pub const SIGN_IN_REQUIRED: &str = "You must be signed in to perform this action";

/// Result of one action invocation, rendered back to the caller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<String>,
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl ActionState {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: Some(message.into()),
            ..Self::default()
        }
    }

    /// Attach a payload field
    pub fn with(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or_else(|e| {
            tracing::error!("Failed to serialize action state field: {}", e);
            Value::Null
        });
        self.data.insert(key.into(), value);
        self
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Who may invoke an action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionGuard {
    Public,
    SignedIn,
    Capability(Capability),
}

impl ActionGuard {
    pub fn requires_session(&self) -> bool {
        !matches!(self, ActionGuard::Public)
    }
}

impl fmt::Display for ActionGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionGuard::Public => f.write_str("public"),
            ActionGuard::SignedIn => f.write_str("signed_in"),
            ActionGuard::Capability(cap) => write!(f, "capability:{}", cap),
        }
    }
}

/// The resolved caller. `profile` is loaded only for capability-guarded actions.
#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    pub identity: Identity,
    pub profile: Option<Profile>,
}

/// Everything a handler receives
#[derive(Debug)]
pub struct ActionInput<T> {
    pub data: T,
    pub form: FormData,
    pub actor: Option<Actor>,
}

impl<T> ActionInput<T> {
    pub fn identity(&self) -> Option<&Identity> {
        self.actor.as_ref().map(|a| &a.identity)
    }
}

/// Collaborators shared by every invocation. Cheap to clone.
#[derive(Clone)]
pub struct ActionContext {
    sessions: Arc<dyn SessionStore>,
    capabilities: CapabilityChecker,
    listings: Arc<dyn ListingStore>,
    content: Arc<dyn ContentStore>,
    messages: Arc<dyn MessageStore>,
}

impl ActionContext {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        profiles: Arc<dyn ProfileStore>,
        policy: CapabilityPolicy,
    ) -> Self {
        let records = Arc::new(MemoryRecordStore::new());
        Self {
            sessions,
            capabilities: CapabilityChecker::new(profiles, policy),
            listings: records.clone(),
            content: records.clone(),
            messages: records,
        }
    }

    /// Replace the in-memory records every context starts with
    pub fn with_records<S>(mut self, store: Arc<S>) -> Self
    where
        S: ListingStore + ContentStore + MessageStore + 'static,
    {
        self.listings = store.clone();
        self.content = store.clone();
        self.messages = store;
        self
    }

    pub fn sessions(&self) -> &dyn SessionStore {
        self.sessions.as_ref()
    }

    pub fn capabilities(&self) -> &CapabilityChecker {
        &self.capabilities
    }

    pub fn profiles(&self) -> &Arc<dyn ProfileStore> {
        self.capabilities.profiles()
    }

    pub fn listings(&self) -> &dyn ListingStore {
        self.listings.as_ref()
    }

    pub fn content(&self) -> &dyn ContentStore {
        self.content.as_ref()
    }

    pub fn messages(&self) -> &dyn MessageStore {
        self.messages.as_ref()
    }
}

#[async_trait]
pub trait ActionHandler<T>: Send + Sync {
    async fn handle(
        &self,
        ctx: ActionContext,
        input: ActionInput<T>,
    ) -> anyhow::Result<ActionState>;
}

#[async_trait]
impl<T, F, Fut> ActionHandler<T> for F
where
    T: Send + 'static,
    F: Fn(ActionContext, ActionInput<T>) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<ActionState>> + Send + 'static,
{
    async fn handle(
        &self,
        ctx: ActionContext,
        input: ActionInput<T>,
    ) -> anyhow::Result<ActionState> {
        (self)(ctx, input).await
    }
}

pub struct ValidatedAction<T, H> {
    name: String,
    schema: FormSchema,
    guard: ActionGuard,
    handler: H,
    _input: PhantomData<fn() -> T>,
}

/// Action open to anyone whose submission validates
pub fn validated_action<T, H>(
    name: impl Into<String>,
    schema: FormSchema,
    handler: H,
) -> ValidatedAction<T, H>
where
    T: DeserializeOwned + Send + 'static,
    H: ActionHandler<T>,
{
    ValidatedAction {
        name: name.into(),
        schema,
        guard: ActionGuard::Public,
        handler,
        _input: PhantomData,
    }
}

/// Action that also needs a signed-in caller
pub fn validated_action_with_user<T, H>(
    name: impl Into<String>,
    schema: FormSchema,
    handler: H,
) -> ValidatedAction<T, H>
where
    T: DeserializeOwned + Send + 'static,
    H: ActionHandler<T>,
{
    validated_action(name, schema, handler).signed_in()
}

impl<T, H> ValidatedAction<T, H>
where
    T: DeserializeOwned + Send + 'static,
    H: ActionHandler<T>,
{
    pub fn signed_in(mut self) -> Self {
        self.guard = ActionGuard::SignedIn;
        self
    }

    /// Signed-in caller whose profile grants `capability`
    pub fn requires(mut self, capability: impl Into<Capability>) -> Self {
        self.guard = ActionGuard::Capability(capability.into());
        self
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    async fn authorize(
        &self,
        ctx: &ActionContext,
        credentials: &SessionCredentials,
    ) -> Result<Option<Actor>, ActionState> {
        if !self.guard.requires_session() {
            return Ok(None);
        }

        let identity = match session::resolve(ctx.sessions(), credentials).await {
            Some(identity) => identity,
            None => {
                tracing::debug!("Action '{}' rejected: not signed in", self.name);
                return Err(ActionState::error(SIGN_IN_REQUIRED));
            }
        };

        let profile = match &self.guard {
            ActionGuard::Capability(capability) => {
                let profile = ctx
                    .capabilities()
                    .require(&identity, capability)
                    .await
                    .map_err(|denied| ActionState::error(denied.to_string()))?;
                Some(profile)
            }
            _ => None,
        };

        Ok(Some(Actor { identity, profile }))
    }
}

#[async_trait]
impl<T, H> Action for ValidatedAction<T, H>
where
    T: DeserializeOwned + Send + 'static,
    H: ActionHandler<T>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn guard(&self) -> &ActionGuard {
        &self.guard
    }

    async fn invoke(
        &self,
        ctx: &ActionContext,
        credentials: &SessionCredentials,
        _previous: &ActionState,
        form: FormData,
    ) -> anyhow::Result<ActionState> {
        let data = match self.schema.parse::<T>(&form) {
            Ok(data) => data,
            Err(errors) => {
                tracing::debug!(
                    "Action '{}' rejected: {} validation error(s)",
                    self.name,
                    errors.len()
                );
                return Ok(ActionState::error(errors.joined()));
            }
        };

        let actor = match self.authorize(ctx, credentials).await {
            Ok(actor) => actor,
            Err(state) => return Ok(state),
        };

        tracing::debug!(
            "Invoking action '{}' for {}",
            self.name,
            actor
                .as_ref()
                .map(|a| a.identity.id.to_string())
                .unwrap_or_else(|| "anonymous".to_string())
        );

        self.handler.handle(ctx.clone(), ActionInput { data, form, actor }).await
    }
}
