use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::{ActionContext, ActionGuard, ActionState};
use crate::schema::FormData;
use crate::session::SessionCredentials;

/// Type-erased action, so differently typed actions can share one registry
#[async_trait]
pub trait Action: Send + Sync {
    fn name(&self) -> &str;

    fn guard(&self) -> &ActionGuard;

    /// `previous` is accepted for the form-action calling convention and is not inspected
    async fn invoke(
        &self,
        ctx: &ActionContext,
        credentials: &SessionCredentials,
        previous: &ActionState,
        form: FormData,
    ) -> anyhow::Result<ActionState>;
}

#[derive(Debug, Clone, Serialize)]
pub struct ActionDescriptor {
    pub name: String,
    pub guard: String,
}

/// Actions addressable by name
#[derive(Default, Clone)]
pub struct ActionRegistry {
    actions: BTreeMap<String, Arc<dyn Action>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registering a second action under the same name replaces the first
    pub fn register(&mut self, action: impl Action + 'static) -> &mut Self {
        let name = action.name().to_string();
        if self.actions.insert(name.clone(), Arc::new(action)).is_some() {
            tracing::warn!("Action '{}' registered twice; keeping the latest", name);
        } else {
            tracing::debug!("Registered action '{}'", name);
        }
        self
    }

    pub fn with(mut self, action: impl Action + 'static) -> Self {
        self.register(action);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Action>> {
        self.actions.get(name).cloned()
    }

    pub fn describe(&self) -> Vec<ActionDescriptor> {
        self.actions
            .values()
            .map(|a| ActionDescriptor {
                name: a.name().to_string(),
                guard: a.guard().to_string(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
