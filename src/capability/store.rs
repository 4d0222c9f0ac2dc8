use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Capability, Profile, Role};
use crate::database::DatabaseError;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Profile not found: {0}")]
    NotFound(Uuid),

    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Invalid profile seed: {0}")]
    Seed(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<sqlx::Error> for ProfileError {
    fn from(err: sqlx::Error) -> Self {
        ProfileError::Database(DatabaseError::Sqlx(err))
    }
}

/// Persisted profiles: read by the capability checker, written by administrative actions
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn profile(&self, id: Uuid) -> Result<Option<Profile>, ProfileError>;

    async fn set_role(&self, id: Uuid, role: Role) -> Result<Profile, ProfileError>;

    /// Adding a capability the profile already has is a no-op
    async fn grant_capability(&self, id: Uuid, capability: &Capability) -> Result<Profile, ProfileError>;

    async fn revoke_capability(&self, id: Uuid, capability: &Capability) -> Result<Profile, ProfileError>;

    async fn health_check(&self) -> Result<(), ProfileError> {
        Ok(())
    }
}

/// Process-local profile store for development and tests
#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    profiles: RwLock<HashMap<Uuid, Profile>>,
}

#[derive(Debug, Deserialize)]
struct ProfileSeed {
    #[serde(default)]
    profiles: Vec<Profile>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profiles(profiles: impl IntoIterator<Item = Profile>) -> Self {
        Self {
            profiles: RwLock::new(profiles.into_iter().map(|p| (p.id, p)).collect()),
        }
    }

    /// Parse a seed document:
    ///
    /// ```yaml
    /// profiles:
    ///   - id: 5b7e3f0c-8a7d-4a53-9e3b-1c2d3e4f5a6b
    ///     role: reviewer
    ///     capabilities: [reviewer]
    /// ```
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ProfileError> {
        let seed: ProfileSeed = serde_yaml::from_str(yaml).map_err(|e| ProfileError::Seed(e.to_string()))?;
        Ok(Self::with_profiles(seed.profiles))
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ProfileError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| ProfileError::Seed(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml_str(&yaml)
    }

    pub async fn insert(&self, profile: Profile) {
        self.profiles.write().await.insert(profile.id, profile);
    }

    pub async fn len(&self) -> usize {
        self.profiles.read().await.len()
    }

    async fn update<F>(&self, id: Uuid, apply: F) -> Result<Profile, ProfileError>
    where
        F: FnOnce(&mut Profile) + Send,
    {
        let mut profiles = self.profiles.write().await;
        let profile = profiles.get_mut(&id).ok_or(ProfileError::NotFound(id))?;
        apply(profile);
        Ok(profile.clone())
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn profile(&self, id: Uuid) -> Result<Option<Profile>, ProfileError> {
        Ok(self.profiles.read().await.get(&id).cloned())
    }

    async fn set_role(&self, id: Uuid, role: Role) -> Result<Profile, ProfileError> {
        self.update(id, |p| p.role = role).await
    }

    async fn grant_capability(&self, id: Uuid, capability: &Capability) -> Result<Profile, ProfileError> {
        let name = capability.as_str().to_string();
        self.update(id, move |p| {
            if !p.has_capability(&name) {
                p.capabilities.push(name);
            }
        })
        .await
    }

    async fn revoke_capability(&self, id: Uuid, capability: &Capability) -> Result<Profile, ProfileError> {
        let name = capability.as_str().to_string();
        self.update(id, move |p| p.capabilities.retain(|c| *c != name)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seeds_from_yaml() {
        let store = MemoryProfileStore::from_yaml_str(
            r#"
profiles:
  - id: 5b7e3f0c-8a7d-4a53-9e3b-1c2d3e4f5a6b
    role: reviewer
    capabilities: [reviewer]
  - id: 0d6f9a1e-2b3c-4d5e-8f70-112233445566
"#,
        )
        .unwrap();

        assert_eq!(store.len().await, 2);
        let id = Uuid::parse_str("0d6f9a1e-2b3c-4d5e-8f70-112233445566").unwrap();
        let profile = store.profile(id).await.unwrap().unwrap();
        assert_eq!(profile.role, Role::Member);
        assert!(profile.capabilities.is_empty());
    }

    #[test]
    fn rejects_unknown_roles_in_seed() {
        let result = MemoryProfileStore::from_yaml_str("profiles:\n  - id: 5b7e3f0c-8a7d-4a53-9e3b-1c2d3e4f5a6b\n    role: owner\n");
        assert!(matches!(result, Err(ProfileError::Seed(_))));
    }

    #[tokio::test]
    async fn grant_is_idempotent_and_revoke_removes() {
        let id = Uuid::new_v4();
        let store = MemoryProfileStore::with_profiles([Profile::new(id, Role::Member)]);
        let cap = Capability::new("reviewer");

        store.grant_capability(id, &cap).await.unwrap();
        let profile = store.grant_capability(id, &cap).await.unwrap();
        assert_eq!(profile.capabilities, vec!["reviewer".to_string()]);

        let profile = store.revoke_capability(id, &cap).await.unwrap();
        assert!(profile.capabilities.is_empty());
    }

    #[tokio::test]
    async fn mutations_on_missing_profile_fail() {
        let store = MemoryProfileStore::new();
        let result = store.set_role(Uuid::new_v4(), Role::Admin).await;
        assert!(matches!(result, Err(ProfileError::NotFound(_))));
    }
}
