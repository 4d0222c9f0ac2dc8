//! Role and capability checks against stored profiles.
//!
//! Every authorization decision goes through [`grant_path`], so the rule lives
//! in one place:
//!
//! 1. the profile role is administrative, or
//! 2. the capability list contains `"admin"` (when the policy allows it), or
//! 3. the capability list contains the required capability.

pub mod postgres;
pub mod store;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::session::Identity;

pub use postgres::PgProfileStore;
pub use store::{MemoryProfileStore, ProfileError, ProfileStore};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Moderator,
    Reviewer,
    #[default]
    Member,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Moderator => "moderator",
            Role::Reviewer => "reviewer",
            Role::Member => "member",
        }
    }

    pub fn is_administrative(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "moderator" => Ok(Role::Moderator),
            "reviewer" => Ok(Role::Reviewer),
            "member" => Ok(Role::Member),
            other => Err(ProfileError::UnknownRole(other.to_string())),
        }
    }
}

/// Named permission for one category of action. Names are not secret.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capability(String);

impl Capability {
    pub const ADMIN: &'static str = "admin";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn admin() -> Self {
        Self::new(Self::ADMIN)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Capability {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Stored role and capability set of an identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub capabilities: Vec<String>,
}

impl Profile {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self {
            id,
            role,
            capabilities: Vec::new(),
        }
    }

    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities = capabilities.into_iter().map(Into::into).collect();
        self
    }

    pub fn has_capability(&self, name: &str) -> bool {
        self.capabilities.iter().any(|c| c == name)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CapabilityPolicy {
    /// Whether a literal "admin" capability grants everything, like the admin role does
    pub capability_admin_grant: bool,
}

impl Default for CapabilityPolicy {
    fn default() -> Self {
        Self {
            capability_admin_grant: true,
        }
    }
}

/// Why access was granted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantPath {
    AdministrativeRole,
    AdminCapability,
    Capability,
}

pub fn grant_path(profile: &Profile, required: &Capability, policy: CapabilityPolicy) -> Option<GrantPath> {
    if profile.role.is_administrative() {
        Some(GrantPath::AdministrativeRole)
    } else if policy.capability_admin_grant && profile.has_capability(Capability::ADMIN) {
        Some(GrantPath::AdminCapability)
    } else if profile.has_capability(required.as_str()) {
        Some(GrantPath::Capability)
    } else {
        None
    }
}

pub fn grants(profile: &Profile, required: &Capability, policy: CapabilityPolicy) -> bool {
    grant_path(profile, required, policy).is_some()
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Missing required capability: {capability}")]
pub struct CapabilityDenied {
    pub capability: Capability,
}

/// Looks up the caller's profile and applies the grant rule
#[derive(Clone)]
pub struct CapabilityChecker {
    profiles: Arc<dyn ProfileStore>,
    policy: CapabilityPolicy,
}

impl CapabilityChecker {
    pub fn new(profiles: Arc<dyn ProfileStore>, policy: CapabilityPolicy) -> Self {
        Self { profiles, policy }
    }

    pub fn profiles(&self) -> &Arc<dyn ProfileStore> {
        &self.profiles
    }

    pub fn policy(&self) -> CapabilityPolicy {
        self.policy
    }

    /// Returns the profile on success. A missing profile or a failed lookup is a denial.
    pub async fn require(&self, identity: &Identity, capability: &Capability) -> Result<Profile, CapabilityDenied> {
        let denied = || CapabilityDenied {
            capability: capability.clone(),
        };

        let profile = match self.profiles.profile(identity.id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                tracing::warn!("Capability '{}' denied: no profile for user {}", capability, identity.id);
                return Err(denied());
            }
            Err(e) => {
                tracing::error!("Capability '{}' denied: profile lookup failed for user {}: {}", capability, identity.id, e);
                return Err(denied());
            }
        };

        match grant_path(&profile, capability, self.policy) {
            Some(GrantPath::AdminCapability) => {
                tracing::warn!(
                    "Capability '{}' granted to user {} through an 'admin' capability entry (role {})",
                    capability, identity.id, profile.role
                );
                Ok(profile)
            }
            Some(path) => {
                tracing::debug!("Capability '{}' granted to user {} via {:?}", capability, identity.id, path);
                Ok(profile)
            }
            None => {
                tracing::warn!("Capability '{}' denied for user {} (role {})", capability, identity.id, profile.role);
                Err(denied())
            }
        }
    }
}
