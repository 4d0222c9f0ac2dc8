use anyhow::anyhow;
use serde::Deserialize;
use uuid::Uuid;

use crate::action::{validated_action, Action, ActionContext, ActionInput, ActionState};
use crate::capability::{Capability, Profile, ProfileError, Role};
use crate::schema::{Field, FormSchema};

const PROFILE_NOT_FOUND: &str = "Profile not found";

#[derive(Debug, Deserialize)]
pub struct GrantInput {
    pub profile_id: Uuid,
    pub capability: String,
    pub revoke: bool,
}

pub fn grant_schema() -> FormSchema {
    FormSchema::new()
        .field(Field::uuid("profile_id").label("Profile"))
        .field(Field::text("capability").label("Capability").min_len(1).max_len(64))
        .field(Field::boolean("revoke").label("Revoke"))
}

/// Adds or removes one capability on a profile
pub fn grant_capability() -> impl Action {
    validated_action::<GrantInput, _>("grant_capability", grant_schema(), grant).requires(Capability::admin())
}

fn is_slug(value: &str) -> bool {
    !value.is_empty()
        && !value.starts_with('-')
        && value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
}

async fn grant(ctx: ActionContext, input: ActionInput<GrantInput>) -> anyhow::Result<ActionState> {
    let admin = input
        .identity()
        .ok_or_else(|| anyhow!("grant_capability invoked without an identity"))?
        .id;
    let GrantInput {
        profile_id,
        capability,
        revoke,
    } = input.data;

    let capability = capability.trim().to_string();
    if !is_slug(&capability) {
        return Ok(ActionState::error(
            "Capability may only contain lowercase letters, digits, '-' and '_'",
        ));
    }
    let capability = Capability::new(capability);

    if revoke && profile_id == admin && capability == Capability::admin() {
        return Ok(ActionState::error("You cannot revoke your own admin capability"));
    }

    let result = if revoke {
        ctx.profiles().revoke_capability(profile_id, &capability).await
    } else {
        ctx.profiles().grant_capability(profile_id, &capability).await
    };

    let verb = if revoke { "revoked" } else { "granted" };
    match result {
        Ok(profile) => {
            tracing::info!("Admin {} {} capability '{}' on profile {}", admin, verb, capability, profile_id);
            Ok(profile_state(format!("Capability '{}' {}.", capability, verb), &profile))
        }
        Err(ProfileError::NotFound(_)) => Ok(ActionState::error(PROFILE_NOT_FOUND)),
        Err(e) => Err(e.into()),
    }
}

#[derive(Debug, Deserialize)]
pub struct RoleInput {
    pub profile_id: Uuid,
    pub role: Role,
}

pub fn role_schema() -> FormSchema {
    FormSchema::new()
        .field(Field::uuid("profile_id").label("Profile"))
        .field(Field::choice("role", ["admin", "moderator", "reviewer", "member"]).label("Role"))
}

pub fn set_role() -> impl Action {
    validated_action::<RoleInput, _>("set_role", role_schema(), change_role).requires(Capability::admin())
}

async fn change_role(ctx: ActionContext, input: ActionInput<RoleInput>) -> anyhow::Result<ActionState> {
    let admin = input
        .identity()
        .ok_or_else(|| anyhow!("set_role invoked without an identity"))?
        .id;
    let RoleInput { profile_id, role } = input.data;

    if profile_id == admin {
        return Ok(ActionState::error("You cannot change your own role"));
    }

    match ctx.profiles().set_role(profile_id, role).await {
        Ok(profile) => {
            tracing::info!("Admin {} set role of profile {} to {}", admin, profile_id, role);
            Ok(profile_state(format!("Role updated to {}.", role), &profile))
        }
        Err(ProfileError::NotFound(_)) => Ok(ActionState::error(PROFILE_NOT_FOUND)),
        Err(e) => Err(e.into()),
    }
}

fn profile_state(message: String, profile: &Profile) -> ActionState {
    ActionState::success(message)
        .with("profile_id", profile.id)
        .with("role", profile.role)
        .with("capabilities", &profile.capabilities)
}
