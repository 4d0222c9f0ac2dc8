use axum::{
    extract::{Path, State},
    Extension,
};
use serde::Serialize;

use crate::action::SIGN_IN_REQUIRED;
use crate::capability::{Capability, Profile};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;
use crate::session::{self, Identity, SessionCredentials};

#[derive(Debug, Serialize)]
pub struct WhoAmI {
    #[serde(flatten)]
    pub identity: Identity,
    pub profile: Option<Profile>,
}

#[derive(Debug, Serialize)]
pub struct CapabilityCheck {
    pub capability: Capability,
    pub granted: bool,
}

async fn signed_in(state: &AppState, credentials: &SessionCredentials) -> Result<Identity, ApiError> {
    session::resolve(state.context.sessions(), credentials)
        .await
        .ok_or_else(|| ApiError::unauthorized(SIGN_IN_REQUIRED))
}

/// GET /api/auth/whoami - identity from the session plus the stored profile, if any
pub async fn whoami(
    State(state): State<AppState>,
    Extension(credentials): Extension<SessionCredentials>,
) -> ApiResult<WhoAmI> {
    let identity = signed_in(&state, &credentials).await?;
    let profile = state.context.profiles().profile(identity.id).await?;

    Ok(ApiResponse::success(WhoAmI { identity, profile }))
}

/// GET /api/auth/capabilities/:capability
pub async fn capability(
    State(state): State<AppState>,
    Path(capability): Path<String>,
    Extension(credentials): Extension<SessionCredentials>,
) -> ApiResult<CapabilityCheck> {
    let identity = signed_in(&state, &credentials).await?;
    let capability = Capability::new(capability);
    let granted = state
        .context
        .capabilities()
        .require(&identity, &capability)
        .await
        .is_ok();

    Ok(ApiResponse::success(CapabilityCheck { capability, granted }))
}
