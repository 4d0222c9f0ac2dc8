use serde_json::json;
use uuid::Uuid;

use crate::capability::{grant_path, Capability, CapabilityPolicy, GrantPath};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config;
use crate::server::profile_store;

pub async fn handle(profile_id: Uuid, capability: String, output_format: OutputFormat) -> anyhow::Result<()> {
    let config = config::config();
    let store = profile_store(config).await?;
    let policy = CapabilityPolicy {
        capability_admin_grant: config.security.capability_admin_grant,
    };
    let capability = Capability::new(capability);

    let path = store
        .profile(profile_id)
        .await?
        .and_then(|profile| grant_path(&profile, &capability, policy));

    let reason = match path {
        Some(GrantPath::AdministrativeRole) => "administrative role",
        Some(GrantPath::AdminCapability) => "'admin' capability entry",
        Some(GrantPath::Capability) => "capability list",
        None => "not granted",
    };

    output_success(
        output_format,
        &format!("{} / {}: {}", profile_id, capability, reason),
        Some(json!({
            "profile_id": profile_id,
            "capability": capability,
            "granted": path.is_some(),
        })),
    )
}
