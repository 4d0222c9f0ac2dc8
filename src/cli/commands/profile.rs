use clap::Subcommand;
use uuid::Uuid;

use crate::capability::{Capability, Role};
use crate::cli::utils::{output_error, output_success, output_value};
use crate::cli::OutputFormat;
use crate::config::{self, StoreKind};
use crate::server::profile_store;

#[derive(Subcommand)]
pub enum ProfileCommands {
    #[command(about = "Show a profile's role and capabilities")]
    Show {
        #[arg(help = "Profile (user) id")]
        id: Uuid,
    },

    #[command(about = "Add a capability to a profile")]
    Grant {
        #[arg(help = "Profile (user) id")]
        id: Uuid,
        #[arg(help = "Capability name")]
        capability: String,
    },

    #[command(about = "Remove a capability from a profile")]
    Revoke {
        #[arg(help = "Profile (user) id")]
        id: Uuid,
        #[arg(help = "Capability name")]
        capability: String,
    },

    #[command(about = "Set a profile's role (admin, moderator, reviewer, member)")]
    Role {
        #[arg(help = "Profile (user) id")]
        id: Uuid,
        #[arg(help = "Role name")]
        role: Role,
    },
}

pub async fn handle(cmd: ProfileCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let config = config::config();
    if config.profiles.store == StoreKind::Memory && !matches!(cmd, ProfileCommands::Show { .. }) {
        tracing::warn!("Profile store is in-memory; changes last only for this command");
    }
    let store = profile_store(config).await?;

    match cmd {
        ProfileCommands::Show { id } => match store.profile(id).await? {
            Some(profile) => output_value(output_format, &profile),
            None => output_error(output_format, &format!("Profile {} not found", id), Some("NOT_FOUND")),
        },
        ProfileCommands::Grant { id, capability } => {
            let profile = store.grant_capability(id, &Capability::new(capability.clone())).await?;
            output_success(
                output_format,
                &format!("Granted '{}' to {}", capability, id),
                Some(serde_json::to_value(&profile)?),
            )
        }
        ProfileCommands::Revoke { id, capability } => {
            let profile = store.revoke_capability(id, &Capability::new(capability.clone())).await?;
            output_success(
                output_format,
                &format!("Revoked '{}' from {}", capability, id),
                Some(serde_json::to_value(&profile)?),
            )
        }
        ProfileCommands::Role { id, role } => {
            let profile = store.set_role(id, role).await?;
            output_success(
                output_format,
                &format!("Set role of {} to {}", id, role),
                Some(serde_json::to_value(&profile)?),
            )
        }
    }
}
