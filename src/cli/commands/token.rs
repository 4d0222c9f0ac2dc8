use clap::Subcommand;
use serde_json::json;
use uuid::Uuid;

use crate::auth::{decode_jwt, generate_jwt, Claims};
use crate::cli::utils::{output_success, output_value};
use crate::cli::OutputFormat;
use crate::config;

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "Mint an access token signed with the configured secret")]
    Mint {
        #[arg(help = "User id (defaults to a random id)")]
        user_id: Option<Uuid>,
        #[arg(long, help = "Email address carried in the token")]
        email: String,
        #[arg(long, help = "Lifetime in hours (defaults to SECURITY_JWT_EXPIRY_HOURS)")]
        hours: Option<u64>,
    },

    #[command(about = "Verify a token and print its claims")]
    Inspect {
        #[arg(help = "Access token")]
        token: String,
    },
}

pub async fn handle(cmd: TokenCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let security = &config::config().security;

    match cmd {
        TokenCommands::Mint { user_id, email, hours } => {
            if !crate::is_development!() {
                tracing::warn!("Minting an access token outside development");
            }

            let user_id = user_id.unwrap_or_else(Uuid::new_v4);
            let claims = Claims::new(
                user_id,
                email,
                security.jwt_audience.clone(),
                hours.unwrap_or(security.jwt_expiry_hours),
            );
            let token = generate_jwt(&claims, &security.jwt_secret)?;

            match output_format {
                OutputFormat::Json => output_success(
                    output_format,
                    "Token minted",
                    Some(json!({ "token": token, "user_id": user_id, "expires_at": claims.exp })),
                ),
                OutputFormat::Text => {
                    println!("{}", token);
                    Ok(())
                }
            }
        }
        TokenCommands::Inspect { token } => {
            let claims = decode_jwt(&token, &security.jwt_secret, security.jwt_audience.as_deref())?;
            output_value(output_format, &claims)
        }
    }
}
