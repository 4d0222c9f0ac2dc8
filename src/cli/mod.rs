pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "nyuchi")]
#[command(about = "Nyuchi CLI - run the actions API, mint development tokens and manage profiles")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the actions API server")]
    Serve,

    #[command(about = "Access token utilities")]
    Token {
        #[command(subcommand)]
        cmd: commands::token::TokenCommands,
    },

    #[command(about = "Profile role and capability management")]
    Profile {
        #[command(subcommand)]
        cmd: commands::profile::ProfileCommands,
    },

    #[command(about = "Check whether a profile holds a capability")]
    Check {
        #[arg(help = "Profile (user) id")]
        profile_id: uuid::Uuid,
        #[arg(help = "Capability name")]
        capability: String,
    },

    #[command(about = "Submit a form to a running server's action endpoint")]
    Invoke(commands::invoke::InvokeArgs),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Serve => commands::serve::handle().await,
        Commands::Token { cmd } => commands::token::handle(cmd, output_format).await,
        Commands::Profile { cmd } => commands::profile::handle(cmd, output_format).await,
        Commands::Check { profile_id, capability } => {
            commands::check::handle(profile_id, capability, output_format).await
        }
        Commands::Invoke(args) => commands::invoke::handle(args, output_format).await,
    }
}
