use anyhow::Context;
use clap::Args;

use crate::action::ActionState;
use crate::cli::utils::{output_error, output_value, parse_field};
use crate::cli::OutputFormat;
use crate::config;

#[derive(Args)]
pub struct InvokeArgs {
    #[arg(help = "Action name")]
    pub action: String,

    #[arg(short, long = "field", value_parser = parse_field, help = "Form field as key=value (repeatable)")]
    pub fields: Vec<(String, String)>,

    #[arg(long, help = "Access token sent as a Bearer header")]
    pub token: Option<String>,

    #[arg(long, help = "Server base URL (defaults to the configured local port)")]
    pub url: Option<String>,
}

pub async fn handle(args: InvokeArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let base = args
        .url
        .unwrap_or_else(|| format!("http://localhost:{}", config::config().api.port));
    let endpoint = url::Url::parse(&base)
        .and_then(|u| u.join(&format!("actions/{}", args.action)))
        .with_context(|| format!("invalid server URL '{}'", base))?;

    let mut request = reqwest::Client::new().post(endpoint.clone()).form(&args.fields);
    if let Some(token) = &args.token {
        request = request.bearer_auth(token);
    }

    let response = request
        .send()
        .await
        .with_context(|| format!("failed to reach {}", endpoint))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        output_error(output_format, &format!("{} returned {}: {}", endpoint, status, body), None)?;
        anyhow::bail!("action request failed with {}", status);
    }

    let state: ActionState = response.json().await.context("unexpected response body")?;
    output_value(output_format, &state)?;

    if state.is_error() {
        anyhow::bail!("action '{}' was rejected", args.action);
    }
    Ok(())
}
