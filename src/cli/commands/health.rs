use clap::Args;
use serde_json::Value;

use crate::cli::utils::{output_error, output_success};
use crate::cli::OutputFormat;

#[derive(Args)]
pub struct HealthArgs {
    #[arg(long, default_value = "http://localhost:3000", help = "Base URL of the server")]
    pub url: String,
}

pub async fn handle(args: HealthArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let endpoint = format!("{}/health", args.url.trim_end_matches('/'));
    let response = reqwest::get(&endpoint).await?;
    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);

    if status.is_success() {
        output_success(output_format, &format!("{} is healthy", args.url), Some(body))
    } else {
        output_error(output_format, &format!("{} reported {}", args.url, status), Some("UNHEALTHY"))?;
        anyhow::bail!("health check failed with status {}", status)
    }
}
