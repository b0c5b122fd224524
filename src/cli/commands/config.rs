use crate::cli::OutputFormat;
use crate::config;

/// Secrets are skipped during serialization, so printing is safe
pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let resolved = config::config();
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(resolved)?),
        OutputFormat::Text => print!("{}", serde_yaml::to_string(resolved)?),
    }
    Ok(())
}
