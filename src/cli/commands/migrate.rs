use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config;
use crate::database::postgres::redact_url;
use crate::database::PgStore;

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let database = &config::config().database;
    let store = PgStore::connect(database).await?;
    store.migrate().await?;

    let target = database.url.as_deref().map(redact_url).unwrap_or_default();
    output_success(
        output_format,
        &format!("Migrations applied to {}", target),
        Some(serde_json::json!({ "database": target })),
    )
}
