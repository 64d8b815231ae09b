pub mod token;
pub mod trades;

use serde_json::json;

use crate::cli::config::CliConfig;
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;

/// GET /health on the configured server
pub async fn health(output_format: OutputFormat, config: &CliConfig) -> anyhow::Result<()> {
    let url = format!("{}/health", config.api_url.trim_end_matches('/'));
    let response = reqwest::Client::new().get(&url).timeout(config.timeout).send().await?;

    let status = response.status();
    let body: serde_json::Value = response.json().await.unwrap_or(serde_json::Value::Null);
    if !status.is_success() {
        anyhow::bail!("{} is unhealthy ({}): {}", config.api_url, status, body);
    }

    output_success(output_format, &format!("{} is up", config.api_url), Some(json!({ "health": body })))
}
