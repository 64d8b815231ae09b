use std::time::Duration;

use crate::client::TradesClient;

const DEFAULT_API_URL: &str = "http://localhost:3000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Where and how the CLI talks to the API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    pub api_url: String,
    pub token: Option<String>,
    pub timeout: Duration,
}

impl CliConfig {
    pub fn from_env() -> Self {
        let api_url = std::env::var("TRADES_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let token = std::env::var("TRADES_API_TOKEN").ok().filter(|t| !t.trim().is_empty());
        let timeout_secs = std::env::var("TRADES_API_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Self {
            api_url,
            token,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// Command-line flags win over the environment
    pub fn with_overrides(mut self, url: Option<String>, token: Option<String>) -> Self {
        if let Some(url) = url {
            self.api_url = url;
        }
        if token.is_some() {
            self.token = token;
        }
        self
    }

    pub fn client(&self) -> anyhow::Result<TradesClient> {
        if self.token.is_none() {
            tracing::warn!("No API token configured; protected routes will answer 401");
        }
        Ok(TradesClient::new(&self.api_url, self.token.clone(), self.timeout)?)
    }
}
