use std::sync::Arc;
use std::time::Duration;

use crate::authorization::{AclAuthorizer, Authorizer, RemoteAuthorizer};
use crate::config::{AppConfig, StoreBackend};
use crate::database::{MemoryTradeStore, PgTradeStore, TradeStore};

/// Shared handler state; cheap to clone
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TradeStore>,
    pub authorizer: Arc<dyn Authorizer>,
    pub jwt_secret: Arc<str>,
    /// Upper bound applied to every list `limit`
    pub max_limit: Option<i64>,
}

impl AppState {
    pub fn new(store: Arc<dyn TradeStore>, authorizer: Arc<dyn Authorizer>, jwt_secret: impl Into<Arc<str>>) -> Self {
        Self {
            store,
            authorizer,
            jwt_secret: jwt_secret.into(),
            max_limit: None,
        }
    }

    pub fn with_max_limit(mut self, max_limit: Option<i64>) -> Self {
        self.max_limit = max_limit;
        self
    }
}

impl AppState {
    /// Store and authorizer chosen by configuration
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        if config.security.jwt_secret.is_empty() {
            anyhow::bail!("SECURITY_JWT_SECRET must be set outside development");
        }

        let store: Arc<dyn TradeStore> = match config.database.backend {
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory trade store; data is lost on restart");
                Arc::new(MemoryTradeStore::new())
            }
            StoreBackend::Postgres => Arc::new(PgTradeStore::new()),
        };

        let authorizer: Arc<dyn Authorizer> = match &config.authorization.provider_url {
            Some(url) => {
                tracing::info!("Using remote authorization provider at {}", url);
                Arc::new(RemoteAuthorizer::new(url, Duration::from_secs(config.authorization.timeout_secs))?)
            }
            None => Arc::new(AclAuthorizer::with_default_roles()),
        };

        Ok(Self::new(store, authorizer, config.security.jwt_secret.as_str()).with_max_limit(config.filter.max_limit))
    }
}
