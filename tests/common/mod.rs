#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use reqwest::StatusCode;

use trades_api::auth::{generate_jwt, Claims};
use trades_api::authorization::{AclAuthorizer, Authorizer};
use trades_api::database::models::Business;
use trades_api::database::{MemoryTradeStore, TradeStore};
use trades_api::{config, router, AppState};

pub const SECRET: &str = "integration-test-secret";
pub const TENANT: &str = "acme";

/// Router over an in-memory store, plus handles to inspect that store
pub struct TestApp {
    pub store: Arc<MemoryTradeStore>,
    pub router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_authorizer(AclAuthorizer::with_default_roles())
    }

    pub fn with_authorizer(authorizer: impl Authorizer + 'static) -> Self {
        let store = Arc::new(MemoryTradeStore::new());
        let dyn_store: Arc<dyn TradeStore> = store.clone();
        let state = AppState::new(dyn_store, Arc::new(authorizer), SECRET).with_max_limit(Some(50));
        let router = router(state, config::config());
        Self { store, router }
    }

    pub async fn seed_business(&self, tenant: &str, name: &str) -> Business {
        let business = Business::new(name);
        self.store.insert_business(tenant, business.clone()).await;
        business
    }

    /// Serve the router on a free local port for real HTTP clients
    pub async fn serve(&self) -> Result<TestServer> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
        let app = self.router.clone();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let server = TestServer { port, base_url: format!("http://127.0.0.1:{}", port) };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }
}

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
}

impl TestServer {
    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if let Ok(resp) = client.get(format!("{}/health", self.base_url)).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

pub fn token(tenant: &str, roles: &[&str]) -> String {
    let claims = Claims::new("caller-1", tenant, roles.iter().map(|r| r.to_string()).collect(), 1);
    generate_jwt(&claims, SECRET).expect("sign test token")
}

pub fn admin_token() -> String {
    token(TENANT, &["admin"])
}
