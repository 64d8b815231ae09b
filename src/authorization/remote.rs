use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{AuthorizationError, Authorizer, ResourceRef};
use crate::types::Operation;

#[derive(Debug, Serialize)]
struct AuthorizeRequest<'a> {
    tenant_id: &'a str,
    roles: &'a [String],
    entity: &'a str,
    resource_id: Option<&'a str>,
    operation: Operation,
}

#[derive(Debug, Deserialize)]
struct AuthorizeResponse {
    allowed: bool,
}

/// Hosted authorization provider: `POST {base}/authorize` answering `{"allowed": bool}`
#[derive(Debug, Clone)]
pub struct RemoteAuthorizer {
    http: Client,
    endpoint: Url,
}

impl RemoteAuthorizer {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AuthorizationError> {
        let base = Url::parse(&format!("{}/", base_url.trim_end_matches('/')))?;
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: base.join("authorize")?,
        })
    }
}

#[async_trait]
impl Authorizer for RemoteAuthorizer {
    async fn can(
        &self,
        tenant_id: &str,
        roles: &[String],
        resource: &ResourceRef,
        operation: Operation,
    ) -> Result<bool, AuthorizationError> {
        let body = AuthorizeRequest {
            tenant_id,
            roles,
            entity: &resource.entity,
            resource_id: resource.id.as_deref(),
            operation,
        };

        let resp = self.http.post(self.endpoint.clone()).json(&body).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AuthorizationError::Provider { status: status.as_u16(), body });
        }

        let decision: AuthorizeResponse = resp.json().await?;
        debug!(
            "remote authz: tenant={} resource={}/{} op={} allowed={}",
            tenant_id,
            resource.entity,
            resource.id.as_deref().unwrap_or("*"),
            operation,
            decision.allowed
        );
        Ok(decision.allowed)
    }
}
