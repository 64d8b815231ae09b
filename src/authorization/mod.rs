//! Per-instance authorization port.
//!
//! The request handlers ask one question per request: may this caller (tenant
//! plus roles) perform this operation on this resource instance? Answers come
//! from an [`Authorizer`], either the built-in ACL or a hosted provider.

mod acl;
mod remote;

pub use acl::AclAuthorizer;
pub use remote::RemoteAuthorizer;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Operation;

/// The thing being accessed. `id` is `None` for collection-level checks
/// (list and create).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceRef {
    pub entity: String,
    pub id: Option<String>,
}

impl ResourceRef {
    pub fn instance(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self { entity: entity.into(), id: Some(id.into()) }
    }

    pub fn collection(entity: impl Into<String>) -> Self {
        Self { entity: entity.into(), id: None }
    }
}

/// The provider could not produce a decision. Denial is not an error.
#[derive(Debug, Error)]
pub enum AuthorizationError {
    #[error("authorization provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("authorization provider returned {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("invalid authorization provider URL: {0}")]
    Url(#[from] url::ParseError),
}

#[async_trait]
pub trait Authorizer: Send + Sync {
    async fn can(
        &self,
        tenant_id: &str,
        roles: &[String],
        resource: &ResourceRef,
        operation: Operation,
    ) -> Result<bool, AuthorizationError>;
}
