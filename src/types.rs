/// Shared types used across the codebase

use axum::http::Method;
use serde::{Deserialize, Serialize};

/// Operations a caller can be authorized for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 4] = [Operation::Create, Operation::Read, Operation::Update, Operation::Delete];

    /// Operation for a method on an item route (`/api/trades/:id`)
    pub fn for_item(method: &Method) -> Option<Self> {
        match *method {
            Method::GET => Some(Operation::Read),
            Method::PUT => Some(Operation::Update),
            Method::DELETE => Some(Operation::Delete),
            _ => None,
        }
    }

    /// Operation for a method on a collection route (`/api/trades`)
    pub fn for_collection(method: &Method) -> Option<Self> {
        match *method {
            Method::GET => Some(Operation::Read),
            Method::POST => Some(Operation::Create),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
