//! `/api/trades` and `/api/trades/:id`.
//!
//! Every request runs one pass: session (middleware), method to operation,
//! authorization, then a single store call. Nothing is retried.

pub mod collection;
pub mod item;

pub use collection::trade_collection;
pub use item::trade_item;

use axum::body::Bytes;
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

use crate::authorization::ResourceRef;
use crate::database::models::Trade;
use crate::error::ApiError;
use crate::filter::{convert_query_to_filter, FilterData, TRADE_SPEC};
use crate::middleware::Session;
use crate::state::AppState;
use crate::types::Operation;

/// Ask the authorizer; a denial becomes 403 without touching the store
async fn authorize(state: &AppState, session: &Session, resource: &ResourceRef, operation: Operation) -> Result<(), ApiError> {
    let allowed = state
        .authorizer
        .can(&session.tenant_id, &session.roles, resource, operation)
        .await?;

    if !allowed {
        warn!(
            "Denied {} on {}/{} for caller {} in tenant {}",
            operation,
            resource.entity,
            resource.id.as_deref().unwrap_or("*"),
            session.caller_id,
            session.tenant_id
        );
        return Err(ApiError::forbidden(format!("Not allowed to {} this {}", operation, resource.entity)));
    }
    Ok(())
}

fn translate_query(state: &AppState, params: &HashMap<String, String>) -> Result<FilterData, ApiError> {
    Ok(convert_query_to_filter(params, &TRADE_SPEC)?.with_max_limit(state.max_limit))
}

/// Request bodies are read raw so malformed JSON maps to our own 400 body
fn parse_body(body: &Bytes) -> Result<Value, ApiError> {
    if body.is_empty() {
        return Err(ApiError::invalid_json("Request body is empty"));
    }
    serde_json::from_slice(body).map_err(|e| ApiError::invalid_json(format!("Invalid JSON body: {}", e)))
}

fn render(filter: &FilterData, trade: &Trade) -> Result<Value, ApiError> {
    let value = serde_json::to_value(trade).map_err(|e| {
        tracing::error!("Failed to serialize trade {}: {}", trade.id, e);
        ApiError::internal_server_error("Failed to serialize record")
    })?;
    Ok(filter.project(value))
}
