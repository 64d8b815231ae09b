use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::Method,
    Extension,
};
use serde_json::Value;
use std::collections::HashMap;

use super::{authorize, parse_body, render, translate_query};
use crate::authorization::ResourceRef;
use crate::database::models::trade::TRADE_ENTITY;
use crate::database::models::Trade;
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::middleware::{ApiResponse, ApiResult, Session};
use crate::state::AppState;
use crate::types::Operation;
use crate::validation::validate_trade_patch;

/// Item route handler for every method; unsupported methods get a 405 naming them
pub async fn trade_item(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    method: Method,
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    body: Bytes,
) -> ApiResult<Value> {
    let operation = Operation::for_item(&method).ok_or_else(|| ApiError::method_not_allowed(method.as_str()))?;
    authorize(&state, &session, &ResourceRef::instance(TRADE_ENTITY, id.as_str()), operation).await?;

    match operation {
        Operation::Read => get_trade_by_id(&state, &session, &id, &params).await,
        Operation::Update => update_trade_by_id(&state, &session, &id, &body).await,
        Operation::Delete => delete_trade_by_id(&state, &session, &id).await,
        Operation::Create => Err(ApiError::method_not_allowed(method.as_str())),
    }
}

/// No match is `200 null`, not 404
async fn get_trade_by_id(state: &AppState, session: &Session, id: &str, params: &HashMap<String, String>) -> ApiResult<Value> {
    let filter = translate_query(state, params)?.scoped_to(id);
    let found = state.store.find_first(&session.tenant_context(), &filter).await?;

    let body = match found {
        Some(trade) => render(&filter, &trade)?,
        None => Value::Null,
    };
    Ok(ApiResponse::success(body))
}

async fn update_trade_by_id(state: &AppState, session: &Session, id: &str, body: &Bytes) -> ApiResult<Value> {
    let payload = parse_body(body)?;
    let patch = validate_trade_patch(&payload)?;
    if patch.is_empty() {
        return Err(ApiError::bad_request("Update payload contains no trade fields"));
    }

    let updated = state.store.update(&session.tenant_context(), id, &patch).await?;
    tracing::info!("Updated trade {} in tenant {}", id, session.tenant_id);
    Ok(ApiResponse::success(plain(&updated)?))
}

async fn delete_trade_by_id(state: &AppState, session: &Session, id: &str) -> ApiResult<Value> {
    let removed = state.store.delete(&session.tenant_context(), id).await?;
    tracing::info!("Deleted trade {} in tenant {}", id, session.tenant_id);
    Ok(ApiResponse::success(plain(&removed)?))
}

fn plain(trade: &Trade) -> Result<Value, ApiError> {
    render(&FilterData::default(), trade)
}
