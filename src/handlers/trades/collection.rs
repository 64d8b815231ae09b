use axum::{
    body::Bytes,
    extract::{Query, State},
    http::Method,
    Extension,
};
use serde_json::Value;
use std::collections::HashMap;

use super::{authorize, parse_body, render, translate_query};
use crate::authorization::ResourceRef;
use crate::database::models::trade::TRADE_ENTITY;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Session};
use crate::state::AppState;
use crate::types::Operation;
use crate::validation::validate_trade;

pub async fn trade_collection(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    method: Method,
    Query(params): Query<HashMap<String, String>>,
    body: Bytes,
) -> ApiResult<Value> {
    let operation = Operation::for_collection(&method).ok_or_else(|| ApiError::method_not_allowed(method.as_str()))?;
    authorize(&state, &session, &ResourceRef::collection(TRADE_ENTITY), operation).await?;

    match operation {
        Operation::Read => list_trades(&state, &session, &params).await,
        Operation::Create => create_trade(&state, &session, &body).await,
        Operation::Update | Operation::Delete => Err(ApiError::method_not_allowed(method.as_str())),
    }
}

async fn list_trades(state: &AppState, session: &Session, params: &HashMap<String, String>) -> ApiResult<Value> {
    let filter = translate_query(state, params)?;
    let trades = state.store.find_many(&session.tenant_context(), &filter).await?;

    let rows = trades
        .iter()
        .map(|trade| render(&filter, trade))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ApiResponse::success(Value::Array(rows)))
}

async fn create_trade(state: &AppState, session: &Session, body: &Bytes) -> ApiResult<Value> {
    let payload = parse_body(body)?;
    let input = validate_trade(&payload)?;

    let created = state.store.create(&session.tenant_context(), input).await?;
    tracing::info!("Created trade {} in tenant {}", created.id, session.tenant_id);
    Ok(ApiResponse::created(render(&Default::default(), &created)?))
}
