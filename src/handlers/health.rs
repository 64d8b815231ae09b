use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::state::AppState;

pub async fn root() -> Json<Value> {
    Json(json!({
        "name": "trades-api",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Tenant-scoped trades resource with per-instance authorization",
        "endpoints": {
            "home": "/ (public)",
            "health": "/health (public)",
            "trades": "/api/trades[/:id] (protected)",
        }
    }))
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "timestamp": now, "store": "ok" })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "degraded", "timestamp": now, "store": "unavailable" })),
            )
        }
    }
}
