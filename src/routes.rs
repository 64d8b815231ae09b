use axum::{
    extract::{DefaultBodyLimit, Request},
    http::{header, HeaderMap, HeaderValue, Method},
    middleware,
    response::{IntoResponse, Response},
    routing::{any, get},
    Router,
};
use std::any::Any;
use tower::{service_fn, ServiceExt};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::handlers::{health, trades};
use crate::middleware::session_middleware;
use crate::state::AppState;

pub fn router(state: AppState, config: &AppConfig) -> Router {
    let protected = Router::new()
        .route("/api/trades", any(trades::trade_collection))
        .route("/api/trades/:id", any(trades::trade_item))
        .route_layer(middleware::from_fn_with_state(state.clone(), session_middleware));

    let app = Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .merge(protected)
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state);
    let app = with_cors(app, cors_layer(&config.security.cors_origins));

    if config.api.enable_request_logging {
        app.layer(TraceLayer::new_for_http())
    } else {
        app
    }
}

/// `CorsLayer` answers any OPTIONS itself, so only real preflights go through it;
/// a bare OPTIONS reaches the handlers like any other method.
fn with_cors(app: Router, cors: CorsLayer) -> Router {
    let cors_app = app.clone().layer(cors);
    Router::new().fallback_service(service_fn(move |req: Request| {
        let target = if req.method() == Method::OPTIONS && !is_preflight(req.headers()) {
            app.clone()
        } else {
            cors_app.clone()
        };
        target.oneshot(req)
    }))
}

fn is_preflight(headers: &HeaderMap) -> bool {
    headers.contains_key(header::ORIGIN) && headers.contains_key(header::ACCESS_CONTROL_REQUEST_METHOD)
}

/// `*` (or no configured origin) allows any origin
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();

    CorsLayer::permissive().allow_origin(AllowOrigin::list(allowed))
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };
    tracing::error!("Handler panicked: {}", detail);

    ApiError::internal_server_error("Internal server error").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preflight_needs_origin_and_requested_method() {
        let mut headers = HeaderMap::new();
        assert!(!is_preflight(&headers));

        headers.insert(header::ORIGIN, HeaderValue::from_static("https://app.example"));
        assert!(!is_preflight(&headers));

        headers.insert(header::ACCESS_CONTROL_REQUEST_METHOD, HeaderValue::from_static("PUT"));
        assert!(is_preflight(&headers));
    }
}
