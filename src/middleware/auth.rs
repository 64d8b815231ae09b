use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::{decode_jwt, Claims};
use crate::database::TenantContext;
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated caller extracted from the bearer token
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub caller_id: String,
    pub tenant_id: String,
    pub database: String,
    pub roles: Vec<String>,
}

impl Session {
    pub fn tenant_context(&self) -> TenantContext {
        TenantContext {
            tenant_id: self.tenant_id.clone(),
            database: self.database.clone(),
        }
    }
}

impl From<Claims> for Session {
    fn from(claims: Claims) -> Self {
        Self {
            caller_id: claims.sub,
            tenant_id: claims.tenant,
            database: claims.database,
            roles: claims.roles,
        }
    }
}

/// Validates the bearer JWT and injects a [`Session`] into request extensions
pub async fn session_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(&headers).map_err(ApiError::unauthorized)?;
    let claims = decode_jwt(token, &state.jwt_secret).map_err(|e| ApiError::unauthorized(e.to_string()))?;

    request.extensions_mut().insert(Session::from(claims));
    Ok(next.run(request).await)
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, &'static str> {
    let auth_str = headers
        .get(header::AUTHORIZATION)
        .ok_or("Missing Authorization header")?
        .to_str()
        .map_err(|_| "Invalid Authorization header format")?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        Some(_) => Err("Empty JWT token"),
        None => Err("Authorization header must use Bearer token format"),
    }
}
