use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Session claims carried by the bearer token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Caller id
    pub sub: String,
    pub tenant: String,
    /// Tenant database name (`tenant_<...>`)
    pub database: String,
    #[serde(default)]
    pub roles: Vec<String>,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(sub: impl Into<String>, tenant: impl Into<String>, roles: Vec<String>, expiry_hours: u64) -> Self {
        let tenant = tenant.into();
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub: sub.into(),
            database: tenant_database(&tenant),
            tenant,
            roles,
            exp,
            iat: now.timestamp(),
        }
    }
}

/// Tenant ids map one-to-one onto `tenant_` databases: ASCII alphanumerics
/// pass through, `_` doubles, and every other byte becomes `_` plus two hex digits.
pub fn tenant_database(tenant: &str) -> String {
    let mut name = String::from("tenant_");
    for byte in tenant.bytes() {
        match byte {
            b'_' => name.push_str("__"),
            b if b.is_ascii_alphanumeric() => name.push(b as char),
            b => name.push_str(&format!("_{:02x}", b)),
        }
    }
    name
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),

    #[error("JWT secret not configured")]
    InvalidSecret,
}

pub fn generate_jwt(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key).map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

/// Verifies signature and expiry
pub fn decode_jwt(token: &str, secret: &str) -> Result<Claims, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    decode::<Claims>(token, &decoding_key, &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| JwtError::InvalidToken(e.to_string()))
}
