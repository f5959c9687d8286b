//! JWT token issuance and verification.
//!
//! Tokens carry the username as `sub` and the role name at issuance as
//! `role`. The role claim is informational only: authorization always
//! re-reads the user's current role (see [`crate::principal`]).
//! Password hashing lives in [`crate::password`].

use hyper::http::HeaderMap;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::config::Auth as AuthConfig;
use crate::error::{Error, Result};

const MIN_SECRET_LENGTH: usize = 32;

/// Name of the cookie the login endpoint sets.
pub const COOKIE_NAME: &str = "access_token";

fn validate_secret(config: &AuthConfig) -> Result<()> {
    if config.jwt_secret.len() < MIN_SECRET_LENGTH {
        return Err(Error::Config(format!(
            "JWT secret must be at least {MIN_SECRET_LENGTH} bytes"
        )));
    }
    Ok(())
}

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,
    /// Role name at the time the token was issued
    pub role: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// Create a signed token for `subject`.
pub fn create_token(config: &AuthConfig, subject: &str, role: &str) -> Result<String> {
    validate_secret(config)?;
    let now = jiff::Timestamp::now();
    let exp = jiff::Span::new()
        .try_minutes(i64::from(config.token_expiry_minutes))
        .and_then(|lifetime| now.checked_add(lifetime))
        .map_err(|e| Error::Config(format!("Token expiry out of range: {e}")))?;

    let claims = Claims {
        sub: subject.to_string(),
        role: role.to_string(),
        exp: exp.as_second(),
        iat: now.as_second(),
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| Error::Internal(format!("Token creation failed: {e}")))?;

    Ok(token)
}

/// Verify and decode a token.
///
/// Every validation failure (bad signature, expired, malformed, wrong
/// algorithm) is reported as [`Error::Unauthenticated`].
pub fn verify_token(config: &AuthConfig, token: &str) -> Result<Claims> {
    validate_secret(config)?;
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        tracing::debug!("Token rejected: {e}");
        Error::Unauthenticated
    })?;

    Ok(token_data.claims)
}

/// Extract the raw token from request headers.
///
/// `Authorization: Bearer <token>` wins (scheme is case-insensitive);
/// otherwise the `access_token` cookie is used.
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    if let Some(auth_header) = headers.get("Authorization").and_then(|h| h.to_str().ok()) {
        return auth_header
            .get(..7)
            .filter(|p| p.eq_ignore_ascii_case("bearer "))
            .map(|_| auth_header[7..].trim())
            .filter(|t| !t.is_empty());
    }

    headers
        .get_all(hyper::header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == COOKIE_NAME)
        .map(|(_, value)| value)
        .filter(|t| !t.is_empty())
}

/// `Set-Cookie` value carrying a freshly issued token.
pub fn session_cookie(config: &AuthConfig, token: &str) -> String {
    let max_age = config.token_expiry_minutes as u64 * 60;
    let secure = if config.cookie_secure { "; Secure" } else { "" };
    format!("{COOKIE_NAME}={token}; Path=/; Max-Age={max_age}; HttpOnly; SameSite=Lax{secure}")
}

/// `Set-Cookie` value that clears the session cookie.
pub fn clear_cookie(config: &AuthConfig) -> String {
    let secure = if config.cookie_secure { "; Secure" } else { "" };
    format!("{COOKIE_NAME}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax{secure}")
}
