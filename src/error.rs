//! Error types with HTTP status code mapping.

use hyper::StatusCode;
use hyper::header::{HeaderValue, RETRY_AFTER, WWW_AUTHENTICATE};

use crate::response::HttpResponse;

/// Error type for warden operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // Auth errors
    #[error("Could not validate credentials")]
    Unauthenticated,

    #[error("Incorrect username or password")]
    InvalidCredentials,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    // Data errors
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unsupported media type: expected {expected}")]
    UnsupportedMediaType { expected: String },

    #[error("Too many requests, retry after {retry_after}s")]
    TooManyRequests { retry_after: u64 },

    // Config errors
    #[error("Configuration error: {0}")]
    Config(String),

    // System errors
    #[error("Invalid address: {0}")]
    AddrParse(#[from] std::net::AddrParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] libsql::Error),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Shorthand for a `Forbidden` denial naming the missing permission.
    pub fn missing_permission(permission: &str) -> Self {
        Error::Forbidden(format!("missing permission {permission}"))
    }

    /// Map a storage error to `Conflict` when it is a uniqueness violation.
    ///
    /// `what` names the conflicting field for the client, e.g. `"SKU"`.
    pub fn from_constraint(err: libsql::Error, what: &str) -> Self {
        if err.to_string().contains("UNIQUE constraint failed") {
            Error::Conflict(format!("{what} already exists"))
        } else {
            Error::Database(err)
        }
    }

    /// Map error to HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            // Auth errors -> 401/403
            Error::Unauthenticated | Error::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,

            // Data errors -> 4xx
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::UnsupportedMediaType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Error::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,

            // Config errors -> 500 (shouldn't happen at runtime)
            Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,

            // System errors -> 500
            Error::AddrParse(_)
            | Error::Io(_)
            | Error::Json(_)
            | Error::Database(_)
            | Error::Jwt(_)
            | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Convert error into HTTP response.
    pub fn into_response(self) -> HttpResponse {
        let status = self.status_code();
        let message = if status.is_server_error() {
            tracing::error!("Internal error: {self}");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let mut response = crate::response::error(status, &message);
        let headers = response.headers_mut();
        if status == StatusCode::UNAUTHORIZED {
            headers.insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        if let Error::TooManyRequests { retry_after } = self {
            headers.insert(RETRY_AFTER, HeaderValue::from(retry_after));
        }
        response
    }
}

/// Result type alias using warden's Error.
pub type Result<T> = std::result::Result<T, Error>;
