//! Identity resolution: token -> authenticated principal.
//!
//! A [`Principal`] is built fresh for every request from the current
//! database state. Nothing about the role or its permissions is trusted
//! from the token, so revoking a permission takes effect on the next
//! request rather than when the token expires.

use std::collections::BTreeSet;

use libsql::Connection;
use schemars::JsonSchema;
use serde::Serialize;

use crate::auth;
use crate::config::Auth as AuthConfig;
use crate::graph;
use crate::store::roles::Role;
use crate::store::users::{self, User};
use crate::{Error, Result};

/// The authenticated identity making a request, with its role's
/// permission names loaded eagerly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct Principal {
    pub user: User,
    pub permissions: BTreeSet<String>,
}

impl Principal {
    pub fn id(&self) -> i64 {
        self.user.id
    }

    pub fn username(&self) -> &str {
        &self.user.username
    }

    pub fn role(&self) -> &Role {
        &self.user.role
    }

    pub fn is_admin(&self) -> bool {
        self.user.role.is_admin()
    }

    /// Whether the principal's role holds `permission`, by exact name.
    pub fn holds(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }
}

/// Load the principal for a username. `Unauthenticated` if the user is gone.
pub async fn load(conn: &Connection, username: &str) -> Result<Principal> {
    let user = users::get_by_username(conn, username)
        .await?
        .ok_or(Error::Unauthenticated)?;
    let permissions = graph::permission_names_of(conn, user.role.id).await?;
    Ok(Principal { user, permissions })
}

/// Resolve a raw token into a principal.
///
/// Fails with `Unauthenticated` for a malformed, expired or mis-signed
/// token, and for a token whose subject no longer exists.
pub async fn resolve(conn: &Connection, config: &AuthConfig, token: &str) -> Result<Principal> {
    let claims = auth::verify_token(config, token)?;
    let principal = load(conn, &claims.sub).await.inspect_err(|e| {
        if matches!(e, Error::Unauthenticated) {
            tracing::info!(subject = %claims.sub, "Token subject no longer exists");
        }
    })?;
    Ok(principal)
}

/// Resolve the principal from request headers (bearer token or cookie).
pub async fn from_headers(
    conn: &Connection,
    config: &AuthConfig,
    headers: &hyper::http::HeaderMap,
) -> Result<Principal> {
    let token = auth::extract_token(headers).ok_or(Error::Unauthenticated)?;
    resolve(conn, config, token).await
}
