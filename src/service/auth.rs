//! Login: credentials in, signed token out.

use libsql::Connection;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::Auth as AuthConfig;
use crate::store::users;
use crate::{Error, Result, auth, password};

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Token returned by a successful login.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct Session {
    pub access_token: String,
    pub token_type: &'static str,
    /// Lifetime in seconds.
    pub expires_in: u64,
}

/// Check credentials and issue a token.
///
/// Unknown usernames and wrong passwords are indistinguishable to the caller.
pub async fn login(conn: &Connection, config: &AuthConfig, creds: &Credentials) -> Result<Session> {
    let Some((user, hash)) = users::credentials(conn, &creds.username).await? else {
        tracing::info!(username = %creds.username, "Login failed: unknown user");
        return Err(Error::InvalidCredentials);
    };
    if !password::verify_blocking(&creds.password, &hash).await? {
        tracing::info!(username = %creds.username, "Login failed: bad password");
        return Err(Error::InvalidCredentials);
    }

    let access_token = auth::create_token(config, &user.username, &user.role.name)?;
    tracing::info!(username = %user.username, role = %user.role.name, "Login succeeded");
    Ok(Session {
        access_token,
        token_type: "bearer",
        expires_in: config.token_expiry_minutes as u64 * 60,
    })
}
