//! Configuration loading with layered overrides.
//!
//! Config is loaded in order (each layer overrides the previous):
//! 1. Default values
//! 2. Config file (TOML)
//! 3. Environment variables
//! 4. CLI arguments
//!
//! JWT secret is never read from config files - it must come from
//! environment variable or CLI argument.
//!
//! The loaded [`Config`] is immutable and shared as [`SharedConfig`].

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Configuration shared between the server and every request context.
pub type SharedConfig = Arc<Config>;

/// Server configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: Server,
    #[serde(default)]
    pub database: Database,
    #[serde(default)]
    pub auth: Auth,
    #[serde(default)]
    pub rbac: Rbac,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Origins allowed to receive `Access-Control-Allow-Origin`.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Login attempts allowed per client IP per window.
    #[serde(default = "default_login_rate_limit")]
    pub login_rate_limit: u32,
    #[serde(default = "default_login_rate_window_secs")]
    pub login_rate_window_secs: u64,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
            login_rate_limit: default_login_rate_limit(),
            login_rate_window_secs: default_login_rate_window_secs(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_login_rate_limit() -> u32 {
    10
}

fn default_login_rate_window_secs() -> u64 {
    60
}

/// Database connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Database {
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for Database {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "warden.db".to_string()
}

/// Authentication settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct Auth {
    /// JWT secret for token signing/verification.
    /// Must be provided via environment variable or CLI - never from config file.
    #[serde(default)]
    pub jwt_secret: String,

    /// Token lifetime in minutes.
    #[serde(default = "default_token_expiry_minutes")]
    pub token_expiry_minutes: u32,

    /// Mark the session cookie `Secure`.
    #[serde(default)]
    pub cookie_secure: bool,
}

impl Default for Auth {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_expiry_minutes: default_token_expiry_minutes(),
            cookie_secure: false,
        }
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Auth")
            .field("jwt_secret", &"[redacted]")
            .field("token_expiry_minutes", &self.token_expiry_minutes)
            .field("cookie_secure", &self.cookie_secure)
            .finish()
    }
}

fn default_token_expiry_minutes() -> u32 {
    60
}

/// Longest accepted token lifetime: one year.
pub const MAX_TOKEN_EXPIRY_MINUTES: u32 = 60 * 24 * 366;

/// Role-based access control settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rbac {
    /// Role given to users created without an explicit role.
    #[serde(default = "default_role")]
    pub default_role: String,
}

impl Default for Rbac {
    fn default() -> Self {
        Self {
            default_role: default_role(),
        }
    }
}

fn default_role() -> String {
    crate::catalog::STAFF_ROLE.to_string()
}

/// CLI-level overrides, applied last.
#[derive(Debug, Clone, Default)]
pub struct Overrides<'a> {
    pub host: Option<&'a str>,
    pub port: Option<u16>,
    pub database_url: Option<&'a str>,
    pub jwt_secret: Option<&'a str>,
}

/// Builder for loading configuration with customizable options.
#[derive(Debug, Clone)]
pub struct Loader {
    /// Environment variable prefix (e.g., "WARDEN" -> WARDEN_HOST, WARDEN_PORT)
    pub env_prefix: String,
    /// Name of the JWT secret environment variable (without prefix)
    pub jwt_secret_env: String,
}

impl Default for Loader {
    fn default() -> Self {
        Self {
            env_prefix: "WARDEN".to_string(),
            jwt_secret_env: "JWT_SECRET".to_string(),
        }
    }
}

impl Loader {
    /// Create a new config loader with the given environment prefix.
    pub fn new(env_prefix: impl Into<String>) -> Self {
        Self {
            env_prefix: env_prefix.into(),
            ..Default::default()
        }
    }

    /// Load configuration from file, environment, and CLI arguments.
    pub fn load(&self, config_path: Option<&Path>, cli: &Overrides<'_>) -> crate::Result<Config> {
        // Start with file config or defaults
        let mut config: Config = if let Some(path) = config_path {
            let content = std::fs::read_to_string(path)
                .map_err(|e| Error::Config(format!("Failed to read config file: {e}")))?;
            toml::from_str(&content)
                .map_err(|e| Error::Config(format!("Failed to parse config: {e}")))?
        } else {
            Config::default()
        };

        // Clear any jwt_secret from config file
        config.auth.jwt_secret = String::new();

        // Override with environment variables
        let prefix = &self.env_prefix;

        if let Ok(host) = std::env::var(format!("{prefix}_HOST")) {
            config.server.host = host;
        }
        if let Ok(port) = std::env::var(format!("{prefix}_PORT"))
            && let Ok(p) = port.parse()
        {
            config.server.port = p;
        }
        if let Ok(minutes) = std::env::var(format!("{prefix}_TOKEN_EXPIRY_MINUTES"))
            && let Ok(m) = minutes.parse()
        {
            config.auth.token_expiry_minutes = m;
        }
        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database.url = url;
        }
        if let Ok(secret) = std::env::var(format!("{}_{}", prefix, self.jwt_secret_env)) {
            config.auth.jwt_secret = secret;
        }

        // Override with CLI arguments
        if let Some(host) = cli.host {
            config.server.host = host.to_string();
        }
        if let Some(port) = cli.port {
            config.server.port = port;
        }
        if let Some(url) = cli.database_url {
            config.database.url = url.to_string();
        }
        if let Some(secret) = cli.jwt_secret {
            config.auth.jwt_secret = secret.to_string();
        }

        // Validate required fields
        if config.auth.jwt_secret.is_empty() {
            return Err(Error::Config(format!(
                "{}_{} must be set via environment variable or --jwt-secret flag",
                prefix, self.jwt_secret_env
            )));
        }
        if config.auth.token_expiry_minutes == 0 {
            return Err(Error::Config(
                "auth.token_expiry_minutes must be greater than zero".to_string(),
            ));
        }
        if config.auth.token_expiry_minutes > MAX_TOKEN_EXPIRY_MINUTES {
            return Err(Error::Config(format!(
                "auth.token_expiry_minutes must be at most {MAX_TOKEN_EXPIRY_MINUTES}"
            )));
        }

        Ok(config)
    }
}
