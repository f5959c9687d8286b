//! Warden server binary.
//!
//! # Configuration
//!
//! Loaded in layers, later ones winning:
//!
//! 1. Default values
//! 2. `--config` TOML file (also: `WARDEN_CONFIG`)
//! 3. Environment: `WARDEN_HOST`, `WARDEN_PORT`, `DATABASE_URL`,
//!    `WARDEN_JWT_SECRET`, `WARDEN_TOKEN_EXPIRY_MINUTES`
//! 4. CLI flags
//!
//! Log output is controlled by `RUST_LOG` (default `info`).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use warden::config::{Config, Loader, Overrides};
use warden::{api, catalog, db, server};

/// Role-based access control for an inventory API.
#[derive(Parser, Debug)]
#[command(name = "warden")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long, global = true, env = "WARDEN_CONFIG")]
    config: Option<PathBuf>,

    /// Database URL (file path, `:memory:` or `libsql://`)
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// JWT signing secret, at least 32 bytes
    #[arg(long, global = true)]
    jwt_secret: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Migrate, seed the permission catalog and serve HTTP
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Create an ADMIN user if the username is free
    SeedAdmin {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        /// Also read from WARDEN_ADMIN_PASSWORD to keep it out of shell history
        #[arg(long, env = "WARDEN_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

fn load_config(args: &Args) -> Result<Config> {
    let (host, port) = match &args.command {
        Command::Serve { host, port } => (host.as_deref(), *port),
        Command::SeedAdmin { .. } => (None, None),
    };
    let overrides = Overrides {
        host,
        port,
        database_url: args.database_url.as_deref(),
        jwt_secret: args.jwt_secret.as_deref(),
    };
    Loader::default()
        .load(args.config.as_deref(), &overrides)
        .context("failed to load configuration")
}

/// Connect, migrate and seed; returns the database handle.
async fn prepare(config: &Config) -> Result<db::Handle> {
    let db = db::connect(&config.database.url)
        .await
        .with_context(|| format!("failed to open database {}", config.database.url))?;
    let db = Arc::new(db);

    let conn = db::connection(&db).await?;
    db::migrate(&conn).await.context("migration failed")?;
    catalog::seed(&conn).await.context("seeding failed")?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let db = prepare(&config).await?;

    match args.command {
        Command::Serve { .. } => {
            let router = api::router(&config).into_handle();
            info!(database = %config.database.url, "Starting warden");
            server::run(Arc::new(config), Some(db), router).await?;
        }
        Command::SeedAdmin {
            username,
            email,
            password,
        } => {
            let conn = db::connection(&db).await?;
            let created = catalog::seed_admin(&conn, &username, &email, &password).await?;
            if created {
                println!("Created admin user {username}");
            } else {
                println!("User {username} already exists");
            }
        }
    }
    Ok(())
}
