//! Database connection abstraction.
//!
//! Supports multiple backends:
//! - Local SQLite file: `path/to/db.sqlite` or `file:path` or `sqlite://path`
//! - In-memory: `:memory:`
//! - Remote Turso: `libsql://...` or `https://...` (requires TURSO_AUTH_TOKEN env var)

use std::sync::Arc;
use std::time::Duration;

use libsql::{Builder, Connection, Database, Transaction, TransactionBehavior};

/// Shared database handle held by the server and cloned into each request.
pub type Handle = Arc<Database>;

/// How long a connection waits on another writer's lock before failing.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Schema for the RBAC tables and the inventory.
///
/// Every foreign key cascades so that deleting a role removes its users,
/// deleting a user removes their items, and deleting either side of
/// `role_permissions` removes the link.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS permissions (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL UNIQUE,
    description TEXT
);

CREATE TABLE IF NOT EXISTS roles (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL UNIQUE,
    description TEXT
);

CREATE TABLE IF NOT EXISTS role_permissions (
    role_id       INTEGER NOT NULL REFERENCES roles(id) ON DELETE CASCADE,
    permission_id INTEGER NOT NULL REFERENCES permissions(id) ON DELETE CASCADE,
    PRIMARY KEY (role_id, permission_id)
);

CREATE TABLE IF NOT EXISTS users (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    username      TEXT NOT NULL UNIQUE,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    role_id       INTEGER NOT NULL REFERENCES roles(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS items (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    description TEXT,
    sku         TEXT NOT NULL UNIQUE,
    quantity    INTEGER NOT NULL DEFAULT 0,
    owner_id    INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_users_role ON users(role_id);
CREATE INDEX IF NOT EXISTS idx_items_owner ON items(owner_id);
"#;

/// Connect to the database.
///
/// # URL formats
/// - Local file: `mydata.db`, `file:path/to/db.sqlite`, `sqlite://path`
/// - In-memory: `:memory:`
/// - Remote Turso: `libsql://your-db.turso.io` (requires `TURSO_AUTH_TOKEN` env var)
pub async fn connect(url: &str) -> crate::Result<Database> {
    let db = if url.starts_with("libsql://") || url.starts_with("https://") {
        let token = std::env::var("TURSO_AUTH_TOKEN").map_err(|_| {
            crate::Error::Config("TURSO_AUTH_TOKEN not set for remote database".into())
        })?;
        Builder::new_remote(url.to_string(), token).build().await?
    } else if url == ":memory:" {
        Builder::new_local(":memory:").build().await?
    } else {
        // Local file - strip sqlite:// or file: prefix if present
        let path = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("file:"))
            .unwrap_or(url);
        Builder::new_local(path).build().await?
    };

    Ok(db)
}

/// Open a connection with foreign key enforcement enabled.
///
/// Contending writers wait up to [`BUSY_TIMEOUT`] for the lock instead of
/// failing with `SQLITE_BUSY`.
pub async fn connection(db: &Database) -> crate::Result<Connection> {
    let conn = db.connect()?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.execute_batch("PRAGMA foreign_keys = ON;").await?;
    Ok(conn)
}

/// Begin a transaction that takes the write lock up front.
///
/// Overlapping writers queue on the lock and commit one after another, so
/// the last one to commit wins.
pub async fn write(conn: &Connection) -> crate::Result<Transaction> {
    Ok(conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .await?)
}

/// Create all tables and indexes if they do not exist yet.
pub async fn migrate(conn: &Connection) -> crate::Result<()> {
    conn.execute_batch(SCHEMA).await?;
    tracing::debug!("Schema is up to date");
    Ok(())
}

/// Open an in-memory database with the schema applied.
///
/// Each `:memory:` connection is its own database, so the returned
/// connection must be reused for the lifetime of the test or tool.
pub async fn memory() -> crate::Result<Connection> {
    let db = connect(":memory:").await?;
    let conn = connection(&db).await?;
    migrate(&conn).await?;
    Ok(conn)
}
