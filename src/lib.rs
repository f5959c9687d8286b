//! Warden - role-based access control for an inventory API.
//!
//! Callers authenticate with a signed token; each request resolves the
//! caller to a [`Principal`] whose permissions come from the role graph
//! stored in the database, and every resource operation passes the
//! authorization gate before it touches storage.
//!
//! - **Catalog**: the fixed permission vocabulary and bootstrap seeding
//! - **Store**: libsql persistence for items, users, roles and permissions
//! - **Graph**: role-permission links and role assignment
//! - **Principal** / **Gate**: identity resolution and permission checks
//! - **Service**: ownership-aware resource operations
//! - **Api** / **Router** / **Server**: the hyper HTTP surface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> warden::Result<()> {
//!     let config = warden::Loader::new("WARDEN").load(None, &Default::default())?;
//!     let db = Arc::new(warden::db::connect(&config.database.url).await?);
//!
//!     let conn = warden::db::connection(&db).await?;
//!     warden::db::migrate(&conn).await?;
//!     warden::catalog::seed(&conn).await?;
//!
//!     let router = warden::api::router(&config).into_handle();
//!     warden::server::run(Arc::new(config), Some(db), router).await
//! }
//! ```

pub mod api;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod gate;
pub mod graph;
pub mod module;
pub mod openapi;
pub mod operation;
pub mod password;
pub mod principal;
pub mod procedure;
pub mod rate_limit;
pub mod response;
pub mod router;
pub mod server;
pub mod service;
pub mod store;

// Re-export main types at crate root
pub use config::{Config, Loader, SharedConfig};
pub use db::Handle as DbHandle;
pub use error::{Error, Result};
pub use gate::Requirement;
pub use module::Module;
pub use openapi::Info;
pub use principal::Principal;
pub use procedure::{Empty, Meta, Procedure};
pub use router::{Context, Router};
