//! Shared fixtures.

use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};

use libsql::Connection;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use warden::config::{Auth, Config, Database, Server as ServerConfig};
use warden::principal::{self, Principal};
use warden::store::items::NewItem;
use warden::store::{permissions, roles, users};
use warden::{api, catalog, db, password, server};

pub const SECRET: &str = "test-secret-that-is-at-least-32b!";
pub const PASSWORD: &str = "password123";

pub fn auth_config() -> Auth {
    Auth {
        jwt_secret: SECRET.to_string(),
        ..Default::default()
    }
}

/// Hashing is slow; every fixture user shares one hash of [`PASSWORD`].
fn password_hash() -> &'static str {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| password::hash(PASSWORD).unwrap())
}

/// Schema, catalog and an `admin` user.
pub async fn seed(conn: &Connection) {
    db::migrate(conn).await.unwrap();
    catalog::seed(conn).await.unwrap();
    catalog::seed_admin(conn, "admin", "admin@company.com", PASSWORD)
        .await
        .unwrap();
}

/// An in-memory database seeded like a fresh install.
pub async fn seeded() -> Connection {
    let conn = db::memory().await.unwrap();
    seed(&conn).await;
    conn
}

pub async fn admin(conn: &Connection) -> Principal {
    principal::load(conn, "admin").await.unwrap()
}

/// Insert a user holding `role` and return it as a principal.
pub async fn add_user(conn: &Connection, username: &str, role: &str) -> Principal {
    let role = roles::get_by_name(conn, role).await.unwrap().unwrap();
    let email = format!("{username}@company.com");
    users::insert(conn, username, &email, password_hash(), role.id)
        .await
        .unwrap();
    principal::load(conn, username).await.unwrap()
}

/// Reload a principal, as the next request would.
pub async fn reload(conn: &Connection, principal: &Principal) -> Principal {
    principal::load(conn, principal.username()).await.unwrap()
}

pub async fn role_id(conn: &Connection, name: &str) -> i64 {
    roles::get_by_name(conn, name).await.unwrap().unwrap().id
}

pub async fn permission_id(conn: &Connection, name: &str) -> i64 {
    permissions::get_by_name(conn, name)
        .await
        .unwrap()
        .unwrap()
        .id
}

pub fn new_item(name: &str, sku: &str) -> NewItem {
    NewItem {
        name: name.to_string(),
        description: None,
        sku: sku.to_string(),
        quantity: 1,
    }
}

// ---------------------------------------------------------------------------
// HTTP harness
// ---------------------------------------------------------------------------

/// A running server backed by a seeded database file.
pub struct App {
    pub server: server::Server,
    _dir: tempfile::TempDir,
}

impl App {
    pub fn addr(&self) -> SocketAddr {
        self.server.addr()
    }

    pub async fn shutdown(self) {
        self.server.shutdown().await.unwrap();
    }
}

pub async fn start_app() -> App {
    start_app_with(ServerConfig::default()).await
}

pub async fn start_app_with(server_cfg: ServerConfig) -> App {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            ..server_cfg
        },
        database: Database {
            url: dir.path().join("warden.db").display().to_string(),
        },
        auth: auth_config(),
        ..Default::default()
    };

    let db = Arc::new(db::connect(&config.database.url).await.unwrap());
    let conn = db::connection(&db).await.unwrap();
    seed(&conn).await;

    let router = api::router(&config).into_handle();
    let server = server::start(Arc::new(config), Some(db), router)
        .await
        .expect("failed to start test server");
    App { server, _dir: dir }
}

/// A parsed HTTP/1.1 response.
pub struct Reply {
    pub status: u16,
    pub head: String,
    pub body: String,
}

impl Reply {
    pub fn parse(raw: &[u8]) -> Self {
        let text = String::from_utf8_lossy(raw);
        let (head, body) = text.split_once("\r\n\r\n").unwrap_or((text.as_ref(), ""));
        let status = head
            .split_whitespace()
            .nth(1)
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        Self {
            status,
            head: head.to_string(),
            body: body.to_string(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.head.lines().skip(1).find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case(name)
                .then_some(value.trim())
        })
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body)
            .unwrap_or_else(|e| panic!("body is not JSON ({e}): {}", self.body))
    }
}

/// Send raw bytes with a fresh connection and read until the server closes.
pub async fn raw(addr: SocketAddr, payload: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.expect("failed to connect");
    stream.write_all(payload).await.expect("failed to write");

    let mut buf = Vec::new();
    let _ = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        stream.read_to_end(&mut buf),
    )
    .await;
    buf
}

/// Send a JSON request, optionally authenticated with a bearer token.
pub async fn call(
    addr: SocketAddr,
    method: &str,
    path: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Reply {
    let mut req = format!("{method} {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n");
    if let Some(token) = token {
        req.push_str(&format!("Authorization: Bearer {token}\r\n"));
    }
    let body = body.map(|b| b.to_string()).unwrap_or_default();
    if !body.is_empty() {
        req.push_str("Content-Type: application/json\r\n");
    }
    req.push_str(&format!("Content-Length: {}\r\n\r\n{body}", body.len()));
    Reply::parse(&raw(addr, req.as_bytes()).await)
}

/// Log in over HTTP and return the access token.
pub async fn login(addr: SocketAddr, username: &str, password: &str) -> String {
    let reply = call(
        addr,
        "POST",
        "/api/auth/login",
        None,
        Some(serde_json::json!({ "username": username, "password": password })),
    )
    .await;
    assert_eq!(reply.status, 200, "login failed: {}", reply.body);
    reply.json()["access_token"]
        .as_str()
        .expect("access_token missing")
        .to_string()
}
