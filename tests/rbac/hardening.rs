//! Transport-level protections of the HTTP server.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use warden::config::Server as ServerConfig;

use super::support::{Reply, raw, start_app, start_app_with};

async fn get(addr: std::net::SocketAddr, request: &str) -> (String, Reply) {
    let bytes = raw(addr, request.as_bytes()).await;
    let reply = Reply::parse(&bytes);
    (String::from_utf8_lossy(&bytes).into_owned(), reply)
}

/// Rejected on the declared Content-Length alone, before reading the body.
#[tokio::test]
async fn oversized_body_is_413() {
    let app = start_app().await;
    let (text, reply) = get(
        app.addr(),
        "POST /api/items HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: 10485760\r\nConnection: close\r\n\r\n",
    )
    .await;
    app.shutdown().await;

    assert_eq!(reply.status, 413, "{text}");
}

#[tokio::test]
async fn non_json_body_is_415() {
    let app = start_app().await;
    let (text, reply) = get(
        app.addr(),
        "POST /api/items HTTP/1.1\r\nHost: localhost\r\nContent-Type: text/plain\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello",
    )
    .await;
    app.shutdown().await;

    assert_eq!(reply.status, 415, "{text}");
}

#[tokio::test]
async fn unknown_route_and_wrong_method() {
    let app = start_app().await;
    let addr = app.addr();
    let (_, missing) = get(
        addr,
        "GET /api/warehouses HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await;
    let (_, wrong) = get(
        addr,
        "PUT /api/items HTTP/1.1\r\nHost: localhost\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
    )
    .await;
    app.shutdown().await;

    assert_eq!(missing.status, 404);
    assert_eq!(missing.json()["error"], "Not found");
    assert_eq!(wrong.status, 405);
}

#[tokio::test]
async fn security_headers_on_every_response() {
    let app = start_app().await;
    let addr = app.addr();
    let (_, ok) = get(addr, "GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n").await;
    let (_, denied) = get(
        addr,
        "GET /api/users HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await;
    app.shutdown().await;

    for reply in [&ok, &denied] {
        assert_eq!(reply.header("x-content-type-options"), Some("nosniff"));
        assert_eq!(reply.header("x-frame-options"), Some("DENY"));
        assert_eq!(reply.header("cache-control"), Some("no-store"));
    }
}

#[tokio::test]
async fn request_id_is_propagated_or_generated() {
    let app = start_app().await;
    let addr = app.addr();
    let id = "6f1c2d9e-8a4b-4c3d-9e2f-1a2b3c4d5e6f";
    let (_, echoed) = get(
        addr,
        &format!("GET / HTTP/1.1\r\nHost: localhost\r\nX-Request-Id: {id}\r\nConnection: close\r\n\r\n"),
    )
    .await;
    let (_, replaced) = get(
        addr,
        "GET / HTTP/1.1\r\nHost: localhost\r\nX-Request-Id: <script>\r\nConnection: close\r\n\r\n",
    )
    .await;
    app.shutdown().await;

    assert_eq!(echoed.header("x-request-id"), Some(id));
    let generated = replaced.header("x-request-id").unwrap();
    assert_ne!(generated, "<script>");
    assert!(uuid::Uuid::parse_str(generated).is_ok());
}

#[tokio::test]
async fn cors_follows_the_allowlist() {
    let app = start_app_with(ServerConfig {
        cors_origins: vec!["http://inventory.example".to_string()],
        ..Default::default()
    })
    .await;
    let addr = app.addr();

    let (_, listed) = get(
        addr,
        "GET / HTTP/1.1\r\nHost: localhost\r\nOrigin: http://inventory.example\r\nConnection: close\r\n\r\n",
    )
    .await;
    let (_, unlisted) = get(
        addr,
        "GET / HTTP/1.1\r\nHost: localhost\r\nOrigin: http://evil.example\r\nConnection: close\r\n\r\n",
    )
    .await;
    let (_, preflight) = get(
        addr,
        "OPTIONS /api/items HTTP/1.1\r\nHost: localhost\r\nOrigin: http://inventory.example\r\nAccess-Control-Request-Method: POST\r\nConnection: close\r\n\r\n",
    )
    .await;
    app.shutdown().await;

    assert_eq!(
        listed.header("access-control-allow-origin"),
        Some("http://inventory.example")
    );
    assert_eq!(listed.header("access-control-allow-credentials"), Some("true"));
    assert!(unlisted.header("access-control-allow-origin").is_none());

    assert_eq!(preflight.status, 204);
    assert!(
        preflight
            .header("access-control-allow-methods")
            .is_some_and(|m| m.contains("PATCH"))
    );
    assert_eq!(
        preflight.header("access-control-allow-origin"),
        Some("http://inventory.example")
    );
}

/// A client that stalls mid-headers is disconnected.
#[tokio::test]
async fn stalled_headers_are_dropped() {
    let app = start_app().await;
    let mut stream = TcpStream::connect(app.addr()).await.unwrap();
    stream
        .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\n")
        .await
        .unwrap();

    tokio::time::sleep(std::time::Duration::from_secs(3)).await;

    let mut buf = vec![0u8; 4096];
    let result =
        tokio::time::timeout(std::time::Duration::from_secs(2), stream.read(&mut buf)).await;
    app.shutdown().await;

    match result {
        Ok(Ok(0)) | Ok(Err(_)) => {}
        Ok(Ok(n)) => {
            let resp = String::from_utf8_lossy(&buf[..n]);
            assert!(resp.contains("408"), "expected close or 408, got:\n{resp}");
        }
        Err(_) => panic!("stalled connection was kept open"),
    }
}

/// Past the connection cap, extra clients are refused or get a 503.
#[tokio::test]
async fn excess_connections_are_turned_away() {
    let app = start_app().await;
    let addr = app.addr();

    let mut streams = Vec::new();
    let mut refused = 0usize;
    for _ in 0..200 {
        match TcpStream::connect(addr).await {
            Ok(s) => streams.push(s),
            Err(_) => refused += 1,
        }
    }
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    let mut unavailable = 0usize;
    for mut stream in streams {
        let req = b"GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n";
        if stream.write_all(req).await.is_ok() {
            let mut buf = vec![0u8; 4096];
            if let Ok(Ok(n)) =
                tokio::time::timeout(std::time::Duration::from_secs(5), stream.read(&mut buf)).await
                && String::from_utf8_lossy(&buf[..n]).contains("503")
            {
                unavailable += 1;
            }
        }
    }
    app.shutdown().await;

    assert!(refused + unavailable > 0, "all 200 connections were served");
}
