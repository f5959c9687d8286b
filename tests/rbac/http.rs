//! End-to-end flows over HTTP.

use std::collections::BTreeSet;

use serde_json::json;
use warden::config::Server as ServerConfig;

use super::support::{PASSWORD, call, login, raw, start_app, start_app_with};

#[tokio::test]
async fn welcome_and_openapi_are_public() {
    let app = start_app().await;
    let addr = app.addr();

    let welcome = call(addr, "GET", "/", None, None).await;
    let spec = call(addr, "GET", "/api/openapi.json", None, None).await;
    app.shutdown().await;

    assert_eq!(welcome.status, 200);
    assert_eq!(welcome.json()["docs"], "/api/openapi.json");

    assert_eq!(spec.status, 200);
    let spec = spec.json();
    assert_eq!(spec["info"]["title"], "Inventory API");
    assert_eq!(
        spec["paths"]["/api/items/{id}"]["delete"]["x-permission"],
        "item:delete"
    );
    assert!(spec["paths"]["/api/roles/{id}/permissions"]["put"].is_object());
    assert!(spec["paths"]["/api/auth/login"]["post"]["requestBody"].is_object());
}

#[tokio::test]
async fn login_sets_cookie_and_me_resolves_either_way() {
    let app = start_app().await;
    let addr = app.addr();

    let reply = call(
        addr,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": "admin", "password": PASSWORD })),
    )
    .await;
    assert_eq!(reply.status, 200, "{}", reply.body);
    let token = reply.json()["access_token"].as_str().unwrap().to_string();
    assert_eq!(reply.json()["token_type"], "bearer");
    let cookie = reply.header("set-cookie").unwrap().to_string();
    assert!(cookie.starts_with(&format!("access_token={token}")));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));

    let me = call(addr, "GET", "/api/auth/me", Some(&token), None).await;
    let by_cookie = raw(
        addr,
        format!(
            "GET /api/auth/me HTTP/1.1\r\nHost: localhost\r\nCookie: access_token={token}\r\nConnection: close\r\n\r\n"
        )
        .as_bytes(),
    )
    .await;
    app.shutdown().await;

    assert_eq!(me.status, 200);
    assert_eq!(me.json()["user"]["username"], "admin");
    assert_eq!(me.json()["user"]["role"]["name"], "ADMIN");
    assert!(
        me.json()["permissions"]
            .as_array()
            .unwrap()
            .contains(&json!("role:assign"))
    );
    let by_cookie = String::from_utf8_lossy(&by_cookie);
    assert!(by_cookie.starts_with("HTTP/1.1 200"), "{by_cookie}");
}

#[tokio::test]
async fn missing_or_bad_credentials_are_401() {
    let app = start_app().await;
    let addr = app.addr();

    let anonymous = call(addr, "GET", "/api/items", None, None).await;
    let garbage = call(addr, "GET", "/api/items", Some("not.a.jwt"), None).await;
    let wrong_password = call(
        addr,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": "admin", "password": "letmein!!" })),
    )
    .await;
    app.shutdown().await;

    for reply in [&anonymous, &garbage, &wrong_password] {
        assert_eq!(reply.status, 401, "{}", reply.body);
        assert_eq!(reply.header("www-authenticate"), Some("Bearer"));
    }
    assert_eq!(
        wrong_password.json()["error"],
        "Incorrect username or password"
    );
}

#[tokio::test]
async fn logout_clears_the_cookie() {
    let app = start_app().await;
    let reply = call(app.addr(), "POST", "/api/auth/logout", None, None).await;
    app.shutdown().await;

    assert_eq!(reply.status, 204);
    let cookie = reply.header("set-cookie").unwrap();
    assert!(cookie.starts_with("access_token=;"));
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn staff_can_create_but_not_delete_items() {
    let app = start_app().await;
    let addr = app.addr();
    let admin = login(addr, "admin", PASSWORD).await;

    let created = call(
        addr,
        "POST",
        "/api/users",
        Some(&admin),
        Some(json!({
            "username": "staff_joko",
            "email": "joko@company.com",
            "password": PASSWORD,
        })),
    )
    .await;
    assert_eq!(created.status, 201, "{}", created.body);
    assert_eq!(created.json()["role"]["name"], "STAFF");
    assert!(created.json().get("password_hash").is_none());

    let joko = login(addr, "staff_joko", PASSWORD).await;
    let item = call(
        addr,
        "POST",
        "/api/items",
        Some(&joko),
        Some(json!({ "name": "Pallet", "sku": "PAL-001", "quantity": 4 })),
    )
    .await;
    assert_eq!(item.status, 201, "{}", item.body);
    let id = item.json()["id"].as_i64().unwrap();
    assert_eq!(item.json()["owner_id"], created.json()["id"]);

    let listed = call(addr, "GET", "/api/items", Some(&joko), None).await;
    assert_eq!(listed.json()["total"], 1);

    let path = format!("/api/items/{id}");
    let denied = call(addr, "DELETE", &path, Some(&joko), None).await;
    let deleted = call(addr, "DELETE", &path, Some(&admin), None).await;
    let gone = call(addr, "GET", &path, Some(&admin), None).await;
    app.shutdown().await;

    assert_eq!(denied.status, 403);
    assert!(denied.json()["error"].as_str().unwrap().contains("item:delete"));
    assert_eq!(deleted.status, 204);
    assert!(deleted.body.is_empty());
    assert_eq!(gone.status, 404);
}

#[tokio::test]
async fn role_permission_links_over_http() {
    let app = start_app().await;
    let addr = app.addr();
    let admin = login(addr, "admin", PASSWORD).await;

    let role = call(
        addr,
        "POST",
        "/api/roles",
        Some(&admin),
        Some(json!({ "name": "clerk" })),
    )
    .await;
    assert_eq!(role.status, 201, "{}", role.body);
    assert_eq!(role.json()["name"], "CLERK");
    let id = role.json()["id"].as_i64().unwrap();

    let synced = call(
        addr,
        "PUT",
        &format!("/api/roles/{id}/permissions"),
        Some(&admin),
        Some(json!({ "permission_ids": [1, 2] })),
    )
    .await;
    assert_eq!(synced.status, 200, "{}", synced.body);

    let added = call(
        addr,
        "POST",
        &format!("/api/roles/{id}/permissions/3"),
        Some(&admin),
        None,
    )
    .await;
    let removed = call(
        addr,
        "DELETE",
        &format!("/api/roles/{id}/permissions/1"),
        Some(&admin),
        None,
    )
    .await;
    let missing = call(
        addr,
        "POST",
        &format!("/api/roles/{id}/permissions/9999"),
        Some(&admin),
        None,
    )
    .await;
    let detail = call(addr, "GET", &format!("/api/roles/{id}"), Some(&admin), None).await;
    app.shutdown().await;

    assert_eq!(added.status, 204);
    assert_eq!(removed.status, 204);
    assert_eq!(missing.status, 404);
    let ids: BTreeSet<i64> = detail.json()["permissions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, BTreeSet::from([2, 3]));
}

#[tokio::test]
async fn pagination_and_path_parameters_are_validated() {
    let app = start_app().await;
    let addr = app.addr();
    let admin = login(addr, "admin", PASSWORD).await;

    let page = call(addr, "GET", "/api/permissions?skip=2&limit=5", Some(&admin), None).await;
    let bad_limit = call(addr, "GET", "/api/permissions?limit=lots", Some(&admin), None).await;
    let bad_id = call(addr, "GET", "/api/items/abc", Some(&admin), None).await;
    app.shutdown().await;

    assert_eq!(page.status, 200);
    let page = page.json();
    assert_eq!(page["data"].as_array().unwrap().len(), 5);
    assert_eq!(page["total"], warden::catalog::PERMISSIONS.len());
    assert_eq!((page["skip"].as_i64(), page["limit"].as_i64()), (Some(2), Some(5)));

    assert_eq!(bad_limit.status, 400);
    assert_eq!(bad_id.status, 400);
}

#[tokio::test]
async fn login_is_rate_limited_per_address() {
    let app = start_app_with(ServerConfig {
        login_rate_limit: 2,
        login_rate_window_secs: 60,
        ..Default::default()
    })
    .await;
    let addr = app.addr();

    let mut statuses = Vec::new();
    let mut retry_after = None;
    for _ in 0..3 {
        let reply = call(
            addr,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "username": "admin", "password": "wrong-password" })),
        )
        .await;
        statuses.push(reply.status);
        if reply.status == 429 {
            retry_after = reply.header("retry-after").map(str::to_string);
        }
    }
    app.shutdown().await;

    assert_eq!(statuses, [401, 401, 429]);
    assert!(retry_after.is_some_and(|s| s.parse::<u64>().is_ok()));
}
