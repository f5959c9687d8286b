//! Token signing and extraction.

use warden::auth;
use warden::config::Auth;

use super::support::{SECRET, auth_config, seeded};

#[test]
fn short_or_empty_secret_is_rejected() {
    for secret in ["", "x", "thirty-one-bytes-is-not-enough"] {
        let config = Auth {
            jwt_secret: secret.to_string(),
            ..Default::default()
        };
        assert!(
            auth::create_token(&config, "admin", "ADMIN").is_err(),
            "secret {secret:?} should be rejected"
        );
    }
}

/// A token forged with `"alg":"none"` must not verify.
#[test]
fn none_algorithm_is_rejected() {
    use base64::Engine;
    let engine = base64::engine::general_purpose::URL_SAFE_NO_PAD;
    let header = engine.encode(r#"{"alg":"none","typ":"JWT"}"#);
    let payload = engine.encode(
        serde_json::json!({"sub": "admin", "role": "ADMIN", "exp": 9_999_999_999i64, "iat": 1_700_000_000})
            .to_string(),
    );
    let forged = format!("{header}.{payload}.");

    assert!(auth::verify_token(&auth_config(), &forged).is_err());
}

#[test]
fn rotating_the_secret_invalidates_tokens() {
    let old = auth_config();
    let new = Auth {
        jwt_secret: "another-secret-that-is-32-bytes!!".to_string(),
        ..Default::default()
    };
    let token = auth::create_token(&old, "staff_joko", "STAFF").unwrap();
    assert!(auth::verify_token(&new, &token).is_err());
}

/// RFC 7235: the auth-scheme is case-insensitive.
#[test]
fn bearer_scheme_is_case_insensitive() {
    let token = auth::create_token(&auth_config(), "staff_joko", "STAFF").unwrap();
    let mut headers = hyper::header::HeaderMap::new();
    headers.insert(
        hyper::header::AUTHORIZATION,
        format!("bearer {token}").parse().unwrap(),
    );
    let token = auth::extract_token(&headers).unwrap();
    let claims = auth::verify_token(&auth_config(), token).unwrap();
    assert_eq!(claims.sub, "staff_joko");
}

#[test]
fn header_wins_over_cookie() {
    let config = auth_config();
    let from_header = auth::create_token(&config, "admin", "ADMIN").unwrap();
    let from_cookie = auth::create_token(&config, "staff_joko", "STAFF").unwrap();
    let mut headers = hyper::header::HeaderMap::new();
    headers.insert(
        hyper::header::AUTHORIZATION,
        format!("Bearer {from_header}").parse().unwrap(),
    );
    headers.insert(
        hyper::header::COOKIE,
        format!("theme=dark; access_token={from_cookie}").parse().unwrap(),
    );
    assert_eq!(auth::extract_token(&headers), Some(from_header.as_str()));

    headers.remove(hyper::header::AUTHORIZATION);
    assert_eq!(auth::extract_token(&headers), Some(from_cookie.as_str()));
}

#[tokio::test]
async fn login_issues_a_resolvable_token() {
    use warden::Error;
    use warden::service::auth::{Credentials, login};

    let conn = seeded().await;
    let config = auth_config();

    let bad = Credentials {
        username: "admin".into(),
        password: "wrong-password".into(),
    };
    assert!(matches!(
        login(&conn, &config, &bad).await.unwrap_err(),
        Error::InvalidCredentials
    ));
    let unknown = Credentials {
        username: "nobody".into(),
        password: "password123".into(),
    };
    assert!(matches!(
        login(&conn, &config, &unknown).await.unwrap_err(),
        Error::InvalidCredentials
    ));

    let good = Credentials {
        username: "admin".into(),
        password: "password123".into(),
    };
    let session = login(&conn, &config, &good).await.unwrap();
    assert_eq!(session.token_type, "bearer");
    assert_eq!(session.expires_in, 3600);

    let principal = warden::principal::resolve(&conn, &config, &session.access_token)
        .await
        .unwrap();
    assert!(principal.is_admin());
    assert_eq!(principal.permissions.len(), warden::catalog::PERMISSIONS.len());
    assert_ne!(SECRET, session.access_token);
}
