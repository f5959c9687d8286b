//! Internal failures must not leak details to clients.

use http_body_util::BodyExt;
use warden::Error;

fn body_of(err: Error) -> (u16, String) {
    let resp = err.into_response();
    let status = resp.status().as_u16();
    let bytes = tokio_test::block_on(resp.into_body().collect())
        .unwrap()
        .to_bytes();
    (status, String::from_utf8_lossy(&bytes).into_owned())
}

#[test]
fn internal_error_hides_sql() {
    let (status, body) =
        body_of(Error::Internal("Failed to query SELECT * FROM users WHERE id = 'x'".into()));
    assert_eq!(status, 500);
    assert!(!body.contains("SELECT"), "SQL leaked: {body}");
    assert!(body.contains("Internal server error"));
}

#[test]
fn io_error_hides_paths() {
    let io = std::io::Error::new(
        std::io::ErrorKind::NotFound,
        "No such file: /etc/warden/config.toml",
    );
    let (status, body) = body_of(Error::Io(io));
    assert_eq!(status, 500);
    assert!(!body.contains("/etc/warden"), "path leaked: {body}");
}

#[test]
fn client_errors_keep_their_message() {
    let (status, body) = body_of(Error::missing_permission("item:delete"));
    assert_eq!(status, 403);
    assert!(body.contains("item:delete"));

    let (status, body) = body_of(Error::InvalidCredentials);
    assert_eq!(status, 401);
    assert!(body.contains("Incorrect username or password"));
}
