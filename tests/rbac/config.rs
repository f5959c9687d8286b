//! Configuration layering and secret handling.

use std::io::Write;

use warden::config::{Auth, Loader, Overrides};

#[test]
fn jwt_secret_is_never_read_from_the_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[auth]
jwt_secret = "should_be_stripped_from_the_file!!"
token_expiry_minutes = 30
"#
    )
    .unwrap();

    let loader = Loader::new("CFGSTRIP");
    let err = loader
        .load(Some(file.path()), &Overrides::default())
        .unwrap_err();
    assert!(err.to_string().contains("CFGSTRIP_JWT_SECRET"));

    let config = loader
        .load(
            Some(file.path()),
            &Overrides {
                jwt_secret: Some("cli_override_secret"),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(config.auth.jwt_secret, "cli_override_secret");
    assert_eq!(config.auth.token_expiry_minutes, 30);
}

#[test]
fn debug_output_hides_the_secret() {
    let auth = Auth {
        jwt_secret: "SUPER_SECRET_VALUE".to_string(),
        ..Default::default()
    };
    let config = warden::Config {
        auth,
        ..Default::default()
    };
    assert!(!format!("{config:?}").contains("SUPER_SECRET_VALUE"));
}

#[test]
fn malformed_file_is_a_config_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[server\nport = ").unwrap();
    let err = Loader::new("CFGBAD")
        .load(
            Some(file.path()),
            &Overrides {
                jwt_secret: Some("cli_override_secret"),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, warden::Error::Config(_)));
}

#[test]
fn zero_token_expiry_is_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[auth]\ntoken_expiry_minutes = 0").unwrap();
    let err = Loader::new("CFGZERO")
        .load(
            Some(file.path()),
            &Overrides {
                jwt_secret: Some("cli_override_secret"),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(err.to_string().contains("token_expiry_minutes"));
}

#[test]
fn oversized_token_expiry_is_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[auth]\ntoken_expiry_minutes = 4000000000").unwrap();
    let err = Loader::new("CFGHUGE")
        .load(
            Some(file.path()),
            &Overrides {
                jwt_secret: Some("cli_override_secret"),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(err.to_string().contains("at most"));
}

/// A config built by hand skips the loader; issuing must still not panic.
#[test]
fn unrepresentable_expiry_is_an_error_not_a_panic() {
    let config = Auth {
        jwt_secret: "test-secret-that-is-at-least-32b!".to_string(),
        token_expiry_minutes: u32::MAX,
        ..Default::default()
    };
    assert!(warden::auth::create_token(&config, "admin", "ADMIN").is_err());
}
