//! Configuration loading and startup wiring

use std::io::Write;
use std::path::Path;
use warden_server::{AppState, LoginRequest, RegisterRequest, ServerConfig};

fn write_config(dir: &Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("warden.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(body.as_bytes()).unwrap();
    path
}

#[test]
fn test_load_reads_file_and_keeps_defaults() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = write_config(
        temp_dir.path(),
        r#"
        [auth]
        jwt_secret = "from-file"
        bcrypt_cost = 4

        [audit]
        max_entries = 50
        "#,
    );

    let config = ServerConfig::load(Some(&path)).unwrap();

    assert_eq!(config.auth.jwt_secret, "from-file");
    assert_eq!(config.auth.bcrypt_cost, 4);
    assert_eq!(config.auth.token_ttl_hours, 72);
    assert_eq!(config.audit.max_entries, 50);
    assert_eq!(config.audit.retention_days, 7);
    assert!(config.cache.redis_url.is_none());
    assert!(config.validate().is_ok());
}

#[test]
fn test_explicit_missing_file_is_an_error() {
    let temp_dir = tempfile::tempdir().unwrap();
    let missing = temp_dir.path().join("nope.toml");

    assert!(ServerConfig::load(Some(&missing)).is_err());
}

#[tokio::test]
async fn test_from_config_creates_database_and_serves_requests() {
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("nested").join("warden.db");

    let mut config = ServerConfig::default();
    config.storage.database_url = format!("sqlite://{}", db_path.display());
    config.auth.jwt_secret = "startup-secret".to_string();
    config.auth.bcrypt_cost = 4;

    let state = AppState::from_config(&config).await.unwrap();
    assert!(db_path.exists());

    state
        .identity
        .register(RegisterRequest {
            name: "Ahmed".to_string(),
            email: "ahmed@example.com".to_string(),
            password: "secret123".to_string(),
        })
        .await
        .unwrap();

    let session = state
        .identity
        .login(LoginRequest {
            email: "ahmed@example.com".to_string(),
            password: "secret123".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(session.user.name, "Ahmed");
}
