use assetdb_client::{ClientError, ServerConfig};
use pretty_assertions::assert_eq;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn file_keys_override_defaults() {
    let file = write_config(r#"{"server_url": "https://assets.example.com/", "api_key": "k1"}"#);

    let config = ServerConfig::from_file(file.path()).unwrap();
    assert_eq!(config.base_url(), "https://assets.example.com");
    assert_eq!(config.api_key.as_deref(), Some("k1"));
    assert_eq!(config.timeout_secs, 60);
    assert_eq!(config.page_size, 300);
}

#[test]
fn invalid_file_values_are_rejected() {
    let file = write_config(r#"{"server_url": "https://a.example.com", "page_size": 0}"#);
    let err = ServerConfig::from_file(file.path()).unwrap_err();
    assert!(matches!(err, ClientError::Config(_)));
}

#[test]
fn malformed_file_is_a_serialization_error() {
    let file = write_config("{not json");
    let err = ServerConfig::from_file(file.path()).unwrap_err();
    assert!(matches!(err, ClientError::Serialization(_)));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ServerConfig::from_file(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, ClientError::Io(_)));
}

#[test]
fn environment_overlays_file_settings() {
    let file = write_config(r#"{"server_url": "https://a.example.com", "page_size": 50}"#);
    let mut config = ServerConfig::from_file(file.path()).unwrap();

    config
        .apply_env(|key| (key == "ASSETDB_PAGE_SIZE").then(|| "75".to_string()))
        .unwrap();
    assert_eq!(config.page_size, 75);
    assert_eq!(config.server_url, "https://a.example.com");
}

#[test]
fn file_overlay_keeps_settings_it_does_not_mention() {
    let file = write_config(r#"{"server_url": "https://file.example.com"}"#);
    let mut config = ServerConfig::default();
    config
        .apply_env(|key| match key {
            "ASSETDB_SERVER_URL" => Some("not a url".to_string()),
            "ASSETDB_PAGE_SIZE" => Some("20".to_string()),
            _ => None,
        })
        .unwrap();

    config.apply_file(file.path()).unwrap();
    assert_eq!(config.server_url, "https://file.example.com");
    assert_eq!(config.page_size, 20);
    assert!(config.validate().is_ok());
}
