//! Configuration system tests.

use clap::Parser;
use flushd_lib::cli::Cli;
use flushd_lib::core::config::{AuthCredential, DEFAULT_TYPES_DB};
use flushd_lib::core::{ConfigBuilder, FlushdError};
use flushd_lib::Forwarder;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

mod common;

#[test]
fn test_minimal_config() {
    let config = ConfigBuilder::new()
        .url("https://collector.example.com/api/metrics")
        .build()
        .unwrap();

    assert_eq!(config.endpoint.url.as_str(), "https://collector.example.com/api/metrics");
    assert_eq!(config.endpoint.auth, AuthCredential::None);
    assert!(config.endpoint.verify_ssl);
    assert_eq!(config.endpoint.timeout, Duration::from_secs(15));
    assert_eq!(config.flush.interval_secs, 30);
    assert_eq!(config.flush.max_values, 600);
    assert_eq!(config.types_db.to_str(), Some(DEFAULT_TYPES_DB));
}

#[test]
fn test_oauth_without_application_key_fails() {
    let result = ConfigBuilder::new()
        .option("URL", "https://collector.example.com/api/metrics")
        .unwrap()
        .option("Authentication", "oauth")
        .unwrap()
        .option("ApplicationSecret", "app-secret")
        .unwrap()
        .option("AccessToken", "token")
        .unwrap()
        .option("AccessTokenSecret", "token-secret")
        .unwrap()
        .build();

    let err = result.unwrap_err();
    assert!(err.is_fatal());
    assert!(err.to_string().contains("ApplicationKey"));
}

#[test]
fn test_unsupported_authentication_fails_immediately() {
    let err = ConfigBuilder::new()
        .option("Authentication", "kerberos")
        .unwrap_err();
    assert!(matches!(err, FlushdError::Config(_)));
}

#[test]
fn test_yaml_config() {
    let yaml = r#"
URL: http://collector.internal:8080/metrics
Authentication: basic
Username: collectd
Password: hunter2
VerifySSL: false
TypesDB: /etc/flushd/types.db
FlushIntervalSecs: 12.9
FlushMaxValues: 50
FlushTimeoutSecs: 3
"#;

    let config = ConfigBuilder::new()
        .from_yaml(yaml)
        .unwrap()
        .build()
        .unwrap();

    assert_eq!(config.endpoint.url.port(), Some(8080));
    assert_eq!(config.endpoint.auth.protocol(), "basic");
    assert!(!config.endpoint.verify_ssl);
    assert_eq!(config.endpoint.timeout, Duration::from_secs(3));
    assert_eq!(config.flush.interval_secs, 12);
    assert_eq!(config.flush.max_values, 50);
    assert_eq!(config.types_db.to_str(), Some("/etc/flushd/types.db"));
}

#[test]
fn test_error_handling() {
    // Invalid YAML
    assert!(ConfigBuilder::new()
        .from_yaml("URL: [unterminated")
        .is_err());

    // Invalid field values
    assert!(ConfigBuilder::new()
        .from_yaml("FlushMaxValues: lots")
        .is_err());

    // Not a URL at all
    assert!(ConfigBuilder::new().url("collector").build().is_err());

    // Negative interval
    assert!(ConfigBuilder::new()
        .url("http://collector/")
        .option("FlushIntervalSecs", "-1")
        .unwrap()
        .build()
        .is_err());
}

#[tokio::test]
async fn test_config_file_with_cli_overrides() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "URL: http://from-file.local/metrics\nFlushMaxValues: 100\nFlushIntervalSecs: 60"
    )
    .unwrap();

    let path = file.path().to_str().unwrap().to_string();
    let cli = Cli::try_parse_from([
        "flushd",
        "--config",
        path.as_str(),
        "--flush-max-values",
        "5",
        "-o",
        "VerifySSL=false",
    ])
    .unwrap();

    let config = cli.load_config().await.unwrap();
    assert_eq!(config.endpoint.url.host_str(), Some("from-file.local"));
    assert_eq!(config.flush.max_values, 5);
    assert_eq!(config.flush.interval_secs, 60);
    assert!(!config.endpoint.verify_ssl);
}

#[test]
fn test_forwarder_loads_types_db() {
    let mut types_db = NamedTempFile::new().unwrap();
    types_db.write_all(common::TYPES_DB.as_bytes()).unwrap();

    let config = ConfigBuilder::new()
        .url("http://127.0.0.1:9/metrics")
        .types_db(types_db.path().to_path_buf())
        .build()
        .unwrap();

    let forwarder = Forwarder::new(&config).unwrap();
    assert_eq!(forwarder.catalog().len(), 3);
    assert_eq!(forwarder.catalog().lookup("load").unwrap().arity(), 3);

    // Reload picks up edits to the file
    types_db
        .write_all(b"memory value:GAUGE:0:281474976710656\n")
        .unwrap();
    assert_eq!(forwarder.reload_catalog().unwrap(), 4);
    assert!(forwarder.catalog().lookup("memory").is_some());
}

#[test]
fn test_forwarder_fails_without_types_db() {
    let config = ConfigBuilder::new()
        .url("http://127.0.0.1:9/metrics")
        .types_db("/nonexistent/types.db".into())
        .build()
        .unwrap();

    let err = Forwarder::new(&config).err().unwrap();
    assert!(matches!(err, FlushdError::Config(_)));
}
