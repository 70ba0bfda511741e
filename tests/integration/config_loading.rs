//! Loading configuration files from disk

use std::io::Write;

use assert_matches::assert_matches;
use xmonitor::{
    MetricKind,
    config::{ConfigError, read_config_file},
};

const CONFIG: &str = r#"
[[metrics]]
kind = "bitcoin"
upper_limit = 100000.0
lower_limit = 10000.0

[[metrics]]
kind = "gold"
upper_limit = 600.0
lower_limit = 300.0

[email]
from = "monitor@example.com"
authorization = "secret"
host = "smtp.example.com"
port = 465
mail_to = ["ops@example.com", "oncall@example.com"]
"#;

#[test]
fn test_read_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(CONFIG.as_bytes()).unwrap();

    let config = read_config_file(file.path()).unwrap();
    let definitions = config.definitions();

    assert_eq!(definitions.len(), 2);
    assert_eq!(definitions[0].kind, MetricKind::Bitcoin);
    assert_eq!(definitions[1].identifier, "gold");
    assert_eq!(config.email.mail_to.len(), 2);
}

#[test]
fn test_invalid_config_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("xmonitor.toml");
    std::fs::write(&path, CONFIG.replace("lower_limit = 300.0", "lower_limit = 900.0")).unwrap();

    assert_matches!(read_config_file(&path), Err(ConfigError::Invalid(_)));
}

#[test]
fn test_unparsable_config_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("xmonitor.toml");
    std::fs::write(&path, "metrics = [").unwrap();

    assert_matches!(read_config_file(&path), Err(ConfigError::Parse(_)));
}
