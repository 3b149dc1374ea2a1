//! Loading configuration files from disk.

use std::io::Write;

use lo2t::config::{load_config, ConfigError, MessageFormat, TopicSettings, ValidationError};
use lo2t::routing::{TopicRegistry, UnresolvedTopicError};

mod common;

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_example_layout() {
    let file = write_config(common::CONFIG);
    let config = load_config(file.path()).unwrap();

    assert_eq!(config.gcn.subscriptions.len(), 4);
    assert!(config.gcn.credentials.is_empty());
    assert_eq!(config.receiver.poll_interval_ms, 5);

    let registry = TopicRegistry::from_config(&config);
    assert_eq!(
        registry.resolve("gcn.classic.voevent.FERMI_GBM_ALERT").unwrap(),
        TopicSettings { message_type: MessageFormat::VoEvent, limit: 4 }
    );
    assert_eq!(
        registry.resolve("gcn.notices.swift.bat.guano").unwrap(),
        TopicSettings { message_type: MessageFormat::Json, limit: 4 }
    );
}

#[test]
fn test_unresolved_subscription_rejected() {
    let file = write_config(
        r#"
        [gcn]
        subscriptions = ["gcn.classic.voevent.FERMI_GBM_ALERT", "gcn.circulars"]

        [gcn.classic.voevent]
        message_type = "voevent"
        limit = 4
        "#,
    );
    let err = load_config(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)));
    assert_eq!(
        err.validation_errors(),
        &[ValidationError::Unresolved(UnresolvedTopicError {
            topic: "gcn.circulars".to_string()
        })]
    );
    assert!(err.to_string().contains("gcn.circulars"));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_config(&dir.path().join("config.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn test_malformed_file_is_parse_error() {
    let file = write_config("[gcn\nsubscriptions = 3");
    let err = load_config(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn test_repository_config_is_valid() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("config.toml");
    let config = load_config(&path).unwrap();
    let registry = TopicRegistry::from_config(&config);
    assert!(registry.subscriptions(&config.gcn.subscriptions).is_ok());
}

#[test]
fn test_out_of_range_event_windows_rejected() {
    let content = format!("{}\n[events]\nretention_minutes = 9223372036854775807\n", common::CONFIG);
    let file = write_config(&content);
    let err = load_config(file.path()).unwrap_err();
    assert_eq!(
        err.validation_errors(),
        &[ValidationError::EventWindow {
            field: "retention_minutes",
            value: i64::MAX
        }]
    );
}
