//! Configuration loading from disk.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use thiserror::Error;
use toml::{Table, Value};

use crate::config::schema::{GcnConfig, ReceiverConfig, TopicSettings};
use crate::config::validation::{validate_config, ValidationError};

/// Sections that hold receiver settings rather than topic settings.
const RESERVED_SECTIONS: [&str; 4] = ["receiver", "kafka", "events", "observability"];

/// Connection keys, looked up at the root first and then under `[gcn]`.
const CONNECTION_KEYS: [&str; 3] = ["domain", "subscriptions", "credentials"];

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid [{section}] section: {source}")]
    InvalidSection {
        section: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid settings for '{path}': {source}")]
    InvalidSettings {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

impl ConfigError {
    /// Validation errors, if this is a validation failure.
    pub fn validation_errors(&self) -> &[ValidationError] {
        match self {
            ConfigError::Validation(errors) => errors,
            _ => &[],
        }
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ReceiverConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    tracing::debug!(
        path = %path.display(),
        topics = config.topics.len(),
        subscriptions = config.gcn.subscriptions.len(),
        "Configuration parsed"
    );
    Ok(config)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ReceiverConfig, ConfigError> {
    let document: Table = toml::from_str(content)?;

    let mut topics = BTreeMap::new();
    collect_topics(&document, None, &mut topics)?;

    let config = ReceiverConfig {
        gcn: gcn_section(&document)?,
        topics,
        receiver: section(&document, "receiver")?,
        kafka: section(&document, "kafka")?,
        events: section(&document, "events")?,
        observability: section(&document, "observability")?,
    };

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn section<T: DeserializeOwned + Default>(document: &Table, name: &str) -> Result<T, ConfigError> {
    match document.get(name) {
        None => Ok(T::default()),
        Some(value) => value
            .clone()
            .try_into()
            .map_err(|source| ConfigError::InvalidSection {
                section: name.to_string(),
                source,
            }),
    }
}

fn gcn_section(document: &Table) -> Result<GcnConfig, ConfigError> {
    let nested = document.get("gcn").and_then(Value::as_table);

    let mut merged = Table::new();
    for key in CONNECTION_KEYS {
        let value = document
            .get(key)
            .or_else(|| nested.and_then(|gcn| gcn.get(key)));
        if let Some(value) = value {
            merged.insert(key.to_string(), value.clone());
        }
    }

    Value::Table(merged)
        .try_into()
        .map_err(|source| ConfigError::InvalidSection {
            section: "gcn".to_string(),
            source,
        })
}

/// Walk the document and collect every table carrying topic settings,
/// keyed by its dotted path.
fn collect_topics(
    table: &Table,
    prefix: Option<&str>,
    out: &mut BTreeMap<String, TopicSettings>,
) -> Result<(), ConfigError> {
    if let Some(path) = prefix {
        if table.contains_key("message_type") || table.contains_key("limit") {
            let settings: TopicSettings = Value::Table(table.clone())
                .try_into()
                .map_err(|source| ConfigError::InvalidSettings {
                    path: path.to_string(),
                    source,
                })?;
            out.insert(path.to_string(), settings);
        }
    }

    for (key, value) in table {
        let Some(child) = value.as_table() else {
            continue;
        };
        if key == "credentials" {
            continue;
        }
        if prefix.is_none() && RESERVED_SECTIONS.contains(&key.as_str()) {
            continue;
        }
        let path = match prefix {
            Some(parent) => format!("{}.{}", parent, key),
            None => key.clone(),
        };
        collect_topics(child, Some(&path), out)?;
    }

    Ok(())
}
