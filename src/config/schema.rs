//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the receiver.
//! Section types derive Serde traits; the topic settings tree is collected by
//! the loader because its table names are dotted topic paths, not fields.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the receiver.
#[derive(Debug, Clone, Default)]
pub struct ReceiverConfig {
    /// Broker domain, subscriptions and credentials.
    pub gcn: GcnConfig,

    /// Topic settings keyed by dotted settings path (e.g. `gcn.classic.voevent`).
    pub topics: BTreeMap<String, TopicSettings>,

    /// Poll loop timing.
    pub receiver: PollConfig,

    /// Kafka client overrides.
    pub kafka: KafkaConfig,

    /// Downstream event log settings.
    pub events: EventsConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,
}

/// Connection-level settings for the alert stream.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GcnConfig {
    /// Broker domain; the bootstrap host is `kafka.<domain>`.
    pub domain: String,

    /// Topics to subscribe to, in declaration order.
    pub subscriptions: Vec<String>,

    /// OIDC client credentials. Empty means an unauthenticated connection.
    pub credentials: Credentials,
}

impl Default for GcnConfig {
    fn default() -> Self {
        Self {
            domain: "gcn.nasa.gov".to_string(),
            subscriptions: Vec::new(),
            credentials: Credentials::default(),
        }
    }
}

/// Client id/secret pair issued by the GCN portal.
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl Credentials {
    pub fn is_empty(&self) -> bool {
        self.client_id.is_empty() && self.client_secret.is_empty()
    }
}

// Keep the secret out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Wire format of a topic's payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageFormat {
    Json,
    VoEvent,
}

impl MessageFormat {
    /// Guess the format of a raw payload: XML documents start with `<`.
    pub fn sniff(payload: &[u8]) -> Self {
        match payload.iter().find(|b| !b.is_ascii_whitespace()) {
            Some(b'<') => MessageFormat::VoEvent,
            _ => MessageFormat::Json,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageFormat::Json => "json",
            MessageFormat::VoEvent => "voevent",
        }
    }
}

impl fmt::Display for MessageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MessageFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(MessageFormat::Json),
            "voevent" => Ok(MessageFormat::VoEvent),
            other => Err(format!("unknown message type '{}'", other)),
        }
    }
}

/// Effective settings for a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct TopicSettings {
    /// Payload format, selects the handler.
    pub message_type: MessageFormat,

    /// Maximum number of messages taken from the topic per poll cycle.
    pub limit: usize,
}

/// Poll loop timing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PollConfig {
    /// Pause between two poll cycles in milliseconds.
    pub poll_interval_ms: u64,

    /// How long a single topic poll waits for its first message.
    pub poll_timeout_ms: u64,

    /// Base delay for backoff after a cycle in which every topic failed.
    pub backoff_base_ms: u64,

    /// Upper bound for that backoff.
    pub backoff_max_ms: u64,
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            poll_timeout_ms: 250,
            backoff_base_ms: 1000,
            backoff_max_ms: 60_000,
        }
    }
}

/// Kafka client overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct KafkaConfig {
    /// Bootstrap servers; defaults to `kafka.<domain>`.
    pub bootstrap_servers: Option<String>,

    /// Consumer group id; a random UUID when absent.
    pub group_id: Option<String>,

    /// Raw librdkafka properties, applied last.
    pub properties: BTreeMap<String, String>,
}

/// Downstream event log settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Events older than this are dropped from the log.
    pub retention_minutes: i64,

    /// Two events closer than this in time are reported as coincident.
    pub coincidence_minutes: i64,

    /// Angular radius for positional coincidence in degrees.
    pub coincidence_radius_deg: f64,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            retention_minutes: 60,
            coincidence_minutes: 10,
            coincidence_radius_deg: 5.0,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Stdout log format.
    pub log_format: LogFormat,

    /// Optional plain-text log file in addition to stdout.
    pub log_file: Option<PathBuf>,

    /// Enable the Prometheus scrape endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            log_file: None,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_format() {
        assert_eq!(MessageFormat::sniff(b"<?xml version='1.0'?>"), MessageFormat::VoEvent);
        assert_eq!(MessageFormat::sniff(b"  \n<voe:VOEvent/>"), MessageFormat::VoEvent);
        assert_eq!(MessageFormat::sniff(b"{\"a\": 1}"), MessageFormat::Json);
        assert_eq!(MessageFormat::sniff(b""), MessageFormat::Json);
    }

    #[test]
    fn test_message_format_names() {
        assert_eq!("voevent".parse::<MessageFormat>(), Ok(MessageFormat::VoEvent));
        assert_eq!("json".parse::<MessageFormat>(), Ok(MessageFormat::Json));
        assert!("xml".parse::<MessageFormat>().is_err());
        assert_eq!(MessageFormat::VoEvent.to_string(), "voevent");
    }

    #[test]
    fn test_credentials_debug_redacts_secret() {
        let creds = Credentials {
            client_id: "abc".into(),
            client_secret: "hunter2".into(),
        };
        let shown = format!("{:?}", creds);
        assert!(shown.contains("abc"));
        assert!(!shown.contains("hunter2"));
    }
}
