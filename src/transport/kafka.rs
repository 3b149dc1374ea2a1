//! Kafka transport for the GCN alert stream.
//!
//! # Responsibilities
//! - Build librdkafka client settings from the `[gcn]` and `[kafka]` sections
//! - Authenticate with OIDC client credentials when they are configured
//! - Hold one consumer per subscribed topic so a per-topic limit can be honoured

use std::collections::HashMap;
use std::time::Duration;

use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::BorrowedMessage;
use rdkafka::{ClientConfig, Message};
use uuid::Uuid;

use crate::config::{GcnConfig, KafkaConfig, PollConfig};
use crate::notice::RawMessage;
use crate::routing::Subscription;
use crate::transport::{Transport, TransportError};

/// Wait for further messages once a batch has started.
const DRAIN_TIMEOUT: Duration = Duration::from_millis(10);

/// Kafka-backed transport.
pub struct KafkaTransport {
    consumers: HashMap<String, StreamConsumer>,
    poll_timeout: Duration,
}

impl KafkaTransport {
    /// Create and subscribe one consumer per subscription.
    pub fn connect(
        gcn: &GcnConfig,
        kafka: &KafkaConfig,
        poll: &PollConfig,
        subscriptions: &[Subscription],
    ) -> Result<Self, TransportError> {
        let group_id = kafka
            .group_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let base = client_config(gcn, kafka);

        tracing::info!(
            bootstrap = base.get("bootstrap.servers").unwrap_or_default(),
            group_id = %group_id,
            authenticated = !gcn.credentials.is_empty(),
            "Connecting to alert stream"
        );
        if gcn.credentials.is_empty() {
            tracing::warn!("No client credentials configured, connecting without authentication");
        }

        let mut consumers = HashMap::with_capacity(subscriptions.len());
        for subscription in subscriptions {
            let mut config = base.clone();
            config.set("group.id", format!("{}.{}", group_id, subscription.topic));
            let consumer: StreamConsumer = config.create()?;
            consumer.subscribe(&[subscription.topic.as_str()])?;
            tracing::debug!(topic = %subscription.topic, "Consumer subscribed");
            consumers.insert(subscription.topic.clone(), consumer);
        }

        Ok(Self {
            consumers,
            poll_timeout: poll.timeout(),
        })
    }
}

impl Transport for KafkaTransport {
    async fn fetch(&mut self, topic: &str, limit: usize) -> Result<Vec<RawMessage>, TransportError> {
        let consumer = self
            .consumers
            .get(topic)
            .ok_or_else(|| TransportError::UnknownTopic(topic.to_string()))?;

        let mut batch = Vec::with_capacity(limit);
        while batch.len() < limit {
            let wait = if batch.is_empty() {
                self.poll_timeout
            } else {
                DRAIN_TIMEOUT
            };
            match tokio::time::timeout(wait, consumer.recv()).await {
                Err(_) => break,
                Ok(Ok(message)) => batch.push(raw_message(&message)),
                Ok(Err(e)) if batch.is_empty() => return Err(e.into()),
                Ok(Err(e)) => {
                    tracing::warn!(topic = %topic, error = %e, "Consumer error after partial batch");
                    break;
                }
            }
        }
        Ok(batch)
    }
}

/// librdkafka settings shared by every consumer.
pub(crate) fn client_config(gcn: &GcnConfig, kafka: &KafkaConfig) -> ClientConfig {
    let mut config = ClientConfig::new();
    let bootstrap = kafka
        .bootstrap_servers
        .clone()
        .unwrap_or_else(|| format!("kafka.{}", gcn.domain));
    config.set("bootstrap.servers", bootstrap);

    let credentials = &gcn.credentials;
    if !credentials.is_empty() {
        config
            .set("security.protocol", "sasl_ssl")
            .set("sasl.mechanisms", "OAUTHBEARER")
            .set("sasl.oauthbearer.method", "oidc")
            .set("sasl.oauthbearer.client.id", credentials.client_id.as_str())
            .set("sasl.oauthbearer.client.secret", credentials.client_secret.as_str())
            .set(
                "sasl.oauthbearer.token.endpoint.url",
                format!("https://auth.{}/oauth2/token", gcn.domain),
            );
    }

    for (key, value) in &kafka.properties {
        config.set(key.as_str(), value.as_str());
    }
    config
}

fn raw_message(message: &BorrowedMessage<'_>) -> RawMessage {
    RawMessage {
        topic: message.topic().to_string(),
        payload: message.payload().map(<[u8]>::to_vec).unwrap_or_default(),
        partition: Some(message.partition()),
        offset: Some(message.offset()),
        timestamp_ms: message.timestamp().to_millis(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credentials;

    #[test]
    fn test_authenticated_client_config() {
        let gcn = GcnConfig {
            domain: "test.gcn.nasa.gov".into(),
            subscriptions: vec!["gcn.heartbeat".into()],
            credentials: Credentials {
                client_id: "id".into(),
                client_secret: "secret".into(),
            },
        };
        let config = client_config(&gcn, &KafkaConfig::default());
        assert_eq!(config.get("bootstrap.servers"), Some("kafka.test.gcn.nasa.gov"));
        assert_eq!(config.get("sasl.mechanisms"), Some("OAUTHBEARER"));
        assert_eq!(config.get("sasl.oauthbearer.client.id"), Some("id"));
        assert_eq!(
            config.get("sasl.oauthbearer.token.endpoint.url"),
            Some("https://auth.test.gcn.nasa.gov/oauth2/token")
        );
    }

    #[tokio::test]
    async fn test_fetch_unsubscribed_topic() {
        let mut transport = KafkaTransport {
            consumers: HashMap::new(),
            poll_timeout: Duration::from_millis(1),
        };
        let err = transport.fetch("gcn.heartbeat", 4).await.unwrap_err();
        assert!(matches!(err, TransportError::UnknownTopic(topic) if topic == "gcn.heartbeat"));
    }

    #[test]
    fn test_unauthenticated_with_overrides() {
        let gcn = GcnConfig::default();
        let mut kafka = KafkaConfig {
            bootstrap_servers: Some("localhost:9092".into()),
            ..KafkaConfig::default()
        };
        kafka
            .properties
            .insert("auto.offset.reset".into(), "earliest".into());

        let config = client_config(&gcn, &kafka);
        assert_eq!(config.get("bootstrap.servers"), Some("localhost:9092"));
        assert_eq!(config.get("security.protocol"), None);
        assert_eq!(config.get("auto.offset.reset"), Some("earliest"));
    }
}
