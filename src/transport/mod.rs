//! Alert stream transport.
//!
//! # Data Flow
//! ```text
//! Dispatcher poll cycle
//!     → Transport::fetch(topic, limit)
//!     → kafka.rs (one consumer per subscribed topic)
//!     → Vec<RawMessage> (at most `limit`) or TransportError
//! ```
//!
//! # Design Decisions
//! - The dispatcher only sees this trait; tests substitute a scripted transport
//! - Transport errors are transient: the caller logs them and polls again later
//! - Authentication happens once, when the transport is built

pub mod kafka;

use std::future::Future;

use thiserror::Error;

use crate::notice::RawMessage;

pub use kafka::KafkaTransport;

/// Errors surfaced by a transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),

    #[error("topic '{0}' is not subscribed on this transport")]
    UnknownTopic(String),
}

/// Source of raw alert payloads.
pub trait Transport {
    /// Take up to `limit` pending messages from `topic`.
    ///
    /// Returns an empty batch when nothing is pending within the poll timeout.
    fn fetch(
        &mut self,
        topic: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<RawMessage>, TransportError>>;
}
