//! Delivery of a single literal payload given on the command line.

use thiserror::Error;

use crate::config::MessageFormat;
use crate::dispatch::deliver;
use crate::events::NoticeSink;
use crate::notice::{DecodeError, HandlerTable, RawMessage};
use crate::routing::{TopicRegistry, UnresolvedTopicError};

/// Topic a test message is attributed to when none is given.
pub const DEFAULT_TEST_TOPIC: &str = "test";

#[derive(Debug, Error)]
pub enum TestMessageError {
    #[error(transparent)]
    Unresolved(#[from] UnresolvedTopicError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Decode `payload` and hand it to `sink` without touching a transport.
///
/// With a topic the format comes from the registry; without one it is
/// sniffed from the payload. Returns the format that was used.
pub fn process_test_message<S: NoticeSink>(
    registry: &TopicRegistry,
    handlers: &HandlerTable,
    sink: &mut S,
    payload: impl Into<Vec<u8>>,
    topic: Option<&str>,
) -> Result<MessageFormat, TestMessageError> {
    let payload = payload.into();
    let (topic, format) = match topic {
        Some(topic) => (topic, registry.resolve(topic)?.message_type),
        None => (DEFAULT_TEST_TOPIC, MessageFormat::sniff(&payload)),
    };

    tracing::info!(topic = %topic, format = %format, "Processing test message");
    deliver(handlers, sink, format, RawMessage::new(topic, payload))?;
    Ok(format)
}
