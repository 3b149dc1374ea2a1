//! Notice decoding subsystem.
//!
//! # Data Flow
//! ```text
//! RawMessage (topic, payload bytes) + resolved MessageFormat
//!     → HandlerTable (one handler per format)
//!     → json.rs | voevent.rs
//!     → Notice (semantic fields) or DecodeError
//! ```
//!
//! # Design Decisions
//! - Closed set of formats: the table has exactly one slot per variant
//! - Handlers are pure: no I/O, no shared state
//! - A decode failure only affects the one message

pub mod json;
mod time;
pub mod voevent;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

pub use crate::config::MessageFormat;
pub use json::JsonHandler;
pub use voevent::VoEventHandler;

/// A payload as delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    pub topic: String,
    pub payload: Vec<u8>,
    pub partition: Option<i32>,
    pub offset: Option<i64>,
    /// Broker timestamp in milliseconds since the epoch.
    pub timestamp_ms: Option<i64>,
}

impl RawMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            partition: None,
            offset: None,
            timestamp_ms: None,
        }
    }
}

/// Sky position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SkyPosition {
    pub ra: f64,
    pub dec: f64,
    /// Error radius in degrees, when given.
    pub error_radius: Option<f64>,
}

/// Semantic fields of a decoded alert.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub topic: String,
    pub format: MessageFormat,
    pub id: Option<String>,
    pub alert_type: Option<String>,
    pub event_time: Option<DateTime<Utc>>,
    pub position: Option<SkyPosition>,
    pub params: BTreeMap<String, String>,
    #[serde(skip)]
    pub skymap: Option<Vec<u8>>,
    #[serde(skip)]
    pub record: Option<serde_json::Value>,
    pub received_at: DateTime<Utc>,
}

impl Notice {
    pub fn new(topic: impl Into<String>, format: MessageFormat) -> Self {
        Self {
            topic: topic.into(),
            format,
            id: None,
            alert_type: None,
            event_time: None,
            position: None,
            params: BTreeMap::new(),
            skymap: None,
            record: None,
            received_at: Utc::now(),
        }
    }

    /// Event time if the notice carries one, otherwise the time it arrived.
    pub fn effective_time(&self) -> DateTime<Utc> {
        self.event_time.unwrap_or(self.received_at)
    }
}

/// Failure to decode a single payload.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("empty payload")]
    EmptyPayload,

    #[error("payload is not valid UTF-8: {0}")]
    NotUtf8(#[from] std::str::Utf8Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid XML: {0}")]
    Xml(String),

    #[error("invalid skymap encoding: {0}")]
    Skymap(#[from] base64::DecodeError),

    #[error("malformed notice: {0}")]
    Malformed(String),
}

/// Decoder for one message format.
pub trait Handler: Send + Sync {
    /// Decode a payload into its semantic fields.
    fn decode(&self, message: &RawMessage) -> Result<Notice, DecodeError>;
}

/// Exactly one handler per `MessageFormat`.
pub struct HandlerTable {
    json: Box<dyn Handler>,
    voevent: Box<dyn Handler>,
}

impl HandlerTable {
    pub fn new(json: Box<dyn Handler>, voevent: Box<dyn Handler>) -> Self {
        Self { json, voevent }
    }

    pub fn handler(&self, format: MessageFormat) -> &dyn Handler {
        match format {
            MessageFormat::Json => self.json.as_ref(),
            MessageFormat::VoEvent => self.voevent.as_ref(),
        }
    }

    pub fn decode(&self, format: MessageFormat, message: &RawMessage) -> Result<Notice, DecodeError> {
        self.handler(format).decode(message)
    }
}

impl Default for HandlerTable {
    fn default() -> Self {
        Self::new(Box::new(JsonHandler), Box::new(VoEventHandler))
    }
}

impl std::fmt::Debug for HandlerTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerTable").finish_non_exhaustive()
    }
}
