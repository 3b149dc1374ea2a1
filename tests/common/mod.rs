//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rdkafka::error::{KafkaError, RDKafkaErrorCode};

use lo2t::config::{MessageFormat, PollConfig, TopicSettings};
use lo2t::notice::{DecodeError, Handler, JsonHandler, Notice, RawMessage, VoEventHandler};
use lo2t::routing::Subscription;
use lo2t::transport::{Transport, TransportError};

pub const CONFIG: &str = r#"
[gcn]
domain = "test.gcn.nasa.gov"
subscriptions = [
    "gcn.classic.voevent.FERMI_GBM_ALERT",
    # "gcn.classic.voevent.SWIFT_BAT_GRB_POS_ACK",
    "gcn.notices.swift.bat.guano",
    "gcn.notices.einstein_probe.wxt.alert",
    "igwn.gwalert",
]

[gcn.credentials]
client_id = ""
client_secret = ""

[gcn.classic.voevent]
message_type = "voevent"
limit = 4

[gcn.notices.swift.bat.guano]
message_type = "json"
limit = 4

[gcn.notices.einstein_probe.wxt.alert]
message_type = "json"
limit = 8

[igwn.gwalert]
message_type = "json"
limit = 10

[receiver]
poll_interval_ms = 5
poll_timeout_ms = 5
backoff_base_ms = 5
backoff_max_ms = 20
"#;

pub const VOEVENT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<voe:VOEvent xmlns:voe="http://www.ivoa.net/xml/VOEvent/v2.0"
    ivorn="ivo://nasa.gsfc.gcn/Fermi#GBM_Alert_2024-01-01T12:00:00.00_725803205_1-001"
    role="observation" version="2.0">
  <What><Param name="TrigID" value="725803205"/></What>
  <WhereWhen><ObsDataLocation><ObservationLocation><AstroCoords>
    <Time><TimeInstant><ISOTime>2024-01-01T12:00:00.00</ISOTime></TimeInstant></Time>
    <Position2D unit="deg"><Value2><C1>83.63</C1><C2>22.01</C2></Value2><Error2Radius>3.5</Error2Radius></Position2D>
  </AstroCoords></ObservationLocation></ObsDataLocation></WhereWhen>
</voe:VOEvent>
"#;

pub fn json_notice(id: &str) -> String {
    format!(
        r#"{{"id": ["{id}"], "trigger_time": "2024-03-01T21:46:05Z", "ra": 10.0, "dec": 20.0}}"#
    )
}

pub fn poll_config() -> PollConfig {
    PollConfig {
        poll_interval_ms: 5,
        poll_timeout_ms: 5,
        backoff_base_ms: 5,
        backoff_max_ms: 20,
    }
}

pub fn subscription(topic: &str, message_type: MessageFormat, limit: usize) -> Subscription {
    Subscription {
        topic: topic.to_string(),
        settings_path: topic.to_string(),
        settings: TopicSettings { message_type, limit },
    }
}

/// What the mock transport hands out for one topic.
pub enum Script {
    /// Pending messages; each fetch takes at most `limit` of them.
    Pending(VecDeque<RawMessage>),
    /// Every fetch fails.
    Failing,
}

/// Scripted in-memory transport that records every fetch.
#[derive(Default)]
pub struct MockTransport {
    pub topics: HashMap<String, Script>,
    pub fetches: Vec<(String, usize)>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pending(mut self, topic: &str, payloads: Vec<String>) -> Self {
        let messages = payloads
            .into_iter()
            .map(|p| RawMessage::new(topic, p))
            .collect();
        self.topics.insert(topic.to_string(), Script::Pending(messages));
        self
    }

    pub fn with_failing(mut self, topic: &str) -> Self {
        self.topics.insert(topic.to_string(), Script::Failing);
        self
    }

    pub fn remaining(&self, topic: &str) -> usize {
        match self.topics.get(topic) {
            Some(Script::Pending(queue)) => queue.len(),
            _ => 0,
        }
    }
}

impl Transport for MockTransport {
    async fn fetch(&mut self, topic: &str, limit: usize) -> Result<Vec<RawMessage>, TransportError> {
        self.fetches.push((topic.to_string(), limit));
        match self.topics.get_mut(topic) {
            Some(Script::Pending(queue)) => {
                let take = limit.min(queue.len());
                Ok(queue.drain(..take).collect())
            }
            Some(Script::Failing) => Err(TransportError::Kafka(KafkaError::MessageConsumption(
                RDKafkaErrorCode::AllBrokersDown,
            ))),
            None => Ok(Vec::new()),
        }
    }
}

/// Wraps a handler and counts its invocations.
pub struct Counting<H> {
    pub inner: H,
    pub calls: Arc<AtomicUsize>,
}

impl<H: Handler> Handler for Counting<H> {
    fn decode(&self, message: &RawMessage) -> Result<Notice, DecodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.decode(message)
    }
}

/// Handler table with invocation counters for (json, voevent).
pub fn counting_table() -> (lo2t::notice::HandlerTable, Arc<AtomicUsize>, Arc<AtomicUsize>) {
    let json_calls = Arc::new(AtomicUsize::new(0));
    let voevent_calls = Arc::new(AtomicUsize::new(0));
    let table = lo2t::notice::HandlerTable::new(
        Box::new(Counting { inner: JsonHandler, calls: json_calls.clone() }),
        Box::new(Counting { inner: VoEventHandler, calls: voevent_calls.clone() }),
    );
    (table, json_calls, voevent_calls)
}
