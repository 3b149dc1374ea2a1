//! JSON notice handler.
//!
//! Covers the unified GCN JSON schema (Swift, Einstein Probe, SVOM, IceCube),
//! IGWN gravitational-wave alerts and heartbeats. Only fields common to these
//! are extracted; the full record stays available on the notice.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{Map, Value};

use crate::notice::time::parse_timestamp;
use crate::notice::{DecodeError, Handler, MessageFormat, Notice, RawMessage, SkyPosition};

/// Time fields in order of preference.
const TIME_FIELDS: [&[&str]; 4] = [
    &["trigger_time"],
    &["event", "time"],
    &["alert_datetime"],
    &["time_created"],
];

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonHandler;

impl Handler for JsonHandler {
    fn decode(&self, message: &RawMessage) -> Result<Notice, DecodeError> {
        if message.payload.iter().all(u8::is_ascii_whitespace) {
            return Err(DecodeError::EmptyPayload);
        }
        let text = std::str::from_utf8(&message.payload)?;
        let record: Value = serde_json::from_str(text)?;
        let object = record
            .as_object()
            .ok_or_else(|| DecodeError::Malformed("expected a JSON object".to_string()))?;

        let mut notice = Notice::new(message.topic.clone(), MessageFormat::Json);
        notice.id = notice_id(object);
        notice.alert_type = object
            .get("alert_type")
            .and_then(Value::as_str)
            .map(str::to_string);
        notice.event_time = TIME_FIELDS
            .iter()
            .filter_map(|path| lookup(&record, path).and_then(Value::as_str))
            .find_map(parse_timestamp);
        notice.position = position(object);

        if let Some(encoded) = lookup(&record, &["event", "skymap"]).and_then(Value::as_str) {
            notice.skymap = Some(STANDARD.decode(encoded)?);
        }

        notice.record = Some(record);
        Ok(notice)
    }
}

fn lookup<'v>(value: &'v Value, path: &[&str]) -> Option<&'v Value> {
    path.iter().try_fold(value, |v, key| v.get(key))
}

fn notice_id(object: &Map<String, Value>) -> Option<String> {
    if let Some(id) = object.get("superevent_id").and_then(Value::as_str) {
        return Some(id.to_string());
    }
    let id = match object.get("id") {
        Some(Value::Array(ids)) => ids.iter().find_map(scalar_id),
        Some(id) => scalar_id(id),
        None => None,
    };
    id.or_else(|| object.get("trigger_id").and_then(scalar_id))
}

fn scalar_id(value: &Value) -> Option<String> {
    match value {
        Value::String(id) => Some(id.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn position(object: &Map<String, Value>) -> Option<SkyPosition> {
    let ra = object.get("ra").and_then(Value::as_f64)?;
    let dec = object.get("dec").and_then(Value::as_f64)?;
    Some(SkyPosition {
        ra,
        dec,
        error_radius: object.get("ra_dec_error").and_then(Value::as_f64),
    })
}
