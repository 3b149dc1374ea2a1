//! Timestamp parsing shared by the handlers.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Parse the timestamp spellings found in GCN notices.
///
/// Accepts RFC 3339, the space-separated form used by heartbeats
/// (`2025-06-10 09:06:19.208966+00:00`) and zone-less ISO times, which
/// VOEvents define as UTC.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(t.with_timezone(&Utc));
    }
    if let Ok(t) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(t.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parses_known_spellings() {
        let rfc = parse_timestamp("2024-05-01T12:00:00.5Z").unwrap();
        assert_eq!(rfc.hour(), 12);

        let heartbeat = parse_timestamp("2025-06-10 09:06:19.208966+00:00").unwrap();
        assert_eq!((heartbeat.year(), heartbeat.minute()), (2025, 6));

        let voevent = parse_timestamp(" 2023-11-02T03:04:05.67 ").unwrap();
        assert_eq!(voevent.second(), 5);

        let offset = parse_timestamp("2024-05-01T14:00:00+02:00").unwrap();
        assert_eq!(offset.hour(), 12);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("").is_none());
    }
}
