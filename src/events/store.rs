//! In-memory log of received events.
//!
//! # Responsibilities
//! - Keep the latest notice per event id
//! - Report duplicates and updates of known events
//! - Find events coincident in time or on the sky
//! - Drop events older than the retention window
//! - Forget events once they are retracted

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::config::EventsConfig;
use crate::events::NoticeSink;
use crate::notice::{Notice, SkyPosition};

/// Outcome of storing a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recorded {
    /// First notice for this id.
    New,
    /// An earlier notice with this id was replaced.
    Updated,
    /// Notice carries no id and was not stored.
    Anonymous,
    /// Retraction; any stored event with this id was removed.
    Retracted,
}

/// Alert type that withdraws an earlier alert.
const RETRACTION: &str = "RETRACTION";

/// Latest known state of an event.
#[derive(Debug, Clone)]
pub struct StoredEvent {
    pub notice: Notice,
    pub first_seen: DateTime<Utc>,
    pub updates: u32,
}

/// Event store keyed by notice id.
#[derive(Debug)]
pub struct EventLog {
    events: HashMap<String, StoredEvent>,
    retention: Duration,
    coincidence_window: Duration,
    coincidence_radius_deg: f64,
}

impl EventLog {
    pub fn new(config: &EventsConfig) -> Self {
        Self {
            events: HashMap::new(),
            retention: minutes(config.retention_minutes),
            coincidence_window: minutes(config.coincidence_minutes),
            coincidence_radius_deg: config.coincidence_radius_deg,
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&StoredEvent> {
        self.events.get(id)
    }

    pub fn is_duplicate(&self, notice: &Notice) -> bool {
        notice
            .id
            .as_deref()
            .is_some_and(|id| self.events.contains_key(id))
    }

    /// Store a notice, replacing an earlier one with the same id.
    ///
    /// A retraction removes the event instead.
    pub fn insert(&mut self, notice: Notice) -> Recorded {
        let Some(id) = notice.id.clone() else {
            return Recorded::Anonymous;
        };
        if is_retraction(&notice) {
            self.events.remove(&id);
            return Recorded::Retracted;
        }
        match self.events.get_mut(&id) {
            Some(stored) => {
                stored.notice = notice;
                stored.updates += 1;
                Recorded::Updated
            }
            None => {
                let first_seen = notice.received_at;
                self.events.insert(
                    id,
                    StoredEvent {
                        notice,
                        first_seen,
                        updates: 0,
                    },
                );
                Recorded::New
            }
        }
    }

    /// Events whose time lies within `window` of `time`.
    pub fn near_in_time(&self, time: DateTime<Utc>, window: Duration) -> Vec<&StoredEvent> {
        self.events
            .values()
            .filter(|e| (e.notice.effective_time() - time).abs() <= window)
            .collect()
    }

    /// Events whose position lies within `radius_deg` of `position`.
    pub fn near_in_position(&self, position: &SkyPosition, radius_deg: f64) -> Vec<&StoredEvent> {
        self.events
            .values()
            .filter(|e| {
                e.notice
                    .position
                    .as_ref()
                    .is_some_and(|p| angular_separation_deg(p, position) <= radius_deg)
            })
            .collect()
    }

    /// Drop events older than the retention window; returns how many went.
    pub fn prune(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.events.len();
        let Some(cutoff) = now.checked_sub_signed(self.retention) else {
            return 0;
        };
        self.events
            .retain(|_, e| e.notice.effective_time().max(e.notice.received_at) >= cutoff);
        before - self.events.len()
    }

    /// Ids of stored events coincident with `notice` in time and, when both
    /// carry a position, on the sky.
    pub fn coincident_with(&self, notice: &Notice) -> Vec<&str> {
        self.near_in_time(notice.effective_time(), self.coincidence_window)
            .into_iter()
            .filter(|e| e.notice.id != notice.id)
            .filter(|e| match (&e.notice.position, &notice.position) {
                (Some(a), Some(b)) => angular_separation_deg(a, b) <= self.coincidence_radius_deg,
                _ => true,
            })
            .filter_map(|e| e.notice.id.as_deref())
            .collect()
    }
}

impl NoticeSink for EventLog {
    fn accept(&mut self, notice: Notice) {
        let pruned = self.prune(notice.received_at);
        if pruned > 0 {
            tracing::debug!(pruned, "Dropped expired events");
        }

        let mut coincident: Vec<String> = if is_retraction(&notice) {
            Vec::new()
        } else {
            self.coincident_with(&notice)
                .into_iter()
                .map(str::to_string)
                .collect()
        };
        coincident.sort();

        let topic = notice.topic.clone();
        let id = notice.id.clone();
        let alert_type = notice.alert_type.clone();
        let event_time = notice.event_time;
        let position = notice.position;

        match self.insert(notice) {
            Recorded::New => tracing::info!(
                topic = %topic,
                id = ?id,
                alert_type = ?alert_type,
                event_time = ?event_time,
                ra = ?position.map(|p| p.ra),
                dec = ?position.map(|p| p.dec),
                "New event"
            ),
            Recorded::Updated => tracing::info!(
                topic = %topic,
                id = ?id,
                alert_type = ?alert_type,
                "Event updated"
            ),
            Recorded::Anonymous => tracing::info!(
                topic = %topic,
                event_time = ?event_time,
                "Notice without id"
            ),
            Recorded::Retracted => tracing::info!(
                topic = %topic,
                id = ?id,
                "Event was retracted"
            ),
        }

        if !coincident.is_empty() {
            tracing::info!(id = ?id, coincident = ?coincident, "Coincident events");
        }
    }
}

fn is_retraction(notice: &Notice) -> bool {
    notice.alert_type.as_deref() == Some(RETRACTION)
}

/// Non-negative window; out-of-range values saturate.
fn minutes(value: i64) -> Duration {
    Duration::try_minutes(value.max(0)).unwrap_or(Duration::MAX)
}

/// Great-circle distance between two positions in degrees.
pub fn angular_separation_deg(a: &SkyPosition, b: &SkyPosition) -> f64 {
    let (ra1, dec1) = (a.ra.to_radians(), a.dec.to_radians());
    let (ra2, dec2) = (b.ra.to_radians(), b.dec.to_radians());
    let hav = ((dec2 - dec1) / 2.0).sin().powi(2)
        + dec1.cos() * dec2.cos() * ((ra2 - ra1) / 2.0).sin().powi(2);
    (2.0 * hav.sqrt().min(1.0).asin()).to_degrees()
}
