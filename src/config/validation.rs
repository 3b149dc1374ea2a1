//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that every subscription resolves to topic settings
//! - Validate value ranges (limits > 0, timings > 0, event windows)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ReceiverConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ReceiverConfig;
use crate::routing::{TopicRegistry, UnresolvedTopicError};

/// Longest event window accepted, one year in minutes.
pub const MAX_WINDOW_MINUTES: i64 = 525_600;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("no subscriptions configured")]
    NoSubscriptions,

    #[error("topic '{0}' is subscribed more than once")]
    DuplicateSubscription(String),

    #[error(transparent)]
    Unresolved(#[from] UnresolvedTopicError),

    #[error("limit for '{0}' must be at least 1")]
    ZeroLimit(String),

    #[error("{0} must be greater than zero")]
    ZeroTiming(&'static str),

    #[error("backoff_base_ms ({base}) exceeds backoff_max_ms ({max})")]
    BackoffRange { base: u64, max: u64 },

    #[error("{field} must be between 1 and 525600 minutes, got {value}")]
    EventWindow { field: &'static str, value: i64 },

    #[error("coincidence_radius_deg must be in (0, 180], got {0}")]
    CoincidenceRadius(f64),

    #[error("metrics address '{0}' is not a socket address")]
    MetricsAddress(String),
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ReceiverConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.gcn.subscriptions.is_empty() {
        errors.push(ValidationError::NoSubscriptions);
    }

    let mut seen = HashSet::new();
    for topic in &config.gcn.subscriptions {
        if !seen.insert(topic.as_str()) {
            errors.push(ValidationError::DuplicateSubscription(topic.clone()));
        }
    }

    for (path, settings) in &config.topics {
        if settings.limit == 0 {
            errors.push(ValidationError::ZeroLimit(path.clone()));
        }
    }

    let registry = TopicRegistry::from_config(config);
    for topic in &config.gcn.subscriptions {
        if let Err(e) = registry.resolve(topic) {
            errors.push(e.into());
        }
    }

    let poll = &config.receiver;
    if poll.poll_interval_ms == 0 {
        errors.push(ValidationError::ZeroTiming("poll_interval_ms"));
    }
    if poll.poll_timeout_ms == 0 {
        errors.push(ValidationError::ZeroTiming("poll_timeout_ms"));
    }
    if poll.backoff_base_ms == 0 {
        errors.push(ValidationError::ZeroTiming("backoff_base_ms"));
    }
    if poll.backoff_base_ms > poll.backoff_max_ms {
        errors.push(ValidationError::BackoffRange {
            base: poll.backoff_base_ms,
            max: poll.backoff_max_ms,
        });
    }

    let events = &config.events;
    for (field, value) in [
        ("retention_minutes", events.retention_minutes),
        ("coincidence_minutes", events.coincidence_minutes),
    ] {
        if !(1..=MAX_WINDOW_MINUTES).contains(&value) {
            errors.push(ValidationError::EventWindow { field, value });
        }
    }
    let radius = events.coincidence_radius_deg;
    if !(radius.is_finite() && radius > 0.0 && radius <= 180.0) {
        errors.push(ValidationError::CoincidenceRadius(radius));
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
