//! Topic settings lookup.
//!
//! # Responsibilities
//! - Store the settings table collected from the configuration
//! - Resolve a topic by exact match, then by nearest dotted ancestor
//! - Turn the subscription list into resolved `Subscription`s
//!
//! # Design Decisions
//! - Immutable after construction
//! - O(1) lookup per candidate via HashMap, O(depth) candidates per topic
//! - Explicit `UnresolvedTopicError` rather than a silent default

use std::collections::HashMap;

use thiserror::Error;

use crate::config::{ReceiverConfig, TopicSettings};
use crate::routing::matcher::dotted_ancestors;

/// No settings path matches a topic or any of its ancestors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no settings found for topic '{topic}' or any of its dotted prefixes")]
pub struct UnresolvedTopicError {
    pub topic: String,
}

/// A subscribed topic together with its effective settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    /// Topic name as subscribed.
    pub topic: String,

    /// Settings path the topic resolved through.
    pub settings_path: String,

    /// Effective settings.
    pub settings: TopicSettings,
}

/// Lookup table from dotted settings path to topic settings.
#[derive(Debug, Clone, Default)]
pub struct TopicRegistry {
    entries: HashMap<String, TopicSettings>,
}

impl TopicRegistry {
    pub fn new(entries: HashMap<String, TopicSettings>) -> Self {
        Self { entries }
    }

    /// Build the registry from the configuration's settings table.
    pub fn from_config(config: &ReceiverConfig) -> Self {
        Self::new(
            config
                .topics
                .iter()
                .map(|(path, settings)| (path.clone(), *settings))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a topic to its settings.
    pub fn resolve(&self, topic: &str) -> Result<TopicSettings, UnresolvedTopicError> {
        self.resolve_entry(topic).map(|(_, settings)| settings)
    }

    /// Resolve a topic, also returning the settings path that matched.
    pub fn resolve_entry<'t>(
        &self,
        topic: &'t str,
    ) -> Result<(&'t str, TopicSettings), UnresolvedTopicError> {
        dotted_ancestors(topic)
            .find_map(|path| self.entries.get(path).map(|settings| (path, *settings)))
            .ok_or_else(|| UnresolvedTopicError {
                topic: topic.to_string(),
            })
    }

    /// Resolve every subscribed topic, failing on the first one without settings.
    pub fn subscriptions(&self, topics: &[String]) -> Result<Vec<Subscription>, UnresolvedTopicError> {
        topics
            .iter()
            .map(|topic| {
                let (path, settings) = self.resolve_entry(topic)?;
                tracing::info!(
                    topic = %topic,
                    settings_path = %path,
                    message_type = %settings.message_type,
                    limit = settings.limit,
                    "Registered for notices"
                );
                Ok(Subscription {
                    topic: topic.clone(),
                    settings_path: path.to_string(),
                    settings,
                })
            })
            .collect()
    }
}
