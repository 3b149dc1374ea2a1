//! Topic routing subsystem.
//!
//! # Data Flow
//! ```text
//! Subscribed topic name (dotted namespace)
//!     → matcher.rs (topic, then each dotted ancestor)
//!     → registry.rs (first candidate present in the settings table)
//!     → Return: Subscription or UnresolvedTopicError
//!
//! Registry construction (at startup):
//!     ReceiverConfig.topics
//!     → Freeze as immutable TopicRegistry
//! ```
//!
//! # Design Decisions
//! - Registry built at startup, immutable at runtime
//! - Deterministic: longest dotted prefix wins, declaration order is irrelevant
//! - Unresolved subscriptions abort startup

pub mod matcher;
pub mod registry;

pub use registry::{Subscription, TopicRegistry, UnresolvedTopicError};
