//! Receiver for the GCN alert stream.
//!
//! Subscribes to Kafka topics, resolves each topic to its message format and
//! batch limit through dotted-prefix settings, and routes every payload to the
//! JSON or VOEvent handler before handing decoded notices downstream.

pub mod cli;
pub mod config;
pub mod dispatch;
pub mod events;
pub mod lifecycle;
pub mod notice;
pub mod observability;
pub mod resilience;
pub mod routing;
pub mod transport;

pub use config::ReceiverConfig;
pub use dispatch::Dispatcher;
pub use lifecycle::Shutdown;
pub use routing::TopicRegistry;
