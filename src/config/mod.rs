//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse, collect dotted topic settings, deserialize sections)
//!     → validation.rs (semantic checks, every subscription resolves)
//!     → ReceiverConfig (validated, immutable)
//!     → passed by reference to the registry, transport and dispatcher
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload
//! - All optional sections have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    Credentials, EventsConfig, GcnConfig, KafkaConfig, LogFormat, MessageFormat,
    ObservabilityConfig, PollConfig, ReceiverConfig, TopicSettings,
};
pub use validation::ValidationError;
