//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once per process
//! - Derive the level from config and `-v` flags
//! - Optionally mirror output to a plain-text log file
//!
//! # Design Decisions
//! - `RUST_LOG` always wins over config and flags
//! - JSON format for production, pretty format for development

use std::fs::OpenOptions;
use std::sync::Mutex;

use thiserror::Error;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("cannot open log file: {0}")]
    LogFile(#[from] std::io::Error),

    #[error("logging already initialised: {0}")]
    Init(#[from] TryInitError),
}

/// Level directive for a configured level raised by `verbosity` `-v` flags.
///
/// The crate's own targets get the more verbose of the configured level and
/// the flag level; `-v` never lowers it.
pub fn level_directive(configured: &str, verbosity: u8) -> String {
    let requested = match verbosity {
        0 => LevelFilter::OFF,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let level = match configured.parse::<LevelFilter>() {
        Ok(level) => level.max(requested),
        Err(_) if verbosity == 0 => return configured.to_string(),
        Err(_) => requested,
    };
    let level = level.to_string().to_ascii_lowercase();
    format!("lo2t={level},receiver={level},notice_decode={level},{configured}")
}

/// Install the global tracing subscriber.
pub fn init_logging(config: &ObservabilityConfig, verbosity: u8) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_directive(&config.log_level, verbosity)));

    let json = config.log_format == LogFormat::Json;
    let stdout_json = json.then(|| fmt::layer().json());
    let stdout_pretty = (!json).then(|| fmt::layer());

    let file_layer = match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_json)
        .with(stdout_pretty)
        .with(file_layer)
        .try_init()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_directive() {
        assert_eq!(
            level_directive("info", 0),
            "lo2t=info,receiver=info,notice_decode=info,info"
        );
        assert!(level_directive("warn", 1).starts_with("lo2t=debug,"));
        assert!(level_directive("warn", 1).ends_with(",warn"));
        assert!(level_directive("info", 5).starts_with("lo2t=trace,"));
    }

    #[test]
    fn test_verbosity_never_lowers_level() {
        assert!(level_directive("trace", 1).starts_with("lo2t=trace,"));
        assert!(level_directive("debug", 1).starts_with("lo2t=debug,"));
        assert!(level_directive("error", 0).starts_with("lo2t=error,"));
    }

    #[test]
    fn test_custom_directive_kept() {
        assert_eq!(level_directive("lo2t=debug,rdkafka=warn", 0), "lo2t=debug,rdkafka=warn");
        assert!(level_directive("lo2t=debug,rdkafka=warn", 2).starts_with("lo2t=trace,"));
    }

    #[test]
    fn test_directive_parses_as_filter() {
        for v in 0..3 {
            assert!(EnvFilter::try_new(level_directive("info", v)).is_ok());
        }
    }
}
