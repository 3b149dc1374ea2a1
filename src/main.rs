//! GCN alert receiver.
//!
//! # Architecture Overview
//!
//! ```text
//!   config.toml ──▶ config ──▶ routing ──▶ Vec<Subscription>
//!                                              │
//!   GCN Kafka ──▶ transport ──▶ dispatch ◀─────┘
//!                                  │
//!                                  ▼
//!                    notice (json | voevent handler)
//!                                  │
//!                                  ▼
//!                         events (EventLog sink)
//! ```
//!
//! With `-t`, the test message goes straight to the handlers and the broker
//! is never contacted.

use std::net::SocketAddr;
use std::process::ExitCode;

use clap::Parser;

use lo2t::cli::Cli;
use lo2t::config::{load_config, ObservabilityConfig};
use lo2t::dispatch::{process_test_message, Dispatcher, TestMessageError};
use lo2t::events::EventLog;
use lo2t::lifecycle::{spawn_signal_listener, Shutdown};
use lo2t::notice::HandlerTable;
use lo2t::observability::{init_logging, metrics};
use lo2t::routing::TopicRegistry;
use lo2t::transport::KafkaTransport;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli.configfile) {
        Ok(config) => config,
        Err(e) => {
            let _ = init_logging(&ObservabilityConfig::default(), cli.verbose);
            tracing::error!(
                path = %cli.configfile.display(),
                error = %e,
                "Failed to load configuration"
            );
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&config.observability, cli.verbose) {
        eprintln!("Failed to initialise logging: {}", e);
        return ExitCode::FAILURE;
    }

    tracing::info!(
        config = %cli.configfile.display(),
        domain = %config.gcn.domain,
        "lo2t receiver starting"
    );

    let registry = TopicRegistry::from_config(&config);
    let subscriptions = match registry.subscriptions(&config.gcn.subscriptions) {
        Ok(subscriptions) => subscriptions,
        Err(e) => {
            tracing::error!(error = %e, "Subscription does not resolve");
            return ExitCode::FAILURE;
        }
    };

    let handlers = HandlerTable::default();
    let mut events = EventLog::new(&config.events);

    if let Some(payload) = cli.test_message {
        return match process_test_message(
            &registry,
            &handlers,
            &mut events,
            payload,
            cli.test_topic.as_deref(),
        ) {
            Ok(_) => ExitCode::SUCCESS,
            Err(TestMessageError::Unresolved(e)) => {
                tracing::error!(error = %e, "Test topic does not resolve");
                ExitCode::FAILURE
            }
            Err(TestMessageError::Decode(_)) => ExitCode::FAILURE,
        };
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let transport = match KafkaTransport::connect(
        &config.gcn,
        &config.kafka,
        &config.receiver,
        &subscriptions,
    ) {
        Ok(transport) => transport,
        Err(e) => {
            tracing::error!(error = %e, "Failed to create Kafka consumers");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = Shutdown::new();
    let shutdown_rx = shutdown.subscribe();
    spawn_signal_listener(shutdown);

    let mut dispatcher = Dispatcher::new(
        subscriptions,
        transport,
        handlers,
        events,
        config.receiver.clone(),
    );
    dispatcher.run(shutdown_rx).await;

    tracing::info!(events = dispatcher.sink().len(), "Shutdown complete");
    ExitCode::SUCCESS
}
