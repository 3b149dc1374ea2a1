//! Metrics collection and exposition.
//!
//! # Metrics
//! - `lo2t_poll_cycles_total` (counter): completed poll cycles
//! - `lo2t_messages_received_total` (counter): messages by topic
//! - `lo2t_decode_errors_total` (counter): skipped payloads by topic, format
//! - `lo2t_transport_errors_total` (counter): failed polls by topic
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - The Prometheus endpoint is opt-in

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::config::MessageFormat;

/// Install the Prometheus exporter with an HTTP scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_cycle() {
    metrics::counter!("lo2t_poll_cycles_total").increment(1);
}

pub fn record_messages(topic: &str, count: usize) {
    metrics::counter!("lo2t_messages_received_total", "topic" => topic.to_string())
        .increment(count as u64);
}

pub fn record_decode_error(topic: &str, format: MessageFormat) {
    metrics::counter!(
        "lo2t_decode_errors_total",
        "topic" => topic.to_string(),
        "format" => format.as_str()
    )
    .increment(1);
}

pub fn record_transport_error(topic: &str) {
    metrics::counter!("lo2t_transport_errors_total", "topic" => topic.to_string()).increment(1);
}
