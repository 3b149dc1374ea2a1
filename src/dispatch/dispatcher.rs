//! Poll loop and per-message dispatch.
//!
//! # Responsibilities
//! - Poll every subscription once per cycle, never taking more than its limit
//! - Decode each message with the handler for the topic's resolved format
//! - Hand decoded notices to the sink
//! - Keep polling through transport and decode failures
//! - Stop between cycles when shutdown is signalled

use tokio::sync::broadcast;

use crate::config::{MessageFormat, PollConfig};
use crate::events::NoticeSink;
use crate::notice::{DecodeError, HandlerTable, RawMessage};
use crate::observability::metrics;
use crate::resilience::Backoff;
use crate::routing::Subscription;
use crate::transport::Transport;

/// Dispatcher state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    /// Waiting for the next poll cycle.
    Idle,
    /// Fetching and handling messages.
    Polling,
}

/// Counts from one poll cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Subscriptions polled.
    pub polled: usize,
    /// Messages returned by the transport (after truncation to the limit).
    pub received: usize,
    /// Messages decoded and handed to the sink.
    pub delivered: usize,
    /// Messages skipped because they did not decode.
    pub decode_errors: usize,
    /// Subscriptions whose poll failed.
    pub transport_errors: usize,
}

impl CycleReport {
    /// Every poll in the cycle failed.
    pub fn all_failed(&self) -> bool {
        self.polled > 0 && self.transport_errors == self.polled
    }
}

/// Routes messages from the transport to the format handlers.
pub struct Dispatcher<T, S> {
    subscriptions: Vec<Subscription>,
    transport: T,
    handlers: HandlerTable,
    sink: S,
    poll: PollConfig,
    backoff: Backoff,
    state: DispatchState,
}

impl<T: Transport, S: NoticeSink> Dispatcher<T, S> {
    pub fn new(
        subscriptions: Vec<Subscription>,
        transport: T,
        handlers: HandlerTable,
        sink: S,
        poll: PollConfig,
    ) -> Self {
        Self {
            subscriptions,
            transport,
            handlers,
            sink,
            backoff: Backoff::from_config(&poll),
            poll,
            state: DispatchState::Idle,
        }
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Consecutive cycles in which every poll failed.
    pub fn consecutive_failures(&self) -> u32 {
        self.backoff.failures()
    }

    /// Poll every subscription once and handle what came back.
    pub async fn run_cycle(&mut self) -> CycleReport {
        self.state = DispatchState::Polling;
        let mut report = CycleReport::default();

        for subscription in &self.subscriptions {
            report.polled += 1;
            let topic = subscription.topic.as_str();
            let limit = subscription.settings.limit;

            let mut batch = match self.transport.fetch(topic, limit).await {
                Ok(batch) => batch,
                Err(e) => {
                    report.transport_errors += 1;
                    metrics::record_transport_error(topic);
                    tracing::warn!(topic = %topic, error = %e, "Poll failed, retrying next cycle");
                    continue;
                }
            };

            if batch.len() > limit {
                tracing::warn!(
                    topic = %topic,
                    returned = batch.len(),
                    limit,
                    "Transport returned more than the limit, dropping the excess"
                );
                batch.truncate(limit);
            }
            if batch.is_empty() {
                continue;
            }

            metrics::record_messages(topic, batch.len());
            report.received += batch.len();

            for message in batch {
                match deliver(
                    &self.handlers,
                    &mut self.sink,
                    subscription.settings.message_type,
                    message,
                ) {
                    Ok(()) => report.delivered += 1,
                    Err(_) => report.decode_errors += 1,
                }
            }
        }

        self.state = DispatchState::Idle;
        metrics::record_cycle();
        tracing::debug!(
            polled = report.polled,
            received = report.received,
            delivered = report.delivered,
            decode_errors = report.decode_errors,
            transport_errors = report.transport_errors,
            "Poll cycle complete"
        );
        report
    }

    /// Deliver one message without touching the transport.
    pub fn inject(&mut self, message: RawMessage, format: MessageFormat) -> Result<(), DecodeError> {
        deliver(&self.handlers, &mut self.sink, format, message)
    }

    /// Poll until shutdown is signalled.
    ///
    /// Shutdown is only observed between cycles; a cycle in progress always
    /// completes.
    pub async fn run(&mut self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(topics = self.subscriptions.len(), "Listening");

        loop {
            let report = self.run_cycle().await;

            let delay = if report.all_failed() {
                let delay = self.backoff.fail();
                tracing::warn!(
                    failures = self.backoff.failures(),
                    delay_ms = delay.as_millis() as u64,
                    "Every poll failed, backing off"
                );
                delay
            } else {
                self.backoff.reset();
                self.poll.interval()
            };

            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    tracing::info!("Shutdown signal received, stopping poll loop");
                    break;
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}

/// Decode one message and hand the notice to the sink.
///
/// Decode failures are logged and returned; they never reach the sink.
pub fn deliver<S: NoticeSink>(
    handlers: &HandlerTable,
    sink: &mut S,
    format: MessageFormat,
    message: RawMessage,
) -> Result<(), DecodeError> {
    tracing::info!(
        topic = %message.topic,
        partition = ?message.partition,
        offset = ?message.offset,
        format = %format,
        "Received message"
    );

    match handlers.decode(format, &message) {
        Ok(notice) => {
            sink.accept(notice);
            Ok(())
        }
        Err(e) => {
            metrics::record_decode_error(&message.topic, format);
            tracing::error!(
                topic = %message.topic,
                offset = ?message.offset,
                format = %format,
                error = %e,
                "Failed to process message"
            );
            Err(e)
        }
    }
}
