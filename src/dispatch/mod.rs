//! Message dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! Idle ──(interval elapsed)──▶ Polling
//!     for each Subscription (declaration order):
//!         Transport::fetch(topic, limit)
//!             Err → log, count, next topic
//!             Ok(batch) → for each message:
//!                 HandlerTable[message_type].decode
//!                     Err → log, count, next message
//!                     Ok(notice) → NoticeSink::accept
//! Polling ──(cycle done)──▶ Idle ──(shutdown)──▶ exit
//! ```
//!
//! # Design Decisions
//! - Single task, sequential per topic; no locking
//! - Only startup errors are fatal; steady-state errors skip one unit of work
//! - Test injection goes straight to the handlers and never polls

pub mod dispatcher;
pub mod injection;

pub use dispatcher::{deliver, CycleReport, DispatchState, Dispatcher};
pub use injection::{process_test_message, TestMessageError, DEFAULT_TEST_TOPIC};
