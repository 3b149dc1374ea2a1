//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Poll cycle in which every topic failed:
//!     → backoff.rs (grow the pause before the next cycle, with jitter)
//! Any topic polled successfully:
//!     → backoff reset, regular poll interval
//! ```
//!
//! # Design Decisions
//! - Transport failures are never fatal; the loop only slows down
//! - Delay doubles per failed cycle up to `backoff_max_ms`, plus up to 10% jitter

pub mod backoff;

pub use backoff::{calculate_backoff, Backoff};
