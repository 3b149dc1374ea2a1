//! Downstream hand-off of decoded notices.
//!
//! # Data Flow
//! ```text
//! Notice (from a handler)
//!     → NoticeSink::accept
//!     → store.rs (EventLog: dedup by id, coincidence lookups, retention)
//! ```
//!
//! # Design Decisions
//! - The dispatcher owns its sink; no locking
//! - Triggering decisions live downstream of this boundary

pub mod store;

use crate::notice::Notice;

pub use store::{EventLog, Recorded, StoredEvent};

/// Receiver of decoded notices.
pub trait NoticeSink {
    fn accept(&mut self, notice: Notice);
}

impl<S: NoticeSink + ?Sized> NoticeSink for &mut S {
    fn accept(&mut self, notice: Notice) {
        (**self).accept(notice)
    }
}

impl NoticeSink for Vec<Notice> {
    fn accept(&mut self, notice: Notice) {
        self.push(notice);
    }
}
