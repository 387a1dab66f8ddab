//! Observability subsystem
//!
//! Structured logging only. Logging is read-only with respect to engine
//! state: a failed log write never fails the operation that produced it, and
//! nothing runs in the background.
//!
//! ```ignore
//! use norimdb::observability::{Event, Logger, Severity};
//!
//! let logger = Logger::new(Severity::Info);
//! logger.event(Event::DbOpen, &[("path", "/var/lib/app")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

#[cfg(test)]
pub(crate) use logger::capture;
