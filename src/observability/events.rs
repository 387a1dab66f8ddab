//! Observable events
//!
//! Every log line the engine writes names one of these events.

use std::fmt;

use super::logger::Severity;

/// Events emitted by the database handle and its collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Both files opened
    DbOpen,
    /// File handles released
    DbClose,
    /// Persistent index decoded from a non-empty system file
    IndexLoaded,
    /// System file was empty; started from an empty index
    IndexInitialized,
    /// Full index image rewritten to the system file
    IndexSync,

    // Collections
    /// Metadata entry registered for a new collection name
    CollectionCreated,
    /// Metadata entry dropped
    CollectionDropped,

    // Documents
    /// Document appended and keyed
    DocumentAdded,
    /// Document re-appended under an existing key (set/update)
    DocumentReplaced,
    /// Key removed from a collection
    DocumentRemoved,
    /// Batch stopped at a failing element
    BatchAborted,

    // Queries
    /// `find` finished its scan
    QueryExecuted,

    // Integrity
    /// A frame failed length or checksum validation
    DataCorruption,
}

impl Event {
    /// Returns the event name written to log lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::DbOpen => "DB_OPEN",
            Event::DbClose => "DB_CLOSE",
            Event::IndexLoaded => "INDEX_LOADED",
            Event::IndexInitialized => "INDEX_INITIALIZED",
            Event::IndexSync => "INDEX_SYNC",
            Event::CollectionCreated => "COLLECTION_CREATED",
            Event::CollectionDropped => "COLLECTION_DROPPED",
            Event::DocumentAdded => "DOCUMENT_ADDED",
            Event::DocumentReplaced => "DOCUMENT_REPLACED",
            Event::DocumentRemoved => "DOCUMENT_REMOVED",
            Event::BatchAborted => "BATCH_ABORTED",
            Event::QueryExecuted => "QUERY_COMPLETE",
            Event::DataCorruption => "DATA_CORRUPTION",
        }
    }

    /// Default severity for the event.
    pub fn severity(&self) -> Severity {
        match self {
            Event::DbOpen
            | Event::DbClose
            | Event::IndexLoaded
            | Event::IndexInitialized
            | Event::CollectionCreated
            | Event::CollectionDropped => Severity::Info,
            Event::IndexSync
            | Event::DocumentAdded
            | Event::DocumentReplaced
            | Event::DocumentRemoved
            | Event::QueryExecuted => Severity::Trace,
            Event::BatchAborted => Severity::Warn,
            Event::DataCorruption => Severity::Fatal,
        }
    }

    /// Returns true if this event means the directory can no longer be trusted.
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
