//! Database subsystem
//!
//! [`Database`] owns an open directory: the system file holding the
//! persistent index and the append-only data log. [`Collection`] handles
//! share the database's engine and stop working once it is closed.
//!
//! # Write Path
//!
//! 1. Encode the document with the configured codec
//! 2. Append one frame to the data log
//! 3. Update the in-memory index
//! 4. Rewrite the system file from the index

mod collection;
mod config;
mod database;
mod engine;

pub use collection::Collection;
pub use config::DbConfig;
pub use database::Database;
