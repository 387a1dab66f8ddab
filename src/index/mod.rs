//! Persistent index subsystem
//!
//! In-memory mirror of the system file: per-collection metadata and the
//! key -> data log location map.
//!
//! # Invariants
//!
//! - Keys are unique within a collection
//! - `entry_count == keys.len()` after every mutation
//! - Every location points at a frame that was fully appended before the
//!   location was recorded
//! - Removing a key never touches the data log

mod persistent;

pub use persistent::{
    CollectionMeta, Location, PersistentIndex, ENGINE_ENTRY, FORMAT_VERSION, RESERVED_PREFIX,
};
