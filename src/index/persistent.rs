//! Persistent index: collection name -> metadata -> key -> location
//!
//! The whole structure is resident in memory for the handle's lifetime and
//! is re-encoded in full on every sync. `entry_count` is maintained
//! alongside `keys` and always equals `keys.len()` after a mutation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::document::DocId;
use crate::errors::{DbError, Result};
use crate::storage::Appended;

/// Collection names starting with this prefix belong to the engine.
pub const RESERVED_PREFIX: &str = "__";

/// Key of the engine's own entry in the encoded index.
pub const ENGINE_ENTRY: &str = "__norimdb";

/// Current encoding version of the system record.
pub const FORMAT_VERSION: u32 = 1;

/// Where one document's current frame lives in the data log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Byte offset in the data log
    pub offset: u64,
    /// Frame size in bytes (informational; the frame is self-delimiting)
    pub size: u64,
    /// Insertion sequence within the collection, kept across replaces
    #[serde(default)]
    pub seq: u64,
}

/// Metadata for one collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionMeta {
    pub name: String,
    pub entry_count: u64,
    #[serde(default)]
    next_seq: u64,
    keys: BTreeMap<DocId, Location>,
}

impl CollectionMeta {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entry_count: 0,
            next_seq: 0,
            keys: BTreeMap::new(),
        }
    }

    pub fn contains(&self, id: &DocId) -> bool {
        self.keys.contains_key(id)
    }

    pub fn location(&self, id: &DocId) -> Option<Location> {
        self.keys.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Registers a new key. The caller has already checked for duplicates.
    pub fn insert(&mut self, id: DocId, at: Appended) {
        let location = Location {
            offset: at.offset,
            size: at.size,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        if self.keys.insert(id, location).is_none() {
            self.entry_count += 1;
        }
    }

    /// Points an existing key at a newer frame. Returns false if absent.
    pub fn relocate(&mut self, id: &DocId, at: Appended) -> bool {
        match self.keys.get_mut(id) {
            Some(location) => {
                location.offset = at.offset;
                location.size = at.size;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &DocId) -> Option<Location> {
        let removed = self.keys.remove(id);
        if removed.is_some() {
            self.entry_count = self.entry_count.saturating_sub(1);
        }
        removed
    }

    /// Keys with their locations, in insertion order.
    pub fn entries_in_order(&self) -> Vec<(DocId, Location)> {
        let mut entries: Vec<(DocId, Location)> =
            self.keys.iter().map(|(id, loc)| (*id, *loc)).collect();
        entries.sort_by_key(|(_, loc)| loc.seq);
        entries
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct EngineMeta {
    format_version: u32,
}

impl Default for EngineMeta {
    fn default() -> Self {
        Self {
            format_version: FORMAT_VERSION,
        }
    }
}

/// The system record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PersistentIndex {
    #[serde(rename = "__norimdb", default)]
    engine: EngineMeta,
    #[serde(flatten)]
    collections: BTreeMap<String, CollectionMeta>,
}

impl PersistentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects empty names and names in the engine's reserved space.
    pub fn validate_name(name: &str) -> Result<()> {
        if name.is_empty() || name.starts_with(RESERVED_PREFIX) {
            return Err(DbError::InvalidCollectionName(name.to_string()));
        }
        Ok(())
    }

    pub fn collection(&self, name: &str) -> Option<&CollectionMeta> {
        self.collections.get(name)
    }

    pub fn collection_mut(&mut self, name: &str) -> Option<&mut CollectionMeta> {
        self.collections.get_mut(name)
    }

    /// Registers `name` if absent. Returns true if it was created.
    pub fn ensure_collection(&mut self, name: &str) -> bool {
        if self.collections.contains_key(name) {
            return false;
        }
        self.collections
            .insert(name.to_string(), CollectionMeta::new(name));
        true
    }

    /// Drops a collection's metadata. Returns the dropped entry.
    pub fn drop_collection(&mut self, name: &str) -> Option<CollectionMeta> {
        self.collections.remove(name)
    }

    pub fn collection_names(&self) -> Vec<String> {
        self.collections.keys().cloned().collect()
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let index: PersistentIndex = serde_json::from_slice(bytes)
            .map_err(|e| DbError::Codec(format!("Failed to decode system index: {}", e)))?;
        if index.engine.format_version != FORMAT_VERSION {
            return Err(DbError::Codec(format!(
                "Unsupported system index version {} (expected {})",
                index.engine.format_version, FORMAT_VERSION
            )));
        }
        Ok(index)
    }
}
