//! Collection handle
//!
//! A `Collection` is a name plus a share of its database's engine. Every
//! operation checks that the database is still open before touching input
//! or files.

use crate::document::{DocId, Document, IntoDocument};
use crate::errors::{DbError, Result};
use crate::query::{Filter, SortSpec};

use super::database::{lock, SharedEngine};
use super::engine::Engine;

/// Named set of documents inside a [`crate::Database`].
#[derive(Clone)]
pub struct Collection {
    engine: SharedEngine,
    name: String,
}

impl Collection {
    pub(crate) fn new(engine: SharedEngine, name: &str) -> Self {
        Self {
            engine,
            name: name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn with_engine<T>(&self, op: impl FnOnce(&mut Engine, &str) -> Result<T>) -> Result<T> {
        let mut guard = lock(&self.engine);
        let engine = guard.as_mut().ok_or(DbError::DbClosed)?;
        op(engine, &self.name)
    }

    /// Inserts a document and returns its id.
    ///
    /// A new id is generated when the document has none. An id that is
    /// already keyed in this collection fails with `DuplicateKey`.
    pub fn add(&self, document: impl IntoDocument) -> Result<DocId> {
        self.with_engine(|engine, name| engine.add(name, document.into_document()?))
    }

    /// Inserts documents in order.
    ///
    /// Stops at the first failing document. Documents before it stay
    /// inserted.
    pub fn add_batch<D, I>(&self, documents: I) -> Result<Vec<DocId>>
    where
        D: IntoDocument,
        I: IntoIterator<Item = D>,
    {
        self.with_engine(|engine, name| {
            engine.add_batch(name, documents.into_iter().map(IntoDocument::into_document))
        })
    }

    pub fn get(&self, id: &DocId) -> Result<Option<Document>> {
        self.with_engine(|engine, name| engine.get(name, id))
    }

    /// Replaces the document keyed by `id`. Returns 0 if there is none.
    /// `_id` in `document` is ignored.
    pub fn set(&self, id: &DocId, document: impl IntoDocument) -> Result<usize> {
        self.with_engine(|engine, name| engine.set(name, id, document.into_body()?))
    }

    /// Merges `changes` into the document keyed by `id`. Returns 0 if there
    /// is none. `_id` in `changes` is ignored.
    pub fn update(&self, id: &DocId, changes: impl IntoDocument) -> Result<usize> {
        self.with_engine(|engine, name| engine.update(name, id, changes.into_body()?))
    }

    pub fn remove(&self, id: &DocId) -> Result<usize> {
        self.with_engine(|engine, name| engine.remove(name, id))
    }

    /// Drops the collection's index entry.
    ///
    /// The data log is not compacted. Using this handle afterwards
    /// registers an empty collection under the same name.
    pub fn remove_collection(&self) -> Result<()> {
        self.with_engine(|engine, name| engine.remove_collection(name))
    }

    /// Documents matching `filter`, in insertion order unless `sort` is given.
    pub fn find(&self, filter: &Filter, sort: Option<&SortSpec>) -> Result<Vec<Document>> {
        self.with_engine(|engine, name| engine.find(name, filter, sort))
    }

    /// First matching document in insertion order.
    pub fn find_one(&self, filter: &Filter) -> Result<Option<Document>> {
        Ok(self.find(filter, None)?.into_iter().next())
    }

    pub fn count(&self) -> Result<u64> {
        self.with_engine(|engine, name| engine.count(name))
    }

    /// Keys in insertion order.
    pub fn ids(&self) -> Result<Vec<DocId>> {
        self.with_engine(|engine, name| engine.ids(name))
    }
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection").field("name", &self.name).finish()
    }
}
