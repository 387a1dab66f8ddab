//! Open-database state shared by a handle and its collections
//!
//! Every mutating operation follows the same order: append to the data log,
//! update the in-memory index, then rewrite the system file. A failure after
//! the append leaves orphaned bytes in the data log and an index that does
//! not mention them, which is harmless. A crash during the system file
//! rewrite is not recoverable; it surfaces as corruption on the next open.

use std::path::{Path, PathBuf};

use crate::document::{DocId, Document, DocumentCodec, Fields};
use crate::errors::{DbError, Result};
use crate::index::{CollectionMeta, Location, PersistentIndex};
use crate::observability::{Event, Logger};
use crate::query::{Filter, ResultSorter, SortSpec};
use crate::storage::{DataLog, SystemFile, DATA_FILE_NAME, SYSTEM_FILE_NAME};

use super::config::DbConfig;

pub(crate) struct Engine {
    root: PathBuf,
    system: SystemFile,
    data: DataLog,
    index: PersistentIndex,
    codec: Box<dyn DocumentCodec>,
    logger: Logger,
}

impl Engine {
    pub(crate) fn open(
        root: &Path,
        config: &DbConfig,
        codec: Box<dyn DocumentCodec>,
        logger: Logger,
    ) -> Result<Self> {
        if !root.is_dir() {
            return Err(DbError::InvalidPath(root.to_path_buf()));
        }

        let mut system = SystemFile::open(&root.join(SYSTEM_FILE_NAME), config.sync_mode)?;
        let data = DataLog::open(
            &root.join(DATA_FILE_NAME),
            config.sync_mode,
            config.verify_checksums,
        )?;

        let root_str = root.display().to_string();
        let index = match system.read_image() {
            Ok(Some(image)) => {
                let index = PersistentIndex::decode(&image)?;
                let collections = index.collection_names().len().to_string();
                logger.event(
                    Event::IndexLoaded,
                    &[("path", root_str.as_str()), ("collections", collections.as_str())],
                );
                index
            }
            Ok(None) => {
                logger.event(Event::IndexInitialized, &[("path", root_str.as_str())]);
                PersistentIndex::new()
            }
            Err(e) => {
                if e.is_fatal() {
                    logger.event(
                        Event::DataCorruption,
                        &[("file", SYSTEM_FILE_NAME), ("reason", e.message())],
                    );
                }
                return Err(e.into());
            }
        };

        let data_len = data.end_offset().to_string();
        logger.event(Event::DbOpen, &[("path", root_str.as_str()), ("data_bytes", data_len.as_str())]);

        Ok(Self {
            root: root.to_path_buf(),
            system,
            data,
            index,
            codec,
            logger,
        })
    }

    pub(crate) fn root(&self) -> &Path {
        &self.root
    }

    pub(crate) fn collection_names(&self) -> Vec<String> {
        self.index.collection_names()
    }

    /// Rewrites the whole index image.
    fn sync(&mut self) -> Result<()> {
        let image = self.index.encode()?;
        let bytes = image.len().to_string();
        self.system.write_image(image)?;
        self.logger.trace(Event::IndexSync, &[("bytes", bytes.as_str())]);
        Ok(())
    }

    /// Registers the collection on first access.
    pub(crate) fn ensure_collection(&mut self, name: &str) -> Result<()> {
        if self.index.ensure_collection(name) {
            self.logger.event(Event::CollectionCreated, &[("collection", name)]);
            self.sync()?;
        }
        Ok(())
    }

    fn meta(&self, name: &str) -> Result<&CollectionMeta> {
        self.index
            .collection(name)
            .ok_or_else(|| DbError::InvalidCollectionName(name.to_string()))
    }

    fn meta_mut(&mut self, name: &str) -> Result<&mut CollectionMeta> {
        self.index
            .collection_mut(name)
            .ok_or_else(|| DbError::InvalidCollectionName(name.to_string()))
    }

    fn read_at(&mut self, location: Location) -> Result<Document> {
        let body = self.data.read_at(location.offset).map_err(|e| {
            if e.is_fatal() {
                let offset = location.offset.to_string();
                self.logger.event(
                    Event::DataCorruption,
                    &[("file", DATA_FILE_NAME), ("offset", offset.as_str()), ("reason", e.message())],
                );
            }
            DbError::from(e)
        })?;
        self.codec.decode(&body)
    }

    /// Appends and keys one document without syncing the index.
    fn insert_unsynced(&mut self, name: &str, mut document: Document) -> Result<DocId> {
        let meta = self.meta(name)?;
        let id = match document.id() {
            Some(id) if meta.contains(&id) => {
                return Err(DbError::DuplicateKey {
                    key: id,
                    collection: name.to_string(),
                })
            }
            Some(id) => id,
            None => {
                let mut id = DocId::new();
                while meta.contains(&id) {
                    id = DocId::new();
                }
                id
            }
        };

        let body = self.codec.encode(id, document.fields())?;
        let at = self.data.append(body)?;
        self.meta_mut(name)?.insert(id, at);
        document.set_id(id);

        let offset = at.offset.to_string();
        let hex = id.to_hex();
        self.logger.trace(
            Event::DocumentAdded,
            &[("collection", name), ("id", hex.as_str()), ("offset", offset.as_str())],
        );
        Ok(id)
    }

    pub(crate) fn add(&mut self, name: &str, document: Document) -> Result<DocId> {
        self.ensure_collection(name)?;
        let id = self.insert_unsynced(name, document)?;
        self.sync()?;
        Ok(id)
    }

    /// Adds documents in order with one index sync at the end.
    ///
    /// On failure the documents before the failing one stay added and the
    /// index is synced before the error is returned.
    pub(crate) fn add_batch(
        &mut self,
        name: &str,
        documents: impl IntoIterator<Item = Result<Document>>,
    ) -> Result<Vec<DocId>> {
        self.ensure_collection(name)?;
        let mut ids = Vec::new();

        for document in documents {
            let outcome = document.and_then(|doc| self.insert_unsynced(name, doc));
            match outcome {
                Ok(id) => ids.push(id),
                Err(e) => {
                    let position = ids.len().to_string();
                    let reason = e.to_string();
                    self.logger.warn(
                        Event::BatchAborted,
                        &[("collection", name), ("position", position.as_str()), ("reason", reason.as_str())],
                    );
                    if !ids.is_empty() {
                        self.sync()?;
                    }
                    return Err(e);
                }
            }
        }

        self.sync()?;
        Ok(ids)
    }

    pub(crate) fn get(&mut self, name: &str, id: &DocId) -> Result<Option<Document>> {
        self.ensure_collection(name)?;
        match self.meta(name)?.location(id) {
            Some(location) => self.read_at(location).map(Some),
            None => Ok(None),
        }
    }

    /// Whole-document replace. The stored `_id` stays `id`.
    pub(crate) fn set(&mut self, name: &str, id: &DocId, fields: Fields) -> Result<usize> {
        self.ensure_collection(name)?;
        if !self.meta(name)?.contains(id) {
            return Ok(0);
        }

        let body = self.codec.encode(*id, &fields)?;
        let at = self.data.append(body)?;
        self.meta_mut(name)?.relocate(id, at);
        self.sync()?;

        let offset = at.offset.to_string();
        let hex = id.to_hex();
        self.logger.trace(
            Event::DocumentReplaced,
            &[("collection", name), ("id", hex.as_str()), ("offset", offset.as_str())],
        );
        Ok(1)
    }

    /// Merges `changes` into the stored document, then replaces it.
    pub(crate) fn update(&mut self, name: &str, id: &DocId, changes: Fields) -> Result<usize> {
        let Some(current) = self.get(name, id)? else {
            return Ok(0);
        };
        let mut merged = current.into_fields();
        merged.extend(changes);
        self.set(name, id, merged)
    }

    pub(crate) fn remove(&mut self, name: &str, id: &DocId) -> Result<usize> {
        self.ensure_collection(name)?;
        if self.meta_mut(name)?.remove(id).is_none() {
            return Ok(0);
        }
        self.sync()?;
        let hex = id.to_hex();
        self.logger
            .trace(Event::DocumentRemoved, &[("collection", name), ("id", hex.as_str())]);
        Ok(1)
    }

    pub(crate) fn remove_collection(&mut self, name: &str) -> Result<()> {
        let dropped = self.index.drop_collection(name);
        self.sync()?;
        if let Some(meta) = dropped {
            let orphaned = meta.entry_count.to_string();
            self.logger.event(
                Event::CollectionDropped,
                &[("collection", name), ("orphaned_entries", orphaned.as_str())],
            );
        }
        Ok(())
    }

    pub(crate) fn count(&mut self, name: &str) -> Result<u64> {
        self.ensure_collection(name)?;
        Ok(self.meta(name)?.entry_count)
    }

    pub(crate) fn ids(&mut self, name: &str) -> Result<Vec<DocId>> {
        self.ensure_collection(name)?;
        Ok(self
            .meta(name)?
            .entries_in_order()
            .into_iter()
            .map(|(id, _)| id)
            .collect())
    }

    /// Full scan, filter, optional sort.
    pub(crate) fn find(
        &mut self,
        name: &str,
        filter: &Filter,
        sort: Option<&SortSpec>,
    ) -> Result<Vec<Document>> {
        self.ensure_collection(name)?;
        let entries = self.meta(name)?.entries_in_order();
        let scanned = entries.len();

        let mut matched = Vec::new();
        for (_, location) in entries {
            let document = self.read_at(location)?;
            if filter.matches(&document) {
                matched.push(document);
            }
        }

        if let Some(spec) = sort {
            ResultSorter::sort(&mut matched, spec);
        }

        let scanned = scanned.to_string();
        let returned = matched.len().to_string();
        self.logger.trace(
            Event::QueryExecuted,
            &[("collection", name), ("returned", returned.as_str()), ("scanned", scanned.as_str())],
        );
        Ok(matched)
    }
}
