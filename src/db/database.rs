//! Database handle

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::document::{DocumentCodec, JsonCodec};
use crate::errors::{DbError, Result};
use crate::index::PersistentIndex;
use crate::observability::{Event, Logger};

use super::collection::Collection;
use super::config::DbConfig;
use super::engine::Engine;

/// Engine slot shared by a handle and every collection it handed out.
/// `None` once the handle is closed.
pub(crate) type SharedEngine = Arc<Mutex<Option<Engine>>>;

pub(crate) fn lock(engine: &SharedEngine) -> MutexGuard<'_, Option<Engine>> {
    engine.lock().unwrap_or_else(PoisonError::into_inner)
}

/// An open database directory.
///
/// The handle owns both files. Closing it (explicitly or by dropping it)
/// releases them, and every [`Collection`] obtained from it starts failing
/// with [`DbError::DbClosed`].
pub struct Database {
    engine: SharedEngine,
    root: PathBuf,
    logger: Logger,
}

impl Database {
    /// Opens `dir` with the default configuration.
    ///
    /// The directory must already exist. `sys.ndb` and `data.ndb` are
    /// created inside it when absent.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(dir, DbConfig::default())
    }

    pub fn open_with_config(dir: impl AsRef<Path>, config: DbConfig) -> Result<Self> {
        Self::open_with_codec(dir, config, Box::new(JsonCodec))
    }

    /// Opens `dir` with a caller-supplied document codec.
    ///
    /// A directory must always be reopened with the codec that wrote it.
    pub fn open_with_codec(
        dir: impl AsRef<Path>,
        config: DbConfig,
        codec: Box<dyn DocumentCodec>,
    ) -> Result<Self> {
        let root = dir.as_ref().to_path_buf();
        let logger = Logger::new(config.log_level);
        let engine = Engine::open(&root, &config, codec, logger)?;
        Ok(Self {
            engine: Arc::new(Mutex::new(Some(engine))),
            root,
            logger,
        })
    }

    /// Returns the collection called `name`, registering it if new.
    pub fn get_collection(&self, name: &str) -> Result<Collection> {
        PersistentIndex::validate_name(name)?;
        let mut guard = lock(&self.engine);
        let engine = guard.as_mut().ok_or(DbError::DbClosed)?;
        engine.ensure_collection(name)?;
        Ok(Collection::new(Arc::clone(&self.engine), name))
    }

    /// Closes the handle. Later calls are no-ops.
    pub fn close(&self) {
        let closed = lock(&self.engine).take();
        if let Some(engine) = closed {
            let root = engine.root().display().to_string();
            drop(engine);
            self.logger.event(Event::DbClose, &[("path", root.as_str())]);
        }
    }

    pub fn is_open(&self) -> bool {
        lock(&self.engine).is_some()
    }

    /// Directory this handle was opened on.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Names of the registered collections, sorted.
    pub fn collection_names(&self) -> Result<Vec<String>> {
        let guard = lock(&self.engine);
        let engine = guard.as_ref().ok_or(DbError::DbClosed)?;
        Ok(engine.collection_names())
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("root", &self.root)
            .field("open", &self.is_open())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;
    use crate::storage::{DATA_FILE_NAME, SYSTEM_FILE_NAME};
    use tempfile::TempDir;

    fn open(dir: &TempDir) -> Database {
        Database::open_with_config(dir.path(), DbConfig::relaxed()).unwrap()
    }

    #[test]
    fn test_open_creates_both_files() {
        let dir = TempDir::new().unwrap();
        let db = open(&dir);
        assert!(db.is_open());
        assert_eq!(db.path(), dir.path());
        assert!(dir.path().join(SYSTEM_FILE_NAME).exists());
        assert!(dir.path().join(DATA_FILE_NAME).exists());
    }

    #[test]
    fn test_open_missing_directory() {
        let dir = TempDir::new().unwrap();
        let err = Database::open(dir.path().join("absent")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidPath);
    }

    #[test]
    fn test_open_on_a_file_is_invalid_path() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("plain");
        std::fs::write(&file, b"x").unwrap();
        let err = Database::open(&file).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidPath);
    }

    #[test]
    fn test_get_collection_registers_name() {
        let dir = TempDir::new().unwrap();
        let db = open(&dir);
        db.get_collection("users").unwrap();
        db.get_collection("orders").unwrap();
        db.get_collection("users").unwrap();
        assert_eq!(db.collection_names().unwrap(), ["orders", "users"]);
    }

    #[test]
    fn test_reserved_and_empty_names_rejected() {
        let dir = TempDir::new().unwrap();
        let db = open(&dir);
        for name in ["__norimdb", "__private", ""] {
            let err = db.get_collection(name).unwrap_err();
            assert_eq!(err.code(), ErrorCode::InvalidCollectionName);
        }
        assert!(db.collection_names().unwrap().is_empty());
    }

    #[test]
    fn test_closed_handle() {
        let dir = TempDir::new().unwrap();
        let db = open(&dir);
        db.close();
        assert!(!db.is_open());
        assert_eq!(db.get_collection("users").unwrap_err().code(), ErrorCode::DbClosed);
        assert_eq!(db.collection_names().unwrap_err().code(), ErrorCode::DbClosed);
        db.close();
    }
}
