//! System index file (`sys.ndb`)
//!
//! Holds exactly one frame: the whole encoded persistent index. Every sync
//! rewrites that frame from offset 0 and then truncates the file to the new
//! frame length. There is no journal: a crash between the data log append
//! and this rewrite leaves the previous image in place, and a crash during
//! the rewrite leaves a torn frame that fails its checksum on the next open.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use super::errors::{StorageError, StorageResult};
use super::record::Frame;
use super::SyncMode;

/// Handle on the system index file.
pub struct SystemFile {
    file: File,
    sync_mode: SyncMode,
    len: u64,
}

impl SystemFile {
    /// Opens the system file at `path`, creating an empty one if absent.
    pub fn open(path: &Path, sync_mode: SyncMode) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| {
                StorageError::write_failed(
                    format!("Failed to open system file: {}", path.display()),
                    e,
                )
            })?;

        let len = file
            .metadata()
            .map_err(|e| StorageError::read_failed("Failed to read system file metadata", e))?
            .len();

        Ok(Self {
            file,
            sync_mode,
            len,
        })
    }

    /// Returns true if nothing has ever been synced to this file.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Reads the stored image. `None` for an empty file.
    ///
    /// The checksum is always verified here: a torn index is never loaded.
    pub fn read_image(&mut self) -> StorageResult<Option<Vec<u8>>> {
        if self.is_empty() {
            return Ok(None);
        }

        self.file
            .seek(SeekFrom::Start(0))
            .map_err(|e| StorageError::read_failed("Failed to seek system file", e))?;
        let mut bytes = Vec::with_capacity(self.len as usize);
        self.file
            .read_to_end(&mut bytes)
            .map_err(|e| StorageError::read_failed("Failed to read system file", e))?;

        let (frame, _) = Frame::deserialize(&bytes, true)
            .map_err(|e| StorageError::corruption_at_offset(0, format!("System index: {}", e)))?;
        Ok(Some(frame.body))
    }

    /// Replaces the stored image with `body`.
    pub fn write_image(&mut self, body: Vec<u8>) -> StorageResult<()> {
        let bytes = Frame::new(body)
            .serialize()
            .map_err(|e| StorageError::write_failed("Failed to frame system index", e))?;

        self.file
            .seek(SeekFrom::Start(0))
            .map_err(|e| StorageError::write_failed("Failed to seek system file", e))?;
        self.file
            .write_all(&bytes)
            .map_err(|e| StorageError::write_failed("Failed to write system index", e))?;

        let new_len = bytes.len() as u64;
        if new_len < self.len {
            self.file
                .set_len(new_len)
                .map_err(|e| StorageError::write_failed("Failed to truncate system file", e))?;
        }
        self.sync_mode
            .apply(&mut self.file)
            .map_err(|e| StorageError::write_failed("System file sync failed", e))?;

        self.len = new_len;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_sys(dir: &TempDir) -> SystemFile {
        SystemFile::open(&dir.path().join("sys.ndb"), SyncMode::Flush).unwrap()
    }

    #[test]
    fn test_new_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let mut sys = open_sys(&dir);
        assert!(sys.is_empty());
        assert!(sys.read_image().unwrap().is_none());
    }

    #[test]
    fn test_rewrite_replaces_image() {
        let dir = TempDir::new().unwrap();
        {
            let mut sys = open_sys(&dir);
            sys.write_image(b"a much longer first image".to_vec()).unwrap();
            sys.write_image(b"short".to_vec()).unwrap();
        }

        let mut sys = open_sys(&dir);
        assert_eq!(sys.read_image().unwrap().unwrap(), b"short");
        let on_disk = std::fs::metadata(dir.path().join("sys.ndb")).unwrap().len();
        assert_eq!(on_disk, 13);
    }

    #[test]
    fn test_torn_image_is_corruption() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sys.ndb");
        {
            let mut sys = open_sys(&dir);
            sys.write_image(b"{\"collections\":{}}".to_vec()).unwrap();
        }
        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 3]).unwrap();

        let mut sys = open_sys(&dir);
        let err = sys.read_image().unwrap_err();
        assert!(err.is_fatal());
    }
}
