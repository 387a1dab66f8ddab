//! Append-only data log (`data.ndb`)
//!
//! Every stored document is one frame appended at the current end of the
//! file. A document's offset is the file length at the moment of its append
//! and never changes; replaced and removed documents leave their bytes
//! behind (no compaction).

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use super::errors::{StorageError, StorageResult};
use super::record::{Frame, FRAME_OVERHEAD};
use super::SyncMode;

/// Where a frame landed in the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Appended {
    /// Byte offset of the frame's length prefix
    pub offset: u64,
    /// Frame length in bytes, overhead included
    pub size: u64,
}

/// Handle on the data log file.
pub struct DataLog {
    file: File,
    end: u64,
    sync_mode: SyncMode,
    verify_checksums: bool,
}

impl DataLog {
    /// Opens the log at `path`, creating an empty one if absent.
    pub fn open(path: &Path, sync_mode: SyncMode, verify_checksums: bool) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| {
                StorageError::write_failed(
                    format!("Failed to open data log: {}", path.display()),
                    e,
                )
            })?;

        let end = file
            .metadata()
            .map_err(|e| StorageError::read_failed("Failed to read data log metadata", e))?
            .len();

        Ok(Self {
            file,
            end,
            sync_mode,
            verify_checksums,
        })
    }

    /// Returns the offset the next append will land at.
    pub fn end_offset(&self) -> u64 {
        self.end
    }

    /// Appends one codec-encoded document.
    pub fn append(&mut self, body: Vec<u8>) -> StorageResult<Appended> {
        let bytes = Frame::new(body).serialize().map_err(|e| {
            StorageError::write_failed("Failed to frame document", e)
        })?;
        let offset = self.end;

        self.file
            .seek(SeekFrom::Start(offset))
            .map_err(|e| StorageError::write_failed(format!("Failed to seek to {}", offset), e))?;
        self.file.write_all(&bytes).map_err(|e| {
            StorageError::write_failed(format!("Failed to append frame at {}", offset), e)
        })?;
        self.sync_mode
            .apply(&mut self.file)
            .map_err(|e| StorageError::write_failed("Data log sync failed", e))?;

        let size = bytes.len() as u64;
        self.end += size;
        Ok(Appended { offset, size })
    }

    /// Reads the frame at `offset` and returns its body.
    ///
    /// Only the framing is used to find the end of the record.
    pub fn read_at(&mut self, offset: u64) -> StorageResult<Vec<u8>> {
        if offset + FRAME_OVERHEAD as u64 > self.end {
            return Err(StorageError::corruption_at_offset(
                offset,
                format!("Frame starts past end of data log ({} bytes)", self.end),
            ));
        }

        self.file
            .seek(SeekFrom::Start(offset))
            .map_err(|e| StorageError::read_failed(format!("Failed to seek to {}", offset), e))?;

        let mut header = [0u8; 4];
        self.file.read_exact(&mut header).map_err(|e| {
            StorageError::corruption_at_offset(offset, format!("Failed to read frame length: {}", e))
        })?;
        let total = Frame::declared_len(header) as u64;

        if total < FRAME_OVERHEAD as u64 || offset + total > self.end {
            return Err(StorageError::corruption_at_offset(
                offset,
                format!(
                    "Frame length {} does not fit in data log of {} bytes",
                    total, self.end
                ),
            ));
        }

        let mut buf = vec![0u8; total as usize];
        buf[..4].copy_from_slice(&header);
        self.file.read_exact(&mut buf[4..]).map_err(|e| {
            StorageError::corruption_at_offset(offset, format!("Failed to read frame body: {}", e))
        })?;

        let (frame, _) = Frame::deserialize(&buf, self.verify_checksums)
            .map_err(|e| StorageError::corruption_at_offset(offset, e.to_string()))?;
        Ok(frame.body)
    }
}
