//! Storage subsystem
//!
//! Two files per database root:
//!
//! - `sys.ndb`: one frame holding the whole persistent index, rewritten on
//!   every sync
//! - `data.ndb`: append-only sequence of frames, one per stored document
//!
//! # Design Principles
//!
//! - Append-only data (no in-place updates, no space reclamation)
//! - Length-prefixed, CRC32-checked frames in both files
//! - Corruption is reported, never repaired
//! - No write-ahead log: the two files are written one after the other

mod checksum;
mod data_log;
mod errors;
mod record;
mod system_file;

use std::fs::File;
use std::io::{self, Write};

use serde::{Deserialize, Serialize};

pub use checksum::compute_checksum;
pub use data_log::{Appended, DataLog};
pub use errors::{StorageError, StorageErrorCode, StorageResult};
pub use record::{Frame, FRAME_OVERHEAD};
pub use system_file::SystemFile;

/// File name of the system index inside a database root.
pub const SYSTEM_FILE_NAME: &str = "sys.ndb";

/// File name of the data log inside a database root.
pub const DATA_FILE_NAME: &str = "data.ndb";

/// How far a completed write is pushed towards the disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// `fsync` after every write
    #[default]
    Fsync,
    /// Flush user-space buffers only; the OS decides when bytes hit disk
    Flush,
}

impl SyncMode {
    pub(crate) fn apply(&self, file: &mut File) -> io::Result<()> {
        file.flush()?;
        if *self == SyncMode::Fsync {
            file.sync_all()?;
        }
        Ok(())
    }
}
