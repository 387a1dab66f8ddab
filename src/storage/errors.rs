//! Storage error types
//!
//! Error codes:
//! - NORIM_STORAGE_WRITE_FAILED (ERROR)
//! - NORIM_STORAGE_READ_FAILED (ERROR)
//! - NORIM_DATA_CORRUPTION (FATAL)

use std::fmt;
use std::io;

/// Severity of a storage failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The operation failed; the handle stays usable
    Error,
    /// On-disk state cannot be trusted
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Storage-specific error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorCode {
    /// Append, seek, truncate or fsync failed
    WriteFailed,
    /// Read or seek failed for a reason other than bad bytes
    ReadFailed,
    /// Frame length or checksum did not validate
    DataCorruption,
}

impl StorageErrorCode {
    /// Returns the symbolic code.
    pub fn code(&self) -> &'static str {
        match self {
            StorageErrorCode::WriteFailed => "NORIM_STORAGE_WRITE_FAILED",
            StorageErrorCode::ReadFailed => "NORIM_STORAGE_READ_FAILED",
            StorageErrorCode::DataCorruption => "NORIM_DATA_CORRUPTION",
        }
    }

    /// Returns the severity level for this code.
    pub fn severity(&self) -> Severity {
        match self {
            StorageErrorCode::DataCorruption => Severity::Fatal,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for StorageErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Storage error with the file context needed to locate the problem.
#[derive(Debug)]
pub struct StorageError {
    code: StorageErrorCode,
    message: String,
    offset: Option<u64>,
    source: Option<io::Error>,
}

impl StorageError {
    /// A write-side I/O failure.
    pub fn write_failed(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: StorageErrorCode::WriteFailed,
            message: message.into(),
            offset: None,
            source: Some(source),
        }
    }

    /// A read-side I/O failure.
    pub fn read_failed(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: StorageErrorCode::ReadFailed,
            message: message.into(),
            offset: None,
            source: Some(source),
        }
    }

    /// Bad bytes at a known file offset.
    pub fn corruption_at_offset(offset: u64, reason: impl Into<String>) -> Self {
        Self {
            code: StorageErrorCode::DataCorruption,
            message: reason.into(),
            offset: Some(offset),
            source: None,
        }
    }

    /// Returns the error code.
    pub fn code(&self) -> StorageErrorCode {
        self.code
    }

    /// Returns the human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the byte offset the error refers to, if any.
    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    /// Returns whether this error makes the directory untrustworthy.
    pub fn is_fatal(&self) -> bool {
        self.code.severity() == Severity::Fatal
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )?;
        if let Some(offset) = self.offset {
            write!(f, " (byte_offset: {})", offset)?;
        }
        if let Some(ref source) = self.source {
            write!(f, " (caused by: {})", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
