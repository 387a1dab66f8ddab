//! Crate-level error taxonomy
//!
//! Every error carries a stable code with both a symbolic and a numeric
//! form:
//!
//! | code | symbol |
//! |------|--------|
//! | 1001 | NORIM_INVALID_PATH |
//! | 1002 | NORIM_DB_CLOSED |
//! | 1101 | NORIM_INVALID_COLLECTION_NAME |
//! | 1102 | NORIM_DUPLICATE_KEY |
//! | 1201 | NORIM_INVALID_DOCUMENT_TYPE |
//! | 1301 | NORIM_INVALID_LENGTH |
//! | 1302 | NORIM_INVALID_ENCODING |
//! | 1401 | NORIM_STORAGE_IO |
//! | 1402 | NORIM_DATA_CORRUPTION |
//! | 1403 | NORIM_CODEC |
//! | 1501 | NORIM_CONFIG |

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::document::DocId;
use crate::storage::StorageError;

/// How bad an error is for the database directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The operation failed; retrying or reopening is fine
    Error,
    /// On-disk state is inconsistent; stop using the directory
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

/// Stable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InvalidPath,
    DbClosed,
    InvalidCollectionName,
    DuplicateKey,
    InvalidDocumentType,
    InvalidLength,
    InvalidEncoding,
    StorageIo,
    DataCorruption,
    Codec,
    Config,
}

impl ErrorCode {
    /// Returns the symbolic code.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::InvalidPath => "NORIM_INVALID_PATH",
            ErrorCode::DbClosed => "NORIM_DB_CLOSED",
            ErrorCode::InvalidCollectionName => "NORIM_INVALID_COLLECTION_NAME",
            ErrorCode::DuplicateKey => "NORIM_DUPLICATE_KEY",
            ErrorCode::InvalidDocumentType => "NORIM_INVALID_DOCUMENT_TYPE",
            ErrorCode::InvalidLength => "NORIM_INVALID_LENGTH",
            ErrorCode::InvalidEncoding => "NORIM_INVALID_ENCODING",
            ErrorCode::StorageIo => "NORIM_STORAGE_IO",
            ErrorCode::DataCorruption => "NORIM_DATA_CORRUPTION",
            ErrorCode::Codec => "NORIM_CODEC",
            ErrorCode::Config => "NORIM_CONFIG",
        }
    }

    /// Returns the numeric code.
    pub fn number(&self) -> u16 {
        match self {
            ErrorCode::InvalidPath => 1001,
            ErrorCode::DbClosed => 1002,
            ErrorCode::InvalidCollectionName => 1101,
            ErrorCode::DuplicateKey => 1102,
            ErrorCode::InvalidDocumentType => 1201,
            ErrorCode::InvalidLength => 1301,
            ErrorCode::InvalidEncoding => 1302,
            ErrorCode::StorageIo => 1401,
            ErrorCode::DataCorruption => 1402,
            ErrorCode::Codec => 1403,
            ErrorCode::Config => 1501,
        }
    }

    /// Returns the severity for this code.
    pub fn severity(&self) -> Severity {
        match self {
            ErrorCode::DataCorruption => Severity::Fatal,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Errors surfaced by the public API.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Invalid database path ('{}')", .0.display())]
    InvalidPath(PathBuf),

    #[error("Cannot perform action on closed database")]
    DbClosed,

    #[error("Invalid collection name ('{0}')")]
    InvalidCollectionName(String),

    #[error("Duplicate key '{key}' in collection '{collection}'")]
    DuplicateKey { key: DocId, collection: String },

    #[error("Invalid item type ({0}). Only mappings are supported")]
    InvalidDocumentType(&'static str),

    #[error("Invalid id length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Invalid id encoding: {0}")]
    InvalidEncoding(String),

    #[error(transparent)]
    Storage(StorageError),

    #[error(transparent)]
    Corruption(StorageError),

    #[error("Document codec failed: {0}")]
    Codec(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl DbError {
    /// Returns the stable error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            DbError::InvalidPath(_) => ErrorCode::InvalidPath,
            DbError::DbClosed => ErrorCode::DbClosed,
            DbError::InvalidCollectionName(_) => ErrorCode::InvalidCollectionName,
            DbError::DuplicateKey { .. } => ErrorCode::DuplicateKey,
            DbError::InvalidDocumentType(_) => ErrorCode::InvalidDocumentType,
            DbError::InvalidLength { .. } => ErrorCode::InvalidLength,
            DbError::InvalidEncoding(_) => ErrorCode::InvalidEncoding,
            DbError::Storage(_) => ErrorCode::StorageIo,
            DbError::Corruption(_) => ErrorCode::DataCorruption,
            DbError::Codec(_) => ErrorCode::Codec,
            DbError::Config(_) => ErrorCode::Config,
        }
    }

    /// Returns whether the directory should no longer be used.
    pub fn is_fatal(&self) -> bool {
        self.code().severity() == Severity::Fatal
    }
}

impl From<StorageError> for DbError {
    fn from(err: StorageError) -> Self {
        if err.is_fatal() {
            DbError::Corruption(err)
        } else {
            DbError::Storage(err)
        }
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::Codec(err.to_string())
    }
}

/// Result type for database operations
pub type Result<T> = std::result::Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_numeric_codes_are_stable() {
        assert_eq!(ErrorCode::InvalidPath.number(), 1001);
        assert_eq!(ErrorCode::DbClosed.number(), 1002);
        assert_eq!(ErrorCode::InvalidCollectionName.number(), 1101);
        assert_eq!(ErrorCode::DuplicateKey.number(), 1102);
        assert_eq!(ErrorCode::InvalidDocumentType.number(), 1201);
    }

    #[test]
    fn test_storage_error_conversion_keeps_severity() {
        let corrupt: DbError = StorageError::corruption_at_offset(8, "bad frame").into();
        assert_eq!(corrupt.code(), ErrorCode::DataCorruption);
        assert!(corrupt.is_fatal());

        let io_err: DbError =
            StorageError::write_failed("disk full", io::Error::new(io::ErrorKind::Other, "full"))
                .into();
        assert_eq!(io_err.code(), ErrorCode::StorageIo);
        assert!(!io_err.is_fatal());
    }

    #[test]
    fn test_messages() {
        let err = DbError::InvalidCollectionName("__meta".into());
        assert_eq!(err.to_string(), "Invalid collection name ('__meta')");
        assert_eq!(
            DbError::DbClosed.to_string(),
            "Cannot perform action on closed database"
        );

        let key = DocId::from_bytes(b"12345678").unwrap();
        let err = DbError::DuplicateKey {
            key,
            collection: "users".into(),
        };
        assert_eq!(
            err.to_string(),
            "Duplicate key '3132333435363738' in collection 'users'"
        );
    }
}
