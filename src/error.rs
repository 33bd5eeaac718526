//! s3wal Error Types

use thiserror::Error;

use crate::storage::StoreError;
use crate::wal::Offset;

/// Result type alias for s3wal operations
pub type Result<T> = std::result::Result<T, Error>;

/// s3wal error types
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    // Write path
    #[error("Offset {offset} already exists at key {key}")]
    AlreadyExists { offset: Offset, key: String },

    #[error("Log offset overflow: cursor is at u64::MAX")]
    OffsetOverflow,

    // Read path
    #[error("No record at offset {offset} (key {key})")]
    NoSuchRecord { offset: Offset, key: String },

    #[error("Log is empty: no records under prefix {prefix:?}")]
    EmptyLog { prefix: String },

    // Corruption
    #[error("Malformed record at offset {offset}: {len} bytes is shorter than the minimum frame")]
    Malformed { offset: Offset, len: usize },

    #[error("Offset mismatch: expected {expected}, record carries {found}")]
    OffsetMismatch { expected: Offset, found: Offset },

    #[error("Checksum mismatch at offset {offset}")]
    ChecksumMismatch { offset: Offset },

    #[error("Invalid record key {key:?}: {reason}")]
    KeyFormat { key: String, reason: String },

    // Storage collaborator
    #[error("Storage {op} failed for key {key}: {source}")]
    Storage {
        op: &'static str,
        key: String,
        #[source]
        source: StoreError,
    },

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Check if this error means stored data can no longer be trusted
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Error::Malformed { .. }
                | Error::OffsetMismatch { .. }
                | Error::ChecksumMismatch { .. }
                | Error::KeyFormat { .. }
        )
    }

    /// Check if this error is retryable after re-deriving the log frontier
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::AlreadyExists { .. })
    }

    pub(crate) fn storage(op: &'static str, key: impl Into<String>, source: StoreError) -> Self {
        Error::Storage {
            op,
            key: key.into(),
            source,
        }
    }
}
