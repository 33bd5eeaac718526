//! Write-Ahead Log Module
//!
//! Append-only log built from whole-object PUT/GET/LIST. Each record is
//! one object, keyed by its offset under a namespace prefix.

pub mod key;
mod driver;
pub mod record;
mod retry;

pub use driver::ObjectWal;
pub use retry::RetryPolicy;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// Log offset - 1-based position of a record within a namespace
pub type Offset = u64;

/// A record read back from the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub offset: Offset,
    pub data: Bytes,
}

/// Append-only log operations
#[async_trait]
pub trait Wal: Send + Sync {
    /// Append `data` at the next offset and return that offset
    async fn append(&self, data: &[u8]) -> Result<Offset>;

    /// Read and validate the record at `offset`
    async fn read(&self, offset: Offset) -> Result<Record>;

    /// Recover the highest stored offset and return its record
    async fn last_record(&self) -> Result<Record>;
}
