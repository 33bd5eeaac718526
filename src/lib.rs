//! s3wal - Append-Only Log on Object Storage
//!
//! A durable, append-only log whose only storage primitives are
//! whole-object PUT (conditional on absence), GET and paginated LIST, as
//! offered by S3-style object stores.
//!
//! # Architecture
//!
//! Every record is stored as its own object under `<prefix>/<offset>`,
//! with the offset zero-padded to 20 digits. The object body embeds the
//! offset and a SHA-256 digest, so a read detects both bit-level corruption
//! and objects stored under the wrong key. Exclusivity per offset comes
//! solely from the store's conditional write; the driver's in-memory cursor
//! is an optimistic hint that recovery re-derives by listing the namespace.
//!
//! # Features
//!
//! - Strictly increasing offsets starting at 1
//! - At most one committed write per offset, even across writers
//! - Integrity checking on every read
//! - Recovery of the log frontier from storage alone
//! - Optional append retry with jittered exponential backoff
//! - In-memory and local filesystem backends via `object_store`

pub mod config;
pub mod error;
pub mod storage;
pub mod wal;

pub use config::S3WalConfig;
pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::S3WalConfig;
    pub use crate::error::{Error, Result};
    pub use crate::storage::{ObjectStore, ObjectStoreBackend, StoreError};
    pub use crate::wal::{ObjectWal, Offset, Record, RetryPolicy, Wal};
}
