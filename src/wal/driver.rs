//! Object-store backed log driver
//!
//! Drives append, read and recovery against an [`ObjectStore`], using the
//! record framing from [`super::record`] and the key layout from
//! [`super::key`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::TryStreamExt;
use tracing::{debug, info, warn};

use super::{key, record, Offset, Record, Wal};
use crate::config::S3WalConfig;
use crate::error::{Error, Result};
use crate::storage::{open_store, ObjectStore, StoreError};

/// Append-only log stored one object per record.
///
/// The driver keeps a local cursor (`length`), the highest offset it
/// believes committed. The cursor is only a hint: exclusivity per offset
/// comes from the store's conditional put, and [`ObjectWal::last_record`]
/// re-derives the true frontier from storage.
pub struct ObjectWal {
    /// Storage collaborator
    store: Arc<dyn ObjectStore>,
    /// Namespace prefix for every record key
    prefix: String,
    /// Highest offset this instance believes committed
    length: AtomicU64,
}

impl ObjectWal {
    /// Create a driver over `store` for the namespace `prefix`.
    ///
    /// The cursor starts at 0; call [`ObjectWal::last_record`] first when
    /// reopening a namespace that already holds records.
    pub fn new(store: Arc<dyn ObjectStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
            length: AtomicU64::new(0),
        }
    }

    /// Open the configured backend and create a driver for its namespace
    pub fn from_config(config: &S3WalConfig) -> Result<Self> {
        config.validate()?;
        let store = open_store(&config.storage)?;
        Ok(Self::new(store, config.prefix()))
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Highest offset this instance believes committed
    pub fn length(&self) -> Offset {
        self.length.load(Ordering::Acquire)
    }

    /// Re-seed the cursor from a frontier known to the caller
    pub fn set_length(&self, length: Offset) {
        self.length.store(length, Ordering::Release);
    }

    /// Append `data` at the next offset.
    ///
    /// The write is conditional on the key being absent. Losing that race
    /// returns [`Error::AlreadyExists`] and leaves the cursor untouched; the
    /// caller decides whether to recover and retry.
    pub async fn append(&self, data: &[u8]) -> Result<Offset> {
        let offset = self
            .length()
            .checked_add(1)
            .ok_or(Error::OffsetOverflow)?;
        let key = key::encode_key(&self.prefix, offset);
        let body = record::encode(offset, data);

        match self.store.put_if_absent(&key, body).await {
            Ok(()) => {}
            Err(StoreError::AlreadyExists) => {
                warn!(offset, key = %key, "Offset already taken");
                return Err(Error::AlreadyExists { offset, key });
            }
            Err(e) => return Err(Error::storage("put", key, e)),
        }

        // Concurrent appends on this instance may land out of order
        self.length.fetch_max(offset, Ordering::AcqRel);
        debug!(offset, bytes = data.len(), "Appended record");
        Ok(offset)
    }

    /// Read and validate the record at `offset`
    pub async fn read(&self, offset: Offset) -> Result<Record> {
        let key = key::encode_key(&self.prefix, offset);

        let body = match self.store.get(&key).await {
            Ok(body) => body,
            Err(StoreError::NotFound) => return Err(Error::NoSuchRecord { offset, key }),
            Err(e) => return Err(Error::storage("get", key, e)),
        };

        let data = record::decode_and_validate(&body, offset).map_err(|e| {
            warn!(offset, key = %key, "Corrupt record: {}", e);
            e
        })?;

        debug!(offset, bytes = data.len(), "Read record");
        Ok(Record { offset, data })
    }

    /// Find the highest stored offset, reset the cursor to it and return
    /// its record.
    ///
    /// Lists every key in the namespace, so the cost grows with the log.
    /// Any key that does not decode to an offset aborts the scan.
    pub async fn last_record(&self) -> Result<Record> {
        let list_prefix = key::list_prefix(&self.prefix);
        let mut keys = self.store.list(&list_prefix);

        let mut max_offset: Offset = 0;
        let mut records: u64 = 0;
        while let Some(key) = keys
            .try_next()
            .await
            .map_err(|e| Error::storage("list", list_prefix.as_str(), e))?
        {
            let offset = key::decode_offset(&self.prefix, &key).map_err(|e| {
                warn!(prefix = %self.prefix, "Unrecognized key in log namespace: {}", e);
                e
            })?;
            max_offset = max_offset.max(offset);
            records += 1;
        }

        if max_offset == 0 {
            return Err(Error::EmptyLog {
                prefix: self.prefix.clone(),
            });
        }

        self.set_length(max_offset);
        info!(
            prefix = %self.prefix,
            last_offset = max_offset,
            records,
            "Recovered log frontier"
        );

        self.read(max_offset).await
    }
}

#[async_trait]
impl Wal for ObjectWal {
    async fn append(&self, data: &[u8]) -> Result<Offset> {
        ObjectWal::append(self, data).await
    }

    async fn read(&self, offset: Offset) -> Result<Record> {
        ObjectWal::read(self, offset).await
    }

    async fn last_record(&self) -> Result<Record> {
        ObjectWal::last_record(self).await
    }
}
