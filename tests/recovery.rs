//! Recovery of a log persisted on the local filesystem backend, across
//! driver instances that share nothing but the directory.

use std::sync::Arc;

use s3wal::config::{S3WalConfig, StorageBackend};
use s3wal::prelude::*;
use tempfile::tempdir;

fn local_config(root: &std::path::Path, prefix: &str) -> S3WalConfig {
    let toml = format!(
        r#"
[log]
prefix = "{}"

[storage]
backend = "local"
path = "{}"
"#,
        prefix,
        root.display()
    );
    S3WalConfig::from_str(&toml).unwrap()
}

#[tokio::test]
async fn test_reopened_log_continues_after_last_offset() {
    let dir = tempdir().unwrap();
    let config = local_config(dir.path(), "orders");
    assert_eq!(config.storage.backend, StorageBackend::Local);

    let mut last_payload = Vec::new();
    {
        let wal = ObjectWal::from_config(&config).unwrap();
        for i in 0..50u32 {
            last_payload = format!("order-{}", i).into_bytes();
            let offset = wal.append(&last_payload).await.unwrap();
            assert_eq!(offset, u64::from(i) + 1);
        }
    }

    let reopened = ObjectWal::from_config(&config).unwrap();
    assert_eq!(reopened.length(), 0);

    let last = reopened.last_record().await.unwrap();
    assert_eq!(last.offset, 50);
    assert_eq!(&last.data[..], &last_payload[..]);

    assert_eq!(reopened.append(b"after restart").await.unwrap(), 51);
    assert_eq!(&reopened.read(51).await.unwrap().data[..], b"after restart");
    assert_eq!(&reopened.read(1).await.unwrap().data[..], b"order-0");
}

#[tokio::test]
async fn test_stale_writer_cannot_overwrite() {
    let dir = tempdir().unwrap();
    let config = local_config(dir.path(), "ledger");

    let a = ObjectWal::from_config(&config).unwrap();
    let b = ObjectWal::from_config(&config).unwrap();

    assert_eq!(a.append(b"credit 10").await.unwrap(), 1);
    let err = b.append(b"debit 10").await.unwrap_err();
    assert!(matches!(err, Error::AlreadyExists { offset: 1, .. }));
    assert_eq!(&b.read(1).await.unwrap().data[..], b"credit 10");

    let offset = b.append_with_retry(b"debit 10", &config.retry_policy()).await.unwrap();
    assert_eq!(offset, 2);
}

#[tokio::test]
async fn test_empty_namespace_on_disk() {
    let dir = tempdir().unwrap();
    let wal = ObjectWal::from_config(&local_config(dir.path(), "nothing")).unwrap();

    assert!(matches!(wal.last_record().await, Err(Error::EmptyLog { .. })));
    assert!(matches!(wal.read(1).await, Err(Error::NoSuchRecord { .. })));
}

#[tokio::test]
async fn test_tampered_file_is_reported() {
    let dir = tempdir().unwrap();
    let store = Arc::new(ObjectStoreBackend::local(dir.path()).unwrap());
    let wal = ObjectWal::new(store, "audit");
    wal.append(b"original entry").await.unwrap();

    let path = dir.path().join("audit").join("00000000000000000001");
    let mut body = std::fs::read(&path).unwrap();
    body[10] ^= 0xff;
    std::fs::write(&path, body).unwrap();

    let err = wal.read(1).await.unwrap_err();
    assert!(matches!(err, Error::ChecksumMismatch { offset: 1 }));
    assert!(err.is_corruption());
}
