//! WAL Record Framing
//!
//! On-storage layout of a single record:
//!
//! ```text
//! +------------------+----------------+---------------------+
//! | offset (u64, BE) | data (N bytes) | sha256 (32 bytes)   |
//! +------------------+----------------+---------------------+
//! ```
//!
//! The digest covers the offset and data fields. Carrying the offset inside
//! the body lets a reader notice an object stored under the wrong key.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use sha2::{Digest, Sha256};

use super::Offset;
use crate::error::{Error, Result};

/// Size of the embedded offset field
pub const OFFSET_LEN: usize = 8;

/// Size of the trailing SHA-256 digest
pub const DIGEST_LEN: usize = 32;

/// Smallest valid encoded record (empty payload)
pub const MIN_RECORD_LEN: usize = OFFSET_LEN + DIGEST_LEN;

fn digest(bytes: &[u8]) -> [u8; DIGEST_LEN] {
    Sha256::digest(bytes).into()
}

/// Encode `data` as the record stored at `offset`
pub fn encode(offset: Offset, data: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(OFFSET_LEN + data.len() + DIGEST_LEN);
    buf.put_u64(offset);
    buf.put_slice(data);
    let checksum = digest(&buf);
    buf.put_slice(&checksum);
    buf.freeze()
}

/// Validate an encoded record against the offset it was fetched for and
/// return its payload.
///
/// The returned payload shares the buffer of `body`.
pub fn decode_and_validate(body: &Bytes, expected_offset: Offset) -> Result<Bytes> {
    if body.len() < MIN_RECORD_LEN {
        return Err(Error::Malformed {
            offset: expected_offset,
            len: body.len(),
        });
    }

    let found = (&body[..OFFSET_LEN]).get_u64();
    if found != expected_offset {
        return Err(Error::OffsetMismatch {
            expected: expected_offset,
            found,
        });
    }

    let split = body.len() - DIGEST_LEN;
    if digest(&body[..split]) != body[split..] {
        return Err(Error::ChecksumMismatch {
            offset: expected_offset,
        });
    }

    Ok(body.slice(OFFSET_LEN..split))
}
