//! Offset to object key mapping
//!
//! Keys are `<prefix>/<offset>` with the offset zero-padded to 20 decimal
//! digits, so lexicographic key order matches numeric offset order.

use super::Offset;
use crate::error::{Error, Result};

/// Width of the zero-padded offset, enough for any u64
pub const OFFSET_WIDTH: usize = 20;

/// Key for the record at `offset` in namespace `prefix`
pub fn encode_key(prefix: &str, offset: Offset) -> String {
    format!("{}/{:0width$}", prefix, offset, width = OFFSET_WIDTH)
}

/// Listing prefix that matches every record key of the namespace and
/// nothing from namespaces that merely share leading text
pub fn list_prefix(prefix: &str) -> String {
    format!("{}/", prefix)
}

/// Parse the offset out of a record key of namespace `prefix`
pub fn decode_offset(prefix: &str, key: &str) -> Result<Offset> {
    let digits = key
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('/'))
        .ok_or_else(|| key_error(key, format!("not under prefix {:?}", prefix)))?;

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(key_error(key, "offset is not a decimal number"));
    }

    // Unpadded keys would sort out of numeric order among padded ones
    if digits.len() != OFFSET_WIDTH {
        return Err(key_error(
            key,
            format!("offset must be {} digits, found {}", OFFSET_WIDTH, digits.len()),
        ));
    }

    let offset: Offset = digits
        .parse()
        .map_err(|e| key_error(key, format!("offset out of range: {}", e)))?;

    if offset == 0 {
        return Err(key_error(key, "offset 0 is never written"));
    }

    Ok(offset)
}

fn key_error(key: &str, reason: impl Into<String>) -> Error {
    Error::KeyFormat {
        key: key.to_string(),
        reason: reason.into(),
    }
}
