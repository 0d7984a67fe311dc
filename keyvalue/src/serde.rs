//! Key encoding for the table's primary key.
//!
//! Raw keys are stored in a `text` primary-key column, so the codec admits
//! exactly the keys that are non-empty valid UTF-8. The mapping is
//! deterministic and injective on that domain; keys outside it are rejected
//! rather than truncated or coerced. Only the payload is returned to point
//! readers, so reconstructing the caller's key from an id is needed solely
//! by the scan path, which reads ids back from rows.

use bytes::Bytes;

use crate::error::{Error, Result};

/// Encodes a raw key as the table's primary-key id.
pub fn encode_id(key: &[u8]) -> Result<String> {
    if key.is_empty() {
        return Err(Error::InvalidKey("key must not be empty".to_string()));
    }
    match std::str::from_utf8(key) {
        Ok(id) => Ok(id.to_string()),
        Err(_) => Err(Error::InvalidKey(
            "key is not valid UTF-8 and cannot form a text id".to_string(),
        )),
    }
}

/// Converts a primary-key id read from a row back into key bytes.
pub fn decode_id(id: &str) -> Bytes {
    Bytes::copy_from_slice(id.as_bytes())
}
