//! Data types for adapter operations.

use bytes::Bytes;

/// A key-value entry returned by iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValueEntry {
    /// The key, as stored in the table's primary-key column.
    pub key: Bytes,
    /// The payload.
    pub value: Bytes,
}

/// One operation inside a batch.
///
/// Array order is preserved when composing the logged batch, but the cluster
/// does not guarantee a matching execution order across partitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    Put { key: Bytes, value: Bytes },
    Del { key: Bytes },
}
