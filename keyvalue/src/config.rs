//! Configuration options for adapter operations.

use bytes::Bytes;
use common::SessionConfig;
use serde::{Deserialize, Serialize};

/// Configuration for opening a [`KeyValueDb`](crate::KeyValueDb).
///
/// The table name is not part of the configuration; it is the `location`
/// supplied at open time, one table per adapter instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// How the backing session is created.
    #[serde(default)]
    pub session: SessionConfig,

    /// Keyspace holding the adapter's tables. Chosen at open time and fixed
    /// for the lifetime of the instance.
    #[serde(default = "default_keyspace")]
    pub keyspace: String,

    /// Replication factor used when the keyspace is first created.
    #[serde(default = "default_replicas")]
    pub replicas: u32,

    /// Number of records requested per scan page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            keyspace: default_keyspace(),
            replicas: default_replicas(),
            page_size: default_page_size(),
        }
    }
}

fn default_keyspace() -> String {
    "keyvalue".to_string()
}

fn default_replicas() -> u32 {
    1
}

fn default_page_size() -> usize {
    100
}

/// Options for write operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PutOptions {
    /// When `true`, the write is an unconditional create that stamps the
    /// record's creation time. When `false` (the default), the write is a
    /// conditional update that only succeeds if the row already exists.
    pub insert: bool,
}

/// Options for iteration.
///
/// Bounds apply to keys. `gt`/`lt` take precedence over `gte`/`lte` when
/// both are supplied.
#[derive(Debug, Clone, Default)]
pub struct IteratorOptions {
    pub gte: Option<Bytes>,
    pub gt: Option<Bytes>,
    pub lte: Option<Bytes>,
    pub lt: Option<Bytes>,
    /// Reverse iteration. The backing cursor pages in partitioner order
    /// only, so this is rejected at iterator construction.
    pub reverse: bool,
    /// Caps the total number of records produced across all pages.
    pub limit: Option<usize>,
}

impl IteratorOptions {
    /// Normalizes the options the way the generic store contract expects:
    /// empty byte bounds carry no information and are treated as absent.
    pub(crate) fn normalized(mut self) -> Self {
        self.gte = self.gte.filter(|k| !k.is_empty());
        self.gt = self.gt.filter(|k| !k.is_empty());
        self.lte = self.lte.filter(|k| !k.is_empty());
        self.lt = self.lt.filter(|k| !k.is_empty());
        self
    }
}
