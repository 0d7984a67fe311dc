//! Ordered key-value adapter over a CQL wide-column cluster.
//!
//! This crate maps a generic key-value contract (get/put/del/batch/iterate)
//! onto one table inside one keyspace of a Cassandra-compatible cluster. Keys
//! become the table's `text` primary key, payloads are stored verbatim in a
//! `blob` column, and range scans are presented as a pull-based iterator over
//! the cluster's paged cursor.
//!
//! # Architecture
//!
//! Opening a [`KeyValueDb`] connects a session, bootstraps the keyspace and
//! table (`IF NOT EXISTS`, safe under concurrent opens) and compiles the
//! statement templates once. Point operations translate directly to
//! parameterized statements; conditional writes report whether their
//! row-existence precondition held. Scans fetch pages on demand, so an
//! iterator holds at most one page of records at a time.
//!
//! # Key Concepts
//!
//! - **KeyValueDb**: the main entry point, bound to exactly one table.
//! - **KeyValueStore**: trait carrying the generic store contract, useful for
//!   code that should not care about the backing cluster.
//! - **KeyValueIterator**: single-consumer cursor over a ranged scan.
//!
//! # Example
//!
//! ```ignore
//! use bytes::Bytes;
//! use keyvalue::{Config, KeyValueDb, KeyValueStore, PutOptions};
//!
//! let db = KeyValueDb::open("timers", Config::default()).await?;
//!
//! // Create, then update in place
//! db.put(
//!     Bytes::from("user:123"),
//!     Bytes::from("alice"),
//!     PutOptions { insert: true },
//! )
//! .await?;
//! db.put(
//!     Bytes::from("user:123"),
//!     Bytes::from("alice-2"),
//!     PutOptions::default(),
//! )
//! .await?;
//!
//! // Read back
//! let value = db.get(Bytes::from("user:123")).await?;
//!
//! // Scan everything
//! let mut iter = db.iterator(Default::default())?;
//! while let Some(entry) = iter.next().await? {
//!     println!("{:?}: {:?}", entry.key, entry.value);
//! }
//! ```

mod bootstrap;
mod config;
mod error;
mod iterator;
mod keyvalue;
mod model;
mod serde;
mod statements;
mod storage;

pub use config::{Config, IteratorOptions, PutOptions};
pub use error::{Error, Result};
pub use iterator::KeyValueIterator;
pub use keyvalue::{KeyValueDb, KeyValueStore};
pub use model::{BatchOp, KeyValueEntry};
