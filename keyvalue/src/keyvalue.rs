//! Core KeyValueDb implementation.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use common::client::factory::create_session;
use common::{Clock, CqlSession, WallClock};

use crate::bootstrap;
use crate::config::{Config, IteratorOptions, PutOptions};
use crate::error::{Error, Result};
use crate::iterator::KeyValueIterator;
use crate::model::BatchOp;
use crate::statements::{self, StatementRegistry};
use crate::storage::TableStorage;

/// The generic store contract the adapter fulfills.
///
/// Code that should not care about the backing cluster can take
/// `&dyn KeyValueStore` instead of the concrete [`KeyValueDb`].
#[async_trait]
pub trait KeyValueStore {
    /// Gets the payload for a key, failing with [`Error::NotFound`] when no
    /// row exists.
    async fn get(&self, key: Bytes) -> Result<Bytes>;

    /// Writes a payload; see [`PutOptions::insert`] for the
    /// create-versus-update distinction.
    async fn put(&self, key: Bytes, value: Bytes, options: PutOptions) -> Result<()>;

    /// Deletes a key. Deleting an absent key succeeds.
    async fn del(&self, key: Bytes) -> Result<()>;

    /// Applies the operations as a single atomic logged batch.
    async fn batch(&self, ops: Vec<BatchOp>) -> Result<()>;

    /// Creates a single-consumer iterator over the table's records.
    fn iterator(&self, options: IteratorOptions) -> Result<KeyValueIterator>;
}

/// An ordered key-value store bound to one table of one keyspace.
///
/// The table is named by the `location` supplied at open time. The session
/// handle and the compiled statements are shared read-only across all
/// concurrent callers; point operations and iterators may all be in flight
/// at once. Only each iterator carries mutable per-call state, which is why
/// iterators are single-consumer.
pub struct KeyValueDb {
    storage: TableStorage,
    page_size: usize,
}

impl KeyValueDb {
    /// Opens the store: connects a session, bootstraps the keyspace and
    /// table, and compiles the statement templates.
    ///
    /// # Errors
    ///
    /// Any session or bootstrap failure is fatal to this call and leaves
    /// nothing behind; a later open starts from scratch.
    pub async fn open(location: &str, config: Config) -> Result<Self> {
        let session = create_session(&config.session).await?;
        Self::with_session(session, location, config).await
    }

    /// Opens the store over an already-connected session, such as one backed
    /// by a real cluster driver adapted to [`CqlSession`].
    pub async fn with_session(
        session: Arc<dyn CqlSession>,
        location: &str,
        config: Config,
    ) -> Result<Self> {
        Self::with_session_and_clock(session, location, config, Arc::new(WallClock)).await
    }

    async fn with_session_and_clock(
        session: Arc<dyn CqlSession>,
        location: &str,
        config: Config,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        statements::validate_identifier(&config.keyspace)?;
        statements::validate_identifier(location)?;
        if config.page_size == 0 {
            return Err(Error::InvalidInput(
                "scan page size must be positive".to_string(),
            ));
        }

        tracing::debug!(
            keyspace = %config.keyspace,
            table = %location,
            replicas = config.replicas,
            "opening key-value table"
        );
        bootstrap::ensure_schema(
            session.as_ref(),
            &config.keyspace,
            config.replicas,
            location,
        )
        .await?;

        let registry = StatementRegistry::new(&config.keyspace, location);
        Ok(Self {
            storage: TableStorage::new(session, registry, clock),
            page_size: config.page_size,
        })
    }

    /// Closes the store and releases the session handle.
    ///
    /// Consuming `self` makes further point operations impossible; iterators
    /// created earlier keep their own handle and remain usable until ended.
    pub async fn close(self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for KeyValueDb {
    async fn get(&self, key: Bytes) -> Result<Bytes> {
        self.storage.get(&key).await
    }

    async fn put(&self, key: Bytes, value: Bytes, options: PutOptions) -> Result<()> {
        self.storage.put(&key, value, options).await
    }

    async fn del(&self, key: Bytes) -> Result<()> {
        self.storage.delete(&key).await
    }

    async fn batch(&self, ops: Vec<BatchOp>) -> Result<()> {
        self.storage.batch(ops).await
    }

    fn iterator(&self, options: IteratorOptions) -> Result<KeyValueIterator> {
        KeyValueIterator::new(
            self.storage.session(),
            self.storage.statements().scan().clone(),
            self.page_size,
            options,
        )
    }
}

#[cfg(test)]
mod tests {
    use common::client::in_memory::InMemoryCluster;
    use common::SessionConfig;

    use super::*;
    use crate::model::KeyValueEntry;

    fn test_config() -> Config {
        Config {
            session: SessionConfig::InMemory,
            ..Config::default()
        }
    }

    async fn collect(iter: &mut KeyValueIterator) -> Vec<KeyValueEntry> {
        let mut entries = vec![];
        while let Some(entry) = iter.next().await.unwrap() {
            entries.push(entry);
        }
        entries
    }

    #[tokio::test]
    async fn should_open_with_in_memory_config() {
        // when
        let result = KeyValueDb::open("timers", test_config()).await;

        // then
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn should_reject_invalid_location() {
        // when
        let result = KeyValueDb::open("not a table", test_config()).await;

        // then
        assert!(matches!(result, Err(Error::Schema(_))));
    }

    #[tokio::test]
    async fn should_reject_invalid_keyspace() {
        // given
        let config = Config {
            keyspace: "bad-keyspace".to_string(),
            ..test_config()
        };

        // when
        let result = KeyValueDb::open("timers", config).await;

        // then
        assert!(matches!(result, Err(Error::Schema(_))));
    }

    #[tokio::test]
    async fn should_reject_zero_page_size() {
        // given
        let config = Config {
            page_size: 0,
            ..test_config()
        };

        // when
        let result = KeyValueDb::open("timers", config).await;

        // then
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn should_get_value_after_insert() {
        // given
        let db = KeyValueDb::open("timers", test_config()).await.unwrap();
        db.put(
            Bytes::from("k1"),
            Bytes::from("v1"),
            PutOptions { insert: true },
        )
        .await
        .unwrap();

        // when
        let value = db.get(Bytes::from("k1")).await.unwrap();

        // then
        assert_eq!(value, Bytes::from("v1"));
    }

    #[tokio::test]
    async fn should_return_not_found_for_missing_key() {
        // given
        let db = KeyValueDb::open("timers", test_config()).await.unwrap();

        // when
        let result = db.get(Bytes::from("missing")).await;

        // then
        assert_eq!(result, Err(Error::NotFound));
    }

    #[tokio::test]
    async fn should_report_condition_not_met_for_update_of_absent_key() {
        // given
        let db = KeyValueDb::open("timers", test_config()).await.unwrap();

        // when
        let result = db
            .put(Bytes::from("k"), Bytes::from("v"), PutOptions::default())
            .await;

        // then - and the key is still absent
        assert_eq!(result, Err(Error::ConditionNotMet));
        assert_eq!(db.get(Bytes::from("k")).await, Err(Error::NotFound));
    }

    #[tokio::test]
    async fn should_update_after_insert() {
        // given
        let db = KeyValueDb::open("timers", test_config()).await.unwrap();
        db.put(
            Bytes::from("k"),
            Bytes::from("v1"),
            PutOptions { insert: true },
        )
        .await
        .unwrap();

        // when
        db.put(Bytes::from("k"), Bytes::from("v2"), PutOptions::default())
            .await
            .unwrap();

        // then
        assert_eq!(db.get(Bytes::from("k")).await.unwrap(), Bytes::from("v2"));
    }

    #[tokio::test]
    async fn should_succeed_deleting_absent_key() {
        // given
        let db = KeyValueDb::open("timers", test_config()).await.unwrap();

        // when
        let result = db.del(Bytes::from("nonexistent")).await;

        // then
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn should_apply_batch_atomically_through_facade() {
        // given - k2 pre-exists
        let db = KeyValueDb::open("timers", test_config()).await.unwrap();
        db.put(
            Bytes::from("k2"),
            Bytes::from("old"),
            PutOptions { insert: true },
        )
        .await
        .unwrap();

        // when
        db.batch(vec![
            BatchOp::Put {
                key: Bytes::from("k1"),
                value: Bytes::from("v1"),
            },
            BatchOp::Del {
                key: Bytes::from("k2"),
            },
        ])
        .await
        .unwrap();

        // then
        assert_eq!(db.get(Bytes::from("k1")).await.unwrap(), Bytes::from("v1"));
        assert_eq!(db.get(Bytes::from("k2")).await, Err(Error::NotFound));
    }

    #[tokio::test]
    async fn should_iterate_all_records_through_facade() {
        // given
        let db = KeyValueDb::open("timers", test_config()).await.unwrap();
        for id in ["a", "b", "c"] {
            db.put(
                Bytes::copy_from_slice(id.as_bytes()),
                Bytes::from(format!("value-{}", id)),
                PutOptions { insert: true },
            )
            .await
            .unwrap();
        }

        // when
        let mut iter = db.iterator(IteratorOptions::default()).unwrap();
        let entries = collect(&mut iter).await;

        // then
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].key, Bytes::from("a"));
        assert_eq!(entries[2].value, Bytes::from("value-c"));
    }

    #[tokio::test]
    async fn should_iterate_with_limit_through_facade() {
        // given
        let db = KeyValueDb::open("timers", test_config()).await.unwrap();
        for id in ["a", "b", "c", "d"] {
            db.put(
                Bytes::copy_from_slice(id.as_bytes()),
                Bytes::from("v"),
                PutOptions { insert: true },
            )
            .await
            .unwrap();
        }

        // when
        let mut iter = db
            .iterator(IteratorOptions {
                limit: Some(2),
                ..Default::default()
            })
            .unwrap();
        let entries = collect(&mut iter).await;

        // then
        assert_eq!(entries.len(), 2);
    }

    #[tokio::test]
    async fn should_keep_iterator_usable_after_close() {
        // given
        let db = KeyValueDb::open("timers", test_config()).await.unwrap();
        db.put(
            Bytes::from("k"),
            Bytes::from("v"),
            PutOptions { insert: true },
        )
        .await
        .unwrap();
        let mut iter = db.iterator(IteratorOptions::default()).unwrap();

        // when
        db.close().await.unwrap();
        let entries = collect(&mut iter).await;

        // then - the iterator holds its own session handle
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn should_share_data_between_instances_on_same_cluster() {
        // given - two adapter instances over one shared session
        let cluster: Arc<dyn CqlSession> = Arc::new(InMemoryCluster::new());
        let first = KeyValueDb::with_session(Arc::clone(&cluster), "timers", test_config())
            .await
            .unwrap();
        let second = KeyValueDb::with_session(Arc::clone(&cluster), "timers", test_config())
            .await
            .unwrap();

        // when
        first
            .put(
                Bytes::from("k"),
                Bytes::from("v"),
                PutOptions { insert: true },
            )
            .await
            .unwrap();

        // then
        assert_eq!(second.get(Bytes::from("k")).await.unwrap(), Bytes::from("v"));
    }

    #[tokio::test]
    async fn should_isolate_tables_by_location() {
        // given - one cluster, two locations
        let cluster: Arc<dyn CqlSession> = Arc::new(InMemoryCluster::new());
        let timers = KeyValueDb::with_session(Arc::clone(&cluster), "timers", test_config())
            .await
            .unwrap();
        let jobs = KeyValueDb::with_session(Arc::clone(&cluster), "jobs", test_config())
            .await
            .unwrap();

        // when
        timers
            .put(
                Bytes::from("k"),
                Bytes::from("v"),
                PutOptions { insert: true },
            )
            .await
            .unwrap();

        // then
        assert_eq!(jobs.get(Bytes::from("k")).await, Err(Error::NotFound));
    }

    #[tokio::test]
    async fn should_be_usable_as_trait_object() {
        // given
        let db = KeyValueDb::open("timers", test_config()).await.unwrap();
        let store: &dyn KeyValueStore = &db;

        // when
        store
            .put(
                Bytes::from("k"),
                Bytes::from("v"),
                PutOptions { insert: true },
            )
            .await
            .unwrap();

        // then
        assert_eq!(store.get(Bytes::from("k")).await.unwrap(), Bytes::from("v"));
    }
}
