//! In-process emulated cluster.
//!
//! [`InMemoryCluster`] implements [`CqlSession`] over ordered in-memory
//! tables. It honors the statement descriptors' semantics: idempotent
//! `IF NOT EXISTS` schema creation, conditional-write outcomes reported
//! through `was_applied`, native paging with opaque continuation tokens, and
//! all-or-nothing logged batches. Tables iterate in id order, which stands in
//! for the partitioner order of a real cluster.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock};

use async_trait::async_trait;
use bytes::Bytes;

use super::{
    BatchStatement, ClientError, ClientResult, CqlSession, CqlValue, Page, ResultSet, Row,
    Statement, StatementKind,
};

#[derive(Clone, Debug)]
struct StoredRow {
    created: Option<i64>,
    value: Bytes,
}

type Table = BTreeMap<String, StoredRow>;

#[derive(Debug)]
struct Keyspace {
    replicas: u32,
    tables: HashMap<String, Table>,
}

#[derive(Debug, Default)]
struct ClusterState {
    keyspaces: RwLock<HashMap<String, Keyspace>>,
}

impl ClusterState {
    fn read(&self) -> ClientResult<std::sync::RwLockReadGuard<'_, HashMap<String, Keyspace>>> {
        self.keyspaces
            .read()
            .map_err(|e| ClientError::Internal(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> ClientResult<std::sync::RwLockWriteGuard<'_, HashMap<String, Keyspace>>> {
        self.keyspaces
            .write()
            .map_err(|e| ClientError::Internal(format!("Failed to acquire write lock: {}", e)))
    }
}

/// Process-wide registry of shared cluster states, keyed by contact points.
static SHARED_CLUSTERS: OnceLock<Mutex<HashMap<String, Arc<ClusterState>>>> = OnceLock::new();

/// An in-process cluster implementing the session contract.
///
/// Cheap to clone; clones share the same cluster state.
#[derive(Clone)]
pub struct InMemoryCluster {
    state: Arc<ClusterState>,
}

impl InMemoryCluster {
    /// Creates a cluster private to this handle and its clones.
    pub fn new() -> Self {
        Self {
            state: Arc::new(ClusterState::default()),
        }
    }

    /// Attaches to the process-wide cluster named by the contact points.
    ///
    /// Handles created with the same set of contact points (order
    /// insensitive) observe the same keyspaces, tables and rows.
    pub fn shared(contact_points: &[String]) -> Self {
        let mut key: Vec<&str> = contact_points.iter().map(String::as_str).collect();
        key.sort_unstable();
        let key = key.join(",");

        let registry = SHARED_CLUSTERS.get_or_init(|| Mutex::new(HashMap::new()));
        let mut registry = registry.lock().unwrap_or_else(PoisonError::into_inner);
        let state = registry
            .entry(key)
            .or_insert_with(|| Arc::new(ClusterState::default()))
            .clone();
        Self { state }
    }

    /// Replication factor recorded for a keyspace, if it exists.
    pub fn keyspace_replicas(&self, keyspace: &str) -> Option<u32> {
        let keyspaces = self.state.read().ok()?;
        keyspaces.get(keyspace).map(|ks| ks.replicas)
    }

    /// Creation timestamp recorded for a row, if the row exists and was
    /// written through an insert.
    pub fn row_created(&self, keyspace: &str, table: &str, id: &str) -> Option<i64> {
        let keyspaces = self.state.read().ok()?;
        keyspaces.get(keyspace)?.tables.get(table)?.get(id)?.created
    }
}

impl Default for InMemoryCluster {
    fn default() -> Self {
        Self::new()
    }
}

fn text_param<'a>(params: &'a [CqlValue], index: usize) -> ClientResult<&'a str> {
    params.get(index).and_then(CqlValue::as_text).ok_or_else(|| {
        ClientError::InvalidQuery(format!("expected text parameter at position {}", index))
    })
}

fn blob_param<'a>(params: &'a [CqlValue], index: usize) -> ClientResult<&'a Bytes> {
    params.get(index).and_then(CqlValue::as_blob).ok_or_else(|| {
        ClientError::InvalidQuery(format!("expected blob parameter at position {}", index))
    })
}

fn timestamp_param(params: &[CqlValue], index: usize) -> ClientResult<i64> {
    params
        .get(index)
        .and_then(CqlValue::as_timestamp)
        .ok_or_else(|| {
            ClientError::InvalidQuery(format!(
                "expected timestamp parameter at position {}",
                index
            ))
        })
}

fn table_ref<'a>(
    keyspaces: &'a HashMap<String, Keyspace>,
    keyspace: &str,
    table: &str,
) -> ClientResult<&'a Table> {
    keyspaces
        .get(keyspace)
        .ok_or_else(|| ClientError::InvalidQuery(format!("keyspace {} does not exist", keyspace)))?
        .tables
        .get(table)
        .ok_or_else(|| {
            ClientError::InvalidQuery(format!("table {}.{} does not exist", keyspace, table))
        })
}

fn table_mut<'a>(
    keyspaces: &'a mut HashMap<String, Keyspace>,
    keyspace: &str,
    table: &str,
) -> ClientResult<&'a mut Table> {
    keyspaces
        .get_mut(keyspace)
        .ok_or_else(|| ClientError::InvalidQuery(format!("keyspace {} does not exist", keyspace)))?
        .tables
        .get_mut(table)
        .ok_or_else(|| {
            ClientError::InvalidQuery(format!("table {}.{} does not exist", keyspace, table))
        })
}

#[async_trait]
impl CqlSession for InMemoryCluster {
    #[tracing::instrument(level = "trace", skip_all)]
    async fn execute(&self, statement: &Statement, params: &[CqlValue]) -> ClientResult<ResultSet> {
        match statement.kind() {
            StatementKind::CreateKeyspace { keyspace, replicas } => {
                let mut keyspaces = self.state.write()?;
                keyspaces.entry(keyspace.clone()).or_insert_with(|| Keyspace {
                    replicas: *replicas,
                    tables: HashMap::new(),
                });
                Ok(ResultSet::empty())
            }
            StatementKind::CreateTable { keyspace, table } => {
                let mut keyspaces = self.state.write()?;
                let ks = keyspaces.get_mut(keyspace).ok_or_else(|| {
                    ClientError::InvalidQuery(format!("keyspace {} does not exist", keyspace))
                })?;
                ks.tables.entry(table.clone()).or_default();
                Ok(ResultSet::empty())
            }
            StatementKind::Select { keyspace, table } => {
                let id = text_param(params, 0)?;
                let keyspaces = self.state.read()?;
                let rows = table_ref(&keyspaces, keyspace, table)?;
                Ok(match rows.get(id) {
                    Some(stored) => ResultSet::with_rows(vec![Row::new(vec![CqlValue::Blob(
                        stored.value.clone(),
                    )])]),
                    None => ResultSet::with_rows(Vec::new()),
                })
            }
            StatementKind::UpdateIfExists { keyspace, table } => {
                let value = blob_param(params, 0)?.clone();
                let id = text_param(params, 1)?;
                let mut keyspaces = self.state.write()?;
                let rows = table_mut(&mut keyspaces, keyspace, table)?;
                match rows.get_mut(id) {
                    Some(stored) => {
                        stored.value = value;
                        Ok(ResultSet::empty())
                    }
                    None => Ok(ResultSet::not_applied()),
                }
            }
            StatementKind::DeleteIfExists { keyspace, table } => {
                let id = text_param(params, 0)?;
                let mut keyspaces = self.state.write()?;
                let rows = table_mut(&mut keyspaces, keyspace, table)?;
                if rows.remove(id).is_some() {
                    Ok(ResultSet::empty())
                } else {
                    Ok(ResultSet::not_applied())
                }
            }
            StatementKind::Delete { keyspace, table } => {
                let id = text_param(params, 0)?;
                let mut keyspaces = self.state.write()?;
                let rows = table_mut(&mut keyspaces, keyspace, table)?;
                rows.remove(id);
                Ok(ResultSet::empty())
            }
            StatementKind::Insert { keyspace, table } => {
                let id = text_param(params, 0)?.to_string();
                let created = timestamp_param(params, 1)?;
                let value = blob_param(params, 2)?.clone();
                let mut keyspaces = self.state.write()?;
                let rows = table_mut(&mut keyspaces, keyspace, table)?;
                rows.insert(
                    id,
                    StoredRow {
                        created: Some(created),
                        value,
                    },
                );
                Ok(ResultSet::empty())
            }
            StatementKind::Scan { keyspace, table } => {
                let keyspaces = self.state.read()?;
                let rows = table_ref(&keyspaces, keyspace, table)?;
                let rows = rows
                    .iter()
                    .map(|(id, stored)| {
                        Row::new(vec![
                            CqlValue::Text(id.clone()),
                            CqlValue::Blob(stored.value.clone()),
                        ])
                    })
                    .collect();
                Ok(ResultSet::with_rows(rows))
            }
        }
    }

    #[tracing::instrument(level = "trace", skip_all)]
    async fn execute_paged(
        &self,
        statement: &Statement,
        _params: &[CqlValue],
        page_size: usize,
        paging_state: Option<Bytes>,
    ) -> ClientResult<Page> {
        let (keyspace, table) = match statement.kind() {
            StatementKind::Scan { keyspace, table } => (keyspace, table),
            other => {
                return Err(ClientError::InvalidQuery(format!(
                    "statement does not support paging: {:?}",
                    other
                )));
            }
        };
        if page_size == 0 {
            return Err(ClientError::InvalidQuery(
                "page size must be positive".to_string(),
            ));
        }

        let start: Bound<String> = match paging_state {
            Some(token) => {
                let last = std::str::from_utf8(&token)
                    .map_err(|_| ClientError::InvalidQuery("malformed paging state".to_string()))?;
                Bound::Excluded(last.to_string())
            }
            None => Bound::Unbounded,
        };

        let keyspaces = self.state.read()?;
        let rows = table_ref(&keyspaces, keyspace, table)?;

        let mut page_rows = Vec::with_capacity(page_size);
        let mut last_id: Option<&String> = None;
        let mut more = false;
        for (id, stored) in rows.range((start, Bound::Unbounded)) {
            if page_rows.len() == page_size {
                more = true;
                break;
            }
            page_rows.push(Row::new(vec![
                CqlValue::Text(id.clone()),
                CqlValue::Blob(stored.value.clone()),
            ]));
            last_id = Some(id);
        }

        let paging_state = if more {
            last_id.map(|id| Bytes::copy_from_slice(id.as_bytes()))
        } else {
            None
        };
        Ok(Page {
            rows: page_rows,
            paging_state,
        })
    }

    #[tracing::instrument(level = "trace", skip_all)]
    async fn batch(&self, operations: Vec<BatchStatement>) -> ClientResult<()> {
        let mut keyspaces = self.state.write()?;

        // Validate every operation before touching any row so a rejected
        // statement leaves the batch entirely unapplied.
        for op in &operations {
            match op.statement.kind() {
                StatementKind::Insert { keyspace, table } => {
                    table_ref(&keyspaces, keyspace, table)?;
                    text_param(&op.params, 0)?;
                    timestamp_param(&op.params, 1)?;
                    blob_param(&op.params, 2)?;
                }
                StatementKind::Delete { keyspace, table } => {
                    table_ref(&keyspaces, keyspace, table)?;
                    text_param(&op.params, 0)?;
                }
                StatementKind::UpdateIfExists { .. } | StatementKind::DeleteIfExists { .. } => {
                    return Err(ClientError::InvalidQuery(
                        "conditional statements cannot be used in a logged batch".to_string(),
                    ));
                }
                other => {
                    return Err(ClientError::InvalidQuery(format!(
                        "statement not allowed in a logged batch: {:?}",
                        other
                    )));
                }
            }
        }

        for op in operations {
            match op.statement.kind() {
                StatementKind::Insert { keyspace, table } => {
                    let id = text_param(&op.params, 0)?.to_string();
                    let created = timestamp_param(&op.params, 1)?;
                    let value = blob_param(&op.params, 2)?.clone();
                    let rows = table_mut(&mut keyspaces, keyspace, table)?;
                    rows.insert(
                        id,
                        StoredRow {
                            created: Some(created),
                            value,
                        },
                    );
                }
                StatementKind::Delete { keyspace, table } => {
                    let id = text_param(&op.params, 0)?;
                    let rows = table_mut(&mut keyspaces, keyspace, table)?;
                    rows.remove(id);
                }
                _ => unreachable!("validated above"),
            }
        }

        Ok(())
    }
}

/// Injected failure that fires either once or on every call.
#[cfg(feature = "test-utils")]
#[derive(Clone)]
enum Failure {
    /// Error is returned once, then automatically cleared.
    Once(ClientError),
    /// Error is returned on every subsequent call until explicitly cleared.
    Persistent(ClientError),
}

#[cfg(feature = "test-utils")]
type FailSlot = arc_swap::ArcSwap<Option<Failure>>;

/// Checks a [`FailSlot`] and returns an error if one is set.
///
/// For [`Failure::Once`], the slot is atomically swapped to `None` so the
/// error fires exactly once. For [`Failure::Persistent`], the slot is left
/// unchanged.
#[cfg(feature = "test-utils")]
fn check_failure(slot: &FailSlot) -> ClientResult<()> {
    let guard = slot.load();
    match guard.as_ref() {
        None => Ok(()),
        Some(Failure::Persistent(err)) => Err(err.clone()),
        Some(Failure::Once(_)) => {
            // Swap to None; if another thread raced us, one of them gets the
            // error and the others pass through.
            let prev = slot.swap(Arc::new(None));
            match prev.as_ref() {
                Some(Failure::Once(err)) => Err(err.clone()),
                _ => Ok(()),
            }
        }
    }
}

/// A session wrapper that delegates to an inner [`CqlSession`] but can inject
/// failures into `execute`, `execute_paged` and `batch` on demand.
///
/// Failures can be *persistent* (returned on every call until cleared) or
/// *once* (returned on the next call, then automatically cleared).
///
/// Gated behind the `test-utils` feature.
#[cfg(feature = "test-utils")]
pub struct FailingSession {
    inner: Arc<dyn CqlSession>,
    fail_execute: FailSlot,
    fail_page: FailSlot,
    fail_batch: FailSlot,
}

#[cfg(feature = "test-utils")]
impl FailingSession {
    /// Wraps an existing session, with all failure injections initially `None`.
    pub fn wrap(inner: Arc<dyn CqlSession>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            fail_execute: arc_swap::ArcSwap::from_pointee(None),
            fail_page: arc_swap::ArcSwap::from_pointee(None),
            fail_batch: arc_swap::ArcSwap::from_pointee(None),
        })
    }

    /// Makes `execute` return the given error on every subsequent call.
    pub fn fail_execute(&self, err: ClientError) {
        self.fail_execute
            .store(Arc::new(Some(Failure::Persistent(err))));
    }

    /// Makes `execute` return the given error on the next call only.
    pub fn fail_execute_once(&self, err: ClientError) {
        self.fail_execute.store(Arc::new(Some(Failure::Once(err))));
    }

    /// Makes `execute_paged` return the given error on every subsequent call.
    pub fn fail_page(&self, err: ClientError) {
        self.fail_page
            .store(Arc::new(Some(Failure::Persistent(err))));
    }

    /// Makes `execute_paged` return the given error on the next call only.
    pub fn fail_page_once(&self, err: ClientError) {
        self.fail_page.store(Arc::new(Some(Failure::Once(err))));
    }

    /// Makes `batch` return the given error on every subsequent call.
    pub fn fail_batch(&self, err: ClientError) {
        self.fail_batch
            .store(Arc::new(Some(Failure::Persistent(err))));
    }

    /// Makes `batch` return the given error on the next call only.
    pub fn fail_batch_once(&self, err: ClientError) {
        self.fail_batch.store(Arc::new(Some(Failure::Once(err))));
    }
}

#[cfg(feature = "test-utils")]
#[async_trait]
impl CqlSession for FailingSession {
    async fn execute(&self, statement: &Statement, params: &[CqlValue]) -> ClientResult<ResultSet> {
        check_failure(&self.fail_execute)?;
        self.inner.execute(statement, params).await
    }

    async fn execute_paged(
        &self,
        statement: &Statement,
        params: &[CqlValue],
        page_size: usize,
        paging_state: Option<Bytes>,
    ) -> ClientResult<Page> {
        check_failure(&self.fail_page)?;
        self.inner
            .execute_paged(statement, params, page_size, paging_state)
            .await
    }

    async fn batch(&self, operations: Vec<BatchStatement>) -> ClientResult<()> {
        check_failure(&self.fail_batch)?;
        self.inner.batch(operations).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_keyspace(keyspace: &str, replicas: u32) -> Statement {
        Statement::new(
            format!(
                "CREATE KEYSPACE IF NOT EXISTS {} WITH REPLICATION = \
                 {{'class': 'SimpleStrategy', 'replication_factor': {}}}",
                keyspace, replicas
            ),
            StatementKind::CreateKeyspace {
                keyspace: keyspace.to_string(),
                replicas,
            },
        )
    }

    fn create_table(keyspace: &str, table: &str) -> Statement {
        Statement::new(
            format!(
                "CREATE TABLE IF NOT EXISTS {}.{} \
                 (id text PRIMARY KEY, created timestamp, value blob)",
                keyspace, table
            ),
            StatementKind::CreateTable {
                keyspace: keyspace.to_string(),
                table: table.to_string(),
            },
        )
    }

    fn insert(keyspace: &str, table: &str) -> Statement {
        Statement::new(
            format!(
                "INSERT INTO {}.{} (id, created, value) VALUES (?, ?, ?)",
                keyspace, table
            ),
            StatementKind::Insert {
                keyspace: keyspace.to_string(),
                table: table.to_string(),
            },
        )
    }

    fn select(keyspace: &str, table: &str) -> Statement {
        Statement::new(
            format!("SELECT value FROM {}.{} WHERE id = ?", keyspace, table),
            StatementKind::Select {
                keyspace: keyspace.to_string(),
                table: table.to_string(),
            },
        )
    }

    fn update_if_exists(keyspace: &str, table: &str) -> Statement {
        Statement::new(
            format!(
                "UPDATE {}.{} SET value = ? WHERE id = ? IF EXISTS",
                keyspace, table
            ),
            StatementKind::UpdateIfExists {
                keyspace: keyspace.to_string(),
                table: table.to_string(),
            },
        )
    }

    fn delete_if_exists(keyspace: &str, table: &str) -> Statement {
        Statement::new(
            format!("DELETE FROM {}.{} WHERE id = ? IF EXISTS", keyspace, table),
            StatementKind::DeleteIfExists {
                keyspace: keyspace.to_string(),
                table: table.to_string(),
            },
        )
    }

    fn delete(keyspace: &str, table: &str) -> Statement {
        Statement::new(
            format!("DELETE FROM {}.{} WHERE id = ?", keyspace, table),
            StatementKind::Delete {
                keyspace: keyspace.to_string(),
                table: table.to_string(),
            },
        )
    }

    fn scan(keyspace: &str, table: &str) -> Statement {
        Statement::new(
            format!("SELECT id, value FROM {}.{}", keyspace, table),
            StatementKind::Scan {
                keyspace: keyspace.to_string(),
                table: table.to_string(),
            },
        )
    }

    async fn cluster_with_table(keyspace: &str, table: &str) -> InMemoryCluster {
        let cluster = InMemoryCluster::new();
        cluster
            .execute(&create_keyspace(keyspace, 1), &[])
            .await
            .unwrap();
        cluster
            .execute(&create_table(keyspace, table), &[])
            .await
            .unwrap();
        cluster
    }

    fn insert_params(id: &str, value: &str) -> Vec<CqlValue> {
        vec![
            CqlValue::Text(id.to_string()),
            CqlValue::Timestamp(1_000),
            CqlValue::Blob(Bytes::copy_from_slice(value.as_bytes())),
        ]
    }

    #[tokio::test]
    async fn should_create_keyspace_idempotently() {
        // given
        let cluster = InMemoryCluster::new();

        // when - created twice with different replica counts
        cluster
            .execute(&create_keyspace("ks", 1), &[])
            .await
            .unwrap();
        cluster
            .execute(&create_keyspace("ks", 3), &[])
            .await
            .unwrap();

        // then - the first creation wins
        assert_eq!(cluster.keyspace_replicas("ks"), Some(1));
    }

    #[tokio::test]
    async fn should_reject_table_creation_without_keyspace() {
        // given
        let cluster = InMemoryCluster::new();

        // when
        let result = cluster.execute(&create_table("missing", "t"), &[]).await;

        // then
        assert!(matches!(result, Err(ClientError::InvalidQuery(_))));
    }

    #[tokio::test]
    async fn should_record_creation_timestamp_on_insert() {
        // given
        let cluster = cluster_with_table("ks", "t").await;

        // when
        cluster
            .execute(&insert("ks", "t"), &insert_params("k1", "v1"))
            .await
            .unwrap();

        // then
        assert_eq!(cluster.row_created("ks", "t", "k1"), Some(1_000));
    }

    #[tokio::test]
    async fn should_insert_and_select_row() {
        // given
        let cluster = cluster_with_table("ks", "t").await;

        // when
        cluster
            .execute(&insert("ks", "t"), &insert_params("k1", "v1"))
            .await
            .unwrap();
        let result = cluster
            .execute(&select("ks", "t"), &[CqlValue::Text("k1".to_string())])
            .await
            .unwrap();

        // then
        assert_eq!(result.rows.len(), 1);
        assert_eq!(
            result.rows[0].column(0).and_then(CqlValue::as_blob),
            Some(&Bytes::from("v1"))
        );
    }

    #[tokio::test]
    async fn should_return_no_rows_for_missing_id() {
        // given
        let cluster = cluster_with_table("ks", "t").await;

        // when
        let result = cluster
            .execute(&select("ks", "t"), &[CqlValue::Text("absent".to_string())])
            .await
            .unwrap();

        // then
        assert!(result.rows.is_empty());
        assert!(result.was_applied);
    }

    #[tokio::test]
    async fn should_report_unapplied_conditional_update_on_missing_row() {
        // given
        let cluster = cluster_with_table("ks", "t").await;

        // when
        let result = cluster
            .execute(
                &update_if_exists("ks", "t"),
                &[
                    CqlValue::Blob(Bytes::from("v")),
                    CqlValue::Text("absent".to_string()),
                ],
            )
            .await
            .unwrap();

        // then
        assert!(!result.was_applied);
    }

    #[tokio::test]
    async fn should_apply_conditional_update_on_existing_row() {
        // given
        let cluster = cluster_with_table("ks", "t").await;
        cluster
            .execute(&insert("ks", "t"), &insert_params("k1", "v1"))
            .await
            .unwrap();

        // when
        let update = cluster
            .execute(
                &update_if_exists("ks", "t"),
                &[
                    CqlValue::Blob(Bytes::from("v2")),
                    CqlValue::Text("k1".to_string()),
                ],
            )
            .await
            .unwrap();
        let result = cluster
            .execute(&select("ks", "t"), &[CqlValue::Text("k1".to_string())])
            .await
            .unwrap();

        // then
        assert!(update.was_applied);
        assert_eq!(
            result.rows[0].column(0).and_then(CqlValue::as_blob),
            Some(&Bytes::from("v2"))
        );
    }

    #[tokio::test]
    async fn should_report_unapplied_conditional_delete_on_missing_row() {
        // given
        let cluster = cluster_with_table("ks", "t").await;

        // when
        let result = cluster
            .execute(
                &delete_if_exists("ks", "t"),
                &[CqlValue::Text("absent".to_string())],
            )
            .await
            .unwrap();

        // then
        assert!(!result.was_applied);
    }

    #[tokio::test]
    async fn should_walk_pages_with_continuation_tokens() {
        // given - five rows, pages of two
        let cluster = cluster_with_table("ks", "t").await;
        for id in ["a", "b", "c", "d", "e"] {
            cluster
                .execute(&insert("ks", "t"), &insert_params(id, "v"))
                .await
                .unwrap();
        }
        let scan = scan("ks", "t");

        // when
        let first = cluster.execute_paged(&scan, &[], 2, None).await.unwrap();
        let second = cluster
            .execute_paged(&scan, &[], 2, first.paging_state.clone())
            .await
            .unwrap();
        let third = cluster
            .execute_paged(&scan, &[], 2, second.paging_state.clone())
            .await
            .unwrap();

        // then - 2 + 2 + 1 rows in id order, exhausted at the end
        assert_eq!(first.rows.len(), 2);
        assert!(first.paging_state.is_some());
        assert_eq!(second.rows.len(), 2);
        assert!(second.paging_state.is_some());
        assert_eq!(third.rows.len(), 1);
        assert!(third.paging_state.is_none());
        let ids: Vec<&str> = first
            .rows
            .iter()
            .chain(second.rows.iter())
            .chain(third.rows.iter())
            .map(|row| row.column(0).and_then(CqlValue::as_text).unwrap())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c", "d", "e"]);
    }

    #[tokio::test]
    async fn should_apply_batch_atomically() {
        // given
        let cluster = cluster_with_table("ks", "t").await;
        cluster
            .execute(&insert("ks", "t"), &insert_params("k2", "old"))
            .await
            .unwrap();

        // when - insert k1 and delete k2 in one batch
        cluster
            .batch(vec![
                BatchStatement {
                    statement: insert("ks", "t"),
                    params: insert_params("k1", "v1"),
                },
                BatchStatement {
                    statement: delete("ks", "t"),
                    params: vec![CqlValue::Text("k2".to_string())],
                },
            ])
            .await
            .unwrap();

        // then
        let k1 = cluster
            .execute(&select("ks", "t"), &[CqlValue::Text("k1".to_string())])
            .await
            .unwrap();
        let k2 = cluster
            .execute(&select("ks", "t"), &[CqlValue::Text("k2".to_string())])
            .await
            .unwrap();
        assert_eq!(k1.rows.len(), 1);
        assert!(k2.rows.is_empty());
    }

    #[tokio::test]
    async fn should_leave_batch_unapplied_when_any_statement_is_rejected() {
        // given - second operation targets a missing table
        let cluster = cluster_with_table("ks", "t").await;

        // when
        let result = cluster
            .batch(vec![
                BatchStatement {
                    statement: insert("ks", "t"),
                    params: insert_params("k1", "v1"),
                },
                BatchStatement {
                    statement: insert("ks", "missing"),
                    params: insert_params("k2", "v2"),
                },
            ])
            .await;

        // then - nothing was applied
        assert!(result.is_err());
        let k1 = cluster
            .execute(&select("ks", "t"), &[CqlValue::Text("k1".to_string())])
            .await
            .unwrap();
        assert!(k1.rows.is_empty());
    }

    #[tokio::test]
    async fn should_reject_conditional_statement_in_batch() {
        // given
        let cluster = cluster_with_table("ks", "t").await;

        // when
        let result = cluster
            .batch(vec![BatchStatement {
                statement: delete_if_exists("ks", "t"),
                params: vec![CqlValue::Text("k".to_string())],
            }])
            .await;

        // then
        assert!(matches!(result, Err(ClientError::InvalidQuery(_))));
    }

    #[tokio::test]
    async fn should_share_state_between_sessions_with_same_contact_points() {
        // given
        let points = vec!["198.51.100.7:9042".to_string()];
        let first = InMemoryCluster::shared(&points);
        let second = InMemoryCluster::shared(&points);

        // when
        first
            .execute(&create_keyspace("shared_ks", 2), &[])
            .await
            .unwrap();

        // then
        assert_eq!(second.keyspace_replicas("shared_ks"), Some(2));
    }

    #[tokio::test]
    async fn should_isolate_clusters_with_different_contact_points() {
        // given
        let first = InMemoryCluster::shared(&["203.0.113.1".to_string()]);
        let second = InMemoryCluster::shared(&["203.0.113.2".to_string()]);

        // when
        first
            .execute(&create_keyspace("only_first", 1), &[])
            .await
            .unwrap();

        // then
        assert_eq!(second.keyspace_replicas("only_first"), None);
    }
}
