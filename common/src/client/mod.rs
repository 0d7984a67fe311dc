//! Session abstraction over a CQL wide-column cluster.
//!
//! The adapter consumes the backing database as a black-box executor of
//! parameterized statements. This module defines that boundary: the value
//! model ([`CqlValue`], [`Row`]), execution outcomes ([`ResultSet`],
//! [`Page`]), statement descriptors ([`Statement`]) and the [`CqlSession`]
//! trait. Connection management, node discovery and transport-level retries
//! all live behind the trait.

pub mod config;
pub mod factory;
pub mod in_memory;

use async_trait::async_trait;
use bytes::Bytes;

/// A single CQL value, as bound to a statement parameter or read from a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CqlValue {
    Text(String),
    Blob(Bytes),
    /// Milliseconds since the Unix epoch.
    Timestamp(i64),
}

impl CqlValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CqlValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_blob(&self) -> Option<&Bytes> {
        match self {
            CqlValue::Blob(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<i64> {
        match self {
            CqlValue::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }
}

/// One row of a result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    columns: Vec<CqlValue>,
}

impl Row {
    pub fn new(columns: Vec<CqlValue>) -> Self {
        Self { columns }
    }

    pub fn column(&self, index: usize) -> Option<&CqlValue> {
        self.columns.get(index)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Outcome of a single statement execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultSet {
    pub rows: Vec<Row>,
    /// Outcome of the conditional clause when the statement carried one
    /// (`IF EXISTS`). Unconditional statements report `true`.
    pub was_applied: bool,
}

impl ResultSet {
    /// An applied result with no rows.
    pub fn empty() -> Self {
        Self {
            rows: Vec::new(),
            was_applied: true,
        }
    }

    pub fn with_rows(rows: Vec<Row>) -> Self {
        Self {
            rows,
            was_applied: true,
        }
    }

    /// A conditional statement whose precondition did not hold.
    pub fn not_applied() -> Self {
        Self {
            rows: Vec::new(),
            was_applied: false,
        }
    }
}

/// One page of a ranged scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub rows: Vec<Row>,
    /// Opaque continuation token. `None` when the scan is exhausted.
    pub paging_state: Option<Bytes>,
}

/// Structured description of a statement template.
///
/// Driver-backed sessions send the CQL text on the wire; the in-process
/// cluster interprets the descriptor directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementKind {
    CreateKeyspace { keyspace: String, replicas: u32 },
    CreateTable { keyspace: String, table: String },
    /// `SELECT value ... WHERE id = ?`; params: `[id]`.
    Select { keyspace: String, table: String },
    /// `UPDATE ... SET value = ? WHERE id = ? IF EXISTS`; params: `[value, id]`.
    UpdateIfExists { keyspace: String, table: String },
    /// `DELETE ... WHERE id = ? IF EXISTS`; params: `[id]`.
    DeleteIfExists { keyspace: String, table: String },
    /// Unconditional `DELETE ... WHERE id = ?`; params: `[id]`.
    Delete { keyspace: String, table: String },
    /// `INSERT (id, created, value)`; params: `[id, created, value]`.
    Insert { keyspace: String, table: String },
    /// Full-table `SELECT id, value`, fetched page by page.
    Scan { keyspace: String, table: String },
}

/// An immutable parameterized statement template bound to one table.
///
/// Built once per adapter instance at open time and shared read-only across
/// concurrent callers. Preparing on the wire is the session's concern and
/// happens on first use, not at build time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    cql: String,
    kind: StatementKind,
}

impl Statement {
    pub fn new(cql: String, kind: StatementKind) -> Self {
        Self { cql, kind }
    }

    pub fn cql(&self) -> &str {
        &self.cql
    }

    pub fn kind(&self) -> &StatementKind {
        &self.kind
    }
}

/// A statement plus bound parameters, as submitted inside a logged batch.
#[derive(Debug, Clone)]
pub struct BatchStatement {
    pub statement: Statement,
    pub params: Vec<CqlValue>,
}

/// Error type for session operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Connection loss, timeout, coordinator failure. Opaque to callers.
    Transport(String),
    /// Statement rejected by the cluster (unknown keyspace or table,
    /// parameter arity or type mismatch).
    InvalidQuery(String),
    /// Bugs and invariant violations inside the client layer.
    Internal(String),
}

impl std::error::Error for ClientError {}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Transport(msg) => write!(f, "Transport error: {}", msg),
            ClientError::InvalidQuery(msg) => write!(f, "Invalid query: {}", msg),
            ClientError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

/// Result type alias for session operations.
pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// A connected handle to the backing cluster.
///
/// Implementations must be safe to share across concurrent callers; all
/// methods take `&self` and independent calls may be in flight at once.
#[async_trait]
pub trait CqlSession: Send + Sync {
    /// Executes a single parameterized statement.
    async fn execute(&self, statement: &Statement, params: &[CqlValue]) -> ClientResult<ResultSet>;

    /// Fetches one page of a ranged scan.
    ///
    /// Passing back the previous page's `paging_state` resumes the scan;
    /// `None` starts from the beginning.
    async fn execute_paged(
        &self,
        statement: &Statement,
        params: &[CqlValue],
        page_size: usize,
        paging_state: Option<Bytes>,
    ) -> ClientResult<Page>;

    /// Submits the operations as a single atomic logged batch: either every
    /// operation is applied or none are.
    async fn batch(&self, operations: Vec<BatchStatement>) -> ClientResult<()>;
}
