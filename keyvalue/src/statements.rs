//! Statement templates bound to one keyspace/table pair.

use common::{Statement, StatementKind};

use crate::error::{Error, Result};

/// The parameterized statements used by point operations and scans.
///
/// Built once at open time, immutable afterwards, and shared read-only by
/// every concurrent caller on the instance. Nothing here touches the
/// network; preparing on the wire happens in the session on first use.
#[derive(Debug, Clone)]
pub(crate) struct StatementRegistry {
    get: Statement,
    insert: Statement,
    update: Statement,
    delete: Statement,
    batch_delete: Statement,
    scan: Statement,
}

impl StatementRegistry {
    pub(crate) fn new(keyspace: &str, table: &str) -> Self {
        Self {
            get: Statement::new(
                format!("SELECT value FROM {}.{} WHERE id = ?", keyspace, table),
                StatementKind::Select {
                    keyspace: keyspace.to_string(),
                    table: table.to_string(),
                },
            ),
            insert: Statement::new(
                format!(
                    "INSERT INTO {}.{} (id, created, value) VALUES (?, ?, ?)",
                    keyspace, table
                ),
                StatementKind::Insert {
                    keyspace: keyspace.to_string(),
                    table: table.to_string(),
                },
            ),
            update: Statement::new(
                format!(
                    "UPDATE {}.{} SET value = ? WHERE id = ? IF EXISTS",
                    keyspace, table
                ),
                StatementKind::UpdateIfExists {
                    keyspace: keyspace.to_string(),
                    table: table.to_string(),
                },
            ),
            delete: Statement::new(
                format!("DELETE FROM {}.{} WHERE id = ? IF EXISTS", keyspace, table),
                StatementKind::DeleteIfExists {
                    keyspace: keyspace.to_string(),
                    table: table.to_string(),
                },
            ),
            // Conditional statements cannot appear in a logged batch, so
            // batches carry the unconditional form.
            batch_delete: Statement::new(
                format!("DELETE FROM {}.{} WHERE id = ?", keyspace, table),
                StatementKind::Delete {
                    keyspace: keyspace.to_string(),
                    table: table.to_string(),
                },
            ),
            scan: Statement::new(
                format!("SELECT id, value FROM {}.{}", keyspace, table),
                StatementKind::Scan {
                    keyspace: keyspace.to_string(),
                    table: table.to_string(),
                },
            ),
        }
    }

    pub(crate) fn get(&self) -> &Statement {
        &self.get
    }

    pub(crate) fn insert(&self) -> &Statement {
        &self.insert
    }

    pub(crate) fn update(&self) -> &Statement {
        &self.update
    }

    pub(crate) fn delete(&self) -> &Statement {
        &self.delete
    }

    pub(crate) fn batch_delete(&self) -> &Statement {
        &self.batch_delete
    }

    pub(crate) fn scan(&self) -> &Statement {
        &self.scan
    }
}

/// Builds the idempotent keyspace creation statement.
pub(crate) fn create_keyspace(keyspace: &str, replicas: u32) -> Statement {
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

/// Builds the idempotent table creation statement.
pub(crate) fn create_table(keyspace: &str, table: &str) -> Statement {
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

/// Validates a keyspace or table name before it is spliced into statements.
///
/// Only unquoted identifiers are supported: a leading letter followed by
/// letters, digits or underscores.
pub(crate) fn validate_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(Error::Schema(format!(
            "invalid identifier {:?}: expected a letter followed by letters, digits or underscores",
            name
        )))
    }
}
