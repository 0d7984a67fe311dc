//! Keyspace and table bootstrap.
//!
//! Both steps issue `IF NOT EXISTS` statements, so they are idempotent and
//! safe when several adapter instances open the same location at once (the
//! race is benign, not serializable). Any execution failure is fatal to the
//! open that triggered it and is surfaced unchanged; retry policy belongs to
//! the backing session.

use common::CqlSession;

use crate::error::{Error, Result};
use crate::statements;

/// Ensures the keyspace and table exist, in that order.
pub(crate) async fn ensure_schema(
    session: &dyn CqlSession,
    keyspace: &str,
    replicas: u32,
    table: &str,
) -> Result<()> {
    ensure_keyspace(session, keyspace, replicas).await?;
    ensure_table(session, keyspace, table).await
}

async fn ensure_keyspace(session: &dyn CqlSession, keyspace: &str, replicas: u32) -> Result<()> {
    if replicas == 0 {
        return Err(Error::Schema(
            "replication factor must be positive".to_string(),
        ));
    }
    tracing::debug!(keyspace, replicas, "creating keyspace");
    let statement = statements::create_keyspace(keyspace, replicas);
    session
        .execute(&statement, &[])
        .await
        .map_err(|e| Error::Schema(e.to_string()))?;
    Ok(())
}

async fn ensure_table(session: &dyn CqlSession, keyspace: &str, table: &str) -> Result<()> {
    tracing::debug!(keyspace, table, "creating data table");
    let statement = statements::create_table(keyspace, table);
    session
        .execute(&statement, &[])
        .await
        .map_err(|e| Error::Schema(e.to_string()))?;
    Ok(())
}
