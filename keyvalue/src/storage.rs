//! Translation of point operations into statement executions.
//!
//! [`TableStorage`] owns the session handle, the compiled statement registry
//! and the clock used to stamp creation times. All methods take `&self`;
//! independent calls may run concurrently against the shared session.

use std::sync::Arc;

use bytes::Bytes;
use common::{BatchStatement, Clock, CqlSession, CqlValue};

use crate::config::PutOptions;
use crate::error::{Error, Result};
use crate::model::BatchOp;
use crate::serde::encode_id;
use crate::statements::StatementRegistry;

pub(crate) struct TableStorage {
    session: Arc<dyn CqlSession>,
    statements: StatementRegistry,
    clock: Arc<dyn Clock>,
}

impl TableStorage {
    pub(crate) fn new(
        session: Arc<dyn CqlSession>,
        statements: StatementRegistry,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            session,
            statements,
            clock,
        }
    }

    pub(crate) fn session(&self) -> Arc<dyn CqlSession> {
        Arc::clone(&self.session)
    }

    pub(crate) fn statements(&self) -> &StatementRegistry {
        &self.statements
    }

    /// Gets the payload for a key.
    ///
    /// Zero rows is [`Error::NotFound`]. More than one row violates primary
    /// key uniqueness and is reported as an internal error rather than
    /// resolved by taking the first row.
    #[tracing::instrument(level = "trace", skip_all)]
    pub(crate) async fn get(&self, key: &Bytes) -> Result<Bytes> {
        let id = encode_id(key)?;
        let result = self
            .session
            .execute(self.statements.get(), &[CqlValue::Text(id)])
            .await?;
        match result.rows.len() {
            0 => Err(Error::NotFound),
            1 => result.rows[0]
                .column(0)
                .and_then(CqlValue::as_blob)
                .cloned()
                .ok_or_else(|| Error::Internal("get returned a non-blob value column".to_string())),
            n => Err(Error::Internal(format!(
                "{} rows returned for a single primary key",
                n
            ))),
        }
    }

    /// Writes a payload.
    ///
    /// With `insert` set this is an unconditional create that stamps the
    /// creation time. Otherwise it is a conditional update that fails with
    /// [`Error::ConditionNotMet`] when no row exists; callers wanting
    /// create-or-update semantics must request `insert` explicitly.
    #[tracing::instrument(level = "trace", skip_all)]
    pub(crate) async fn put(&self, key: &Bytes, value: Bytes, options: PutOptions) -> Result<()> {
        if options.insert {
            return self.insert(key, value).await;
        }
        let id = encode_id(key)?;
        let result = self
            .session
            .execute(
                self.statements.update(),
                &[CqlValue::Blob(value), CqlValue::Text(id)],
            )
            .await?;
        if result.was_applied {
            Ok(())
        } else {
            Err(Error::ConditionNotMet)
        }
    }

    async fn insert(&self, key: &Bytes, value: Bytes) -> Result<()> {
        let id = encode_id(key)?;
        let created = self.clock.now();
        self.session
            .execute(
                self.statements.insert(),
                &[
                    CqlValue::Text(id),
                    CqlValue::Timestamp(created),
                    CqlValue::Blob(value),
                ],
            )
            .await?;
        Ok(())
    }

    /// Deletes a key. A conditional delete that finds no row reports an
    /// unmet condition; the generic contract treats deleting an absent key
    /// as a no-op success, so the outcome is deliberately ignored.
    #[tracing::instrument(level = "trace", skip_all)]
    pub(crate) async fn delete(&self, key: &Bytes) -> Result<()> {
        let id = encode_id(key)?;
        self.session
            .execute(self.statements.delete(), &[CqlValue::Text(id)])
            .await?;
        Ok(())
    }

    /// Submits the operations as one atomic logged batch, preserving array
    /// order in the statement list.
    #[tracing::instrument(level = "trace", skip_all)]
    pub(crate) async fn batch(&self, ops: Vec<BatchOp>) -> Result<()> {
        let mut operations = Vec::with_capacity(ops.len());
        for op in ops {
            operations.push(match op {
                BatchOp::Put { key, value } => BatchStatement {
                    statement: self.statements.insert().clone(),
                    params: vec![
                        CqlValue::Text(encode_id(&key)?),
                        CqlValue::Timestamp(self.clock.now()),
                        CqlValue::Blob(value),
                    ],
                },
                BatchOp::Del { key } => BatchStatement {
                    statement: self.statements.batch_delete().clone(),
                    params: vec![CqlValue::Text(encode_id(&key)?)],
                },
            });
        }
        self.session.batch(operations).await?;
        Ok(())
    }
}
