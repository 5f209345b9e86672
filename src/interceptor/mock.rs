// SPDX-License-Identifier: Apache-2.0

//! Recording handles for interceptor tests

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::hooks::Operation;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::traits::{PreparedStatement, Session, Statement};
use crate::engine::types::{ExecuteOutcome, QueryResult, SessionId, SessionMetadata, Value};

/// Shared, ordered record of what reached the wrapped handles
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<(Operation, Option<String>)>>>);

impl CallLog {
    fn record(&self, op: Operation, text: Option<&str>) {
        self.0.lock().push((op, text.map(str::to_string)));
    }

    pub fn calls(&self) -> Vec<(Operation, Option<String>)> {
        self.0.lock().clone()
    }
}

fn check_text(sql: &str) -> EngineResult<()> {
    if sql.contains(RecordingStatement::FAILING_COLUMN) {
        return Err(EngineError::execution_error("rejected by engine"));
    }
    Ok(())
}

pub struct RecordingSession {
    log: CallLog,
    id: SessionId,
    closed: AtomicBool,
}

impl RecordingSession {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            id: SessionId::new(),
            closed: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl Session for RecordingSession {
    fn session_id(&self) -> SessionId {
        self.log.record(Operation::SessionId, None);
        self.id
    }

    async fn create_statement(&self) -> EngineResult<Box<dyn Statement>> {
        self.log.record(Operation::CreateStatement, None);
        Ok(Box::new(RecordingStatement::new(self.log.clone())))
    }

    async fn prepare_statement(&self, sql: &str) -> EngineResult<Box<dyn PreparedStatement>> {
        self.log.record(Operation::PrepareStatement, Some(sql));
        check_text(sql)?;
        Ok(Box::new(RecordingPrepared::new(self.log.clone(), sql)))
    }

    fn native_sql(&self, sql: &str) -> EngineResult<String> {
        self.log.record(Operation::NativeSql, Some(sql));
        Ok(format!("native:{sql}"))
    }

    async fn metadata(&self) -> EngineResult<SessionMetadata> {
        self.log.record(Operation::Metadata, None);
        Ok(SessionMetadata {
            driver_name: "Recording".to_string(),
            url: "mock:recording".to_string(),
            product_name: "Recording".to_string(),
            product_version: "1".to_string(),
            catalog_term: "catalog".to_string(),
        })
    }

    async fn set_auto_commit(&self, auto_commit: bool) -> EngineResult<()> {
        self.log
            .record(Operation::SetAutoCommit, Some(&auto_commit.to_string()));
        Ok(())
    }

    async fn auto_commit(&self) -> EngineResult<bool> {
        self.log.record(Operation::AutoCommit, None);
        Ok(true)
    }

    async fn commit(&self) -> EngineResult<()> {
        self.log.record(Operation::Commit, None);
        Ok(())
    }

    async fn rollback(&self) -> EngineResult<()> {
        self.log.record(Operation::Rollback, None);
        Err(EngineError::transaction_error("No active transaction to rollback"))
    }

    async fn close(&self) -> EngineResult<()> {
        self.log.record(Operation::Close, None);
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.log.record(Operation::IsClosed, None);
        self.closed.load(Ordering::SeqCst)
    }
}

pub struct RecordingStatement {
    log: CallLog,
    max_rows: Mutex<Option<u64>>,
    closed: AtomicBool,
}

impl RecordingStatement {
    pub const UPDATE_COUNT: u64 = 7;

    /// Query text containing this word fails inside the handle
    pub const FAILING_COLUMN: &'static str = "explode";

    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            max_rows: Mutex::new(None),
            closed: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl Statement for RecordingStatement {
    async fn execute_update(&self, sql: &str) -> EngineResult<u64> {
        self.log.record(Operation::ExecuteUpdate, Some(sql));
        check_text(sql)?;
        Ok(Self::UPDATE_COUNT)
    }

    async fn execute_query(&self, sql: &str) -> EngineResult<QueryResult> {
        self.log.record(Operation::ExecuteQuery, Some(sql));
        check_text(sql)?;
        Ok(QueryResult::empty())
    }

    async fn execute(&self, sql: &str) -> EngineResult<ExecuteOutcome> {
        self.log.record(Operation::Execute, Some(sql));
        check_text(sql)?;
        Ok(ExecuteOutcome::Updated(Self::UPDATE_COUNT))
    }

    async fn set_max_rows(&self, max_rows: Option<u64>) -> EngineResult<()> {
        self.log.record(Operation::SetMaxRows, None);
        *self.max_rows.lock() = max_rows;
        Ok(())
    }

    async fn max_rows(&self) -> EngineResult<Option<u64>> {
        self.log.record(Operation::MaxRows, None);
        Ok(*self.max_rows.lock())
    }

    async fn cancel(&self) -> EngineResult<()> {
        self.log.record(Operation::Cancel, None);
        Ok(())
    }

    async fn close(&self) -> EngineResult<()> {
        self.log.record(Operation::Close, None);
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.log.record(Operation::IsClosed, None);
        self.closed.load(Ordering::SeqCst)
    }
}

pub struct RecordingPrepared {
    statement: RecordingStatement,
    sql: String,
}

impl RecordingPrepared {
    pub fn new(log: CallLog, sql: &str) -> Self {
        Self {
            statement: RecordingStatement::new(log),
            sql: sql.to_string(),
        }
    }

    fn log(&self) -> &CallLog {
        &self.statement.log
    }
}

#[async_trait]
impl Statement for RecordingPrepared {
    async fn execute_update(&self, sql: &str) -> EngineResult<u64> {
        self.statement.execute_update(sql).await
    }

    async fn execute_query(&self, sql: &str) -> EngineResult<QueryResult> {
        self.statement.execute_query(sql).await
    }

    async fn execute(&self, sql: &str) -> EngineResult<ExecuteOutcome> {
        self.statement.execute(sql).await
    }

    async fn set_max_rows(&self, max_rows: Option<u64>) -> EngineResult<()> {
        self.statement.set_max_rows(max_rows).await
    }

    async fn max_rows(&self) -> EngineResult<Option<u64>> {
        self.statement.max_rows().await
    }

    async fn cancel(&self) -> EngineResult<()> {
        self.statement.cancel().await
    }

    async fn close(&self) -> EngineResult<()> {
        self.statement.close().await
    }

    fn is_closed(&self) -> bool {
        self.statement.is_closed()
    }
}

#[async_trait]
impl PreparedStatement for RecordingPrepared {
    fn sql(&self) -> String {
        self.log().record(Operation::Sql, None);
        self.sql.clone()
    }

    async fn bind(&self, _index: usize, value: Value) -> EngineResult<()> {
        let text = match &value {
            Value::Text(s) => s.clone(),
            other => format!("{other:?}"),
        };
        self.log().record(Operation::Bind, Some(&text));
        Ok(())
    }

    async fn clear_parameters(&self) -> EngineResult<()> {
        self.log().record(Operation::ClearParameters, None);
        Ok(())
    }

    async fn execute_prepared_query(&self) -> EngineResult<QueryResult> {
        self.log()
            .record(Operation::ExecutePreparedQuery, Some(&self.sql));
        Ok(QueryResult::empty())
    }

    async fn execute_prepared_update(&self) -> EngineResult<u64> {
        self.log()
            .record(Operation::ExecutePreparedUpdate, Some(&self.sql));
        Ok(RecordingStatement::UPDATE_COUNT)
    }

    async fn execute_prepared(&self) -> EngineResult<ExecuteOutcome> {
        self.log().record(Operation::ExecutePrepared, Some(&self.sql));
        Ok(ExecuteOutcome::Rows(QueryResult::empty()))
    }
}
