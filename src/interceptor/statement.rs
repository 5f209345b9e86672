// SPDX-License-Identifier: Apache-2.0

//! Statement decorators
//!
//! Text-bearing execution calls are translated on the way in; results and
//! errors come back from the wrapped handle untouched.

use std::sync::Arc;

use async_trait::async_trait;

use super::hooks::{rewrite_with, Operation, Role};
use crate::engine::error::EngineResult;
use crate::engine::traits::{PreparedStatement, Statement};
use crate::engine::types::{ExecuteOutcome, QueryResult, Value};
use crate::escape::Translator;

/// Wraps a [`Statement`], translating query text passed to it
pub struct EscapingStatement {
    inner: Box<dyn Statement>,
    translator: Arc<Translator>,
}

impl EscapingStatement {
    pub fn new(inner: Box<dyn Statement>, translator: Arc<Translator>) -> Self {
        Self { inner, translator }
    }
}

#[async_trait]
impl Statement for EscapingStatement {
    async fn execute_update(&self, sql: &str) -> EngineResult<u64> {
        let sql = rewrite_with(&self.translator, Role::Statement, Operation::ExecuteUpdate, sql);
        self.inner.execute_update(&sql).await
    }

    async fn execute_query(&self, sql: &str) -> EngineResult<QueryResult> {
        let sql = rewrite_with(&self.translator, Role::Statement, Operation::ExecuteQuery, sql);
        self.inner.execute_query(&sql).await
    }

    async fn execute(&self, sql: &str) -> EngineResult<ExecuteOutcome> {
        let sql = rewrite_with(&self.translator, Role::Statement, Operation::Execute, sql);
        self.inner.execute(&sql).await
    }

    async fn set_max_rows(&self, max_rows: Option<u64>) -> EngineResult<()> {
        self.inner.set_max_rows(max_rows).await
    }

    async fn max_rows(&self) -> EngineResult<Option<u64>> {
        self.inner.max_rows().await
    }

    async fn cancel(&self) -> EngineResult<()> {
        self.inner.cancel().await
    }

    async fn close(&self) -> EngineResult<()> {
        self.inner.close().await
    }

    fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}

/// Wraps a [`PreparedStatement`].
///
/// Its own query text was already translated when the session prepared it;
/// only the text-taking execution calls inherited from [`Statement`] are
/// translated here.
pub struct EscapingPreparedStatement {
    inner: Box<dyn PreparedStatement>,
    translator: Arc<Translator>,
}

impl EscapingPreparedStatement {
    pub fn new(inner: Box<dyn PreparedStatement>, translator: Arc<Translator>) -> Self {
        Self { inner, translator }
    }
}

#[async_trait]
impl Statement for EscapingPreparedStatement {
    async fn execute_update(&self, sql: &str) -> EngineResult<u64> {
        let sql = rewrite_with(
            &self.translator,
            Role::PreparedStatement,
            Operation::ExecuteUpdate,
            sql,
        );
        self.inner.execute_update(&sql).await
    }

    async fn execute_query(&self, sql: &str) -> EngineResult<QueryResult> {
        let sql = rewrite_with(
            &self.translator,
            Role::PreparedStatement,
            Operation::ExecuteQuery,
            sql,
        );
        self.inner.execute_query(&sql).await
    }

    async fn execute(&self, sql: &str) -> EngineResult<ExecuteOutcome> {
        let sql = rewrite_with(
            &self.translator,
            Role::PreparedStatement,
            Operation::Execute,
            sql,
        );
        self.inner.execute(&sql).await
    }

    async fn set_max_rows(&self, max_rows: Option<u64>) -> EngineResult<()> {
        self.inner.set_max_rows(max_rows).await
    }

    async fn max_rows(&self) -> EngineResult<Option<u64>> {
        self.inner.max_rows().await
    }

    async fn cancel(&self) -> EngineResult<()> {
        self.inner.cancel().await
    }

    async fn close(&self) -> EngineResult<()> {
        self.inner.close().await
    }

    fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}

#[async_trait]
impl PreparedStatement for EscapingPreparedStatement {
    fn sql(&self) -> String {
        self.inner.sql()
    }

    async fn bind(&self, index: usize, value: Value) -> EngineResult<()> {
        self.inner.bind(index, value).await
    }

    async fn clear_parameters(&self) -> EngineResult<()> {
        self.inner.clear_parameters().await
    }

    async fn execute_prepared_query(&self) -> EngineResult<QueryResult> {
        self.inner.execute_prepared_query().await
    }

    async fn execute_prepared_update(&self) -> EngineResult<u64> {
        self.inner.execute_prepared_update().await
    }

    async fn execute_prepared(&self) -> EngineResult<ExecuteOutcome> {
        self.inner.execute_prepared().await
    }
}
