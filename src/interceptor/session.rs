// SPDX-License-Identifier: Apache-2.0

//! Session decorator
//!
//! Every statement handed out by a wrapped session is wrapped as well, so
//! the translation follows the handle chain however deep it goes.

use std::sync::Arc;

use async_trait::async_trait;

use super::hooks::{rewrite_with, Operation, Role};
use super::statement::{EscapingPreparedStatement, EscapingStatement};
use crate::engine::error::EngineResult;
use crate::engine::traits::{PreparedStatement, Session, Statement};
use crate::engine::types::{SessionId, SessionMetadata};
use crate::escape::Translator;

/// Wraps a [`Session`], translating text passed to `prepare_statement`
pub struct EscapingSession {
    inner: Box<dyn Session>,
    translator: Arc<Translator>,
}

impl EscapingSession {
    pub fn new(inner: Box<dyn Session>, translator: Arc<Translator>) -> Self {
        Self { inner, translator }
    }
}

#[async_trait]
impl Session for EscapingSession {
    fn session_id(&self) -> SessionId {
        self.inner.session_id()
    }

    async fn create_statement(&self) -> EngineResult<Box<dyn Statement>> {
        let statement = self.inner.create_statement().await?;
        Ok(Box::new(EscapingStatement::new(
            statement,
            self.translator.clone(),
        )))
    }

    async fn prepare_statement(&self, sql: &str) -> EngineResult<Box<dyn PreparedStatement>> {
        let sql = rewrite_with(&self.translator, Role::Session, Operation::PrepareStatement, sql);
        let prepared = self.inner.prepare_statement(&sql).await?;
        Ok(Box::new(EscapingPreparedStatement::new(
            prepared,
            self.translator.clone(),
        )))
    }

    fn native_sql(&self, sql: &str) -> EngineResult<String> {
        self.inner.native_sql(sql)
    }

    async fn metadata(&self) -> EngineResult<SessionMetadata> {
        self.inner.metadata().await
    }

    async fn set_auto_commit(&self, auto_commit: bool) -> EngineResult<()> {
        self.inner.set_auto_commit(auto_commit).await
    }

    async fn auto_commit(&self) -> EngineResult<bool> {
        self.inner.auto_commit().await
    }

    async fn commit(&self) -> EngineResult<()> {
        self.inner.commit().await
    }

    async fn rollback(&self) -> EngineResult<()> {
        self.inner.rollback().await
    }

    async fn close(&self) -> EngineResult<()> {
        self.inner.close().await
    }

    fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}
