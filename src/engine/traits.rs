// SPDX-License-Identifier: Apache-2.0

//! Connector capability traits
//!
//! These traits are the whole surface a connector exposes: a `Connector`
//! opens `Session`s, and a session hands out `Statement`s and
//! `PreparedStatement`s. The interception layer implements the very same
//! traits, so a wrapped handle is indistinguishable from a real one.

use async_trait::async_trait;

use crate::engine::error::EngineResult;
use crate::engine::types::{
    ConnectionProperties, ExecuteOutcome, QueryResult, SessionId, SessionMetadata, Value,
};

/// Entry point of a database connector
#[async_trait]
pub trait Connector: Send + Sync {
    /// Returns the unique identifier for this connector (e.g., "sqlite", "sqlshim")
    fn driver_id(&self) -> &'static str;

    /// Returns a human-readable name for this connector
    fn driver_name(&self) -> &'static str;

    /// Whether this connector understands the given URL
    fn accepts_url(&self, url: &str) -> bool;

    /// Opens a session.
    ///
    /// Returns `Ok(None)` when the URL is not meant for this connector, so a
    /// registry can move on to the next one.
    async fn connect(
        &self,
        url: &str,
        props: &ConnectionProperties,
    ) -> EngineResult<Option<Box<dyn Session>>>;
}

/// One live connection to the query engine
#[async_trait]
pub trait Session: Send + Sync {
    fn session_id(&self) -> SessionId;

    /// Creates a statement for immediate execution of query text
    async fn create_statement(&self) -> EngineResult<Box<dyn Statement>>;

    /// Creates a reusable parametrized statement from query text
    async fn prepare_statement(&self, sql: &str) -> EngineResult<Box<dyn PreparedStatement>>;

    /// Returns the query text the engine would run, without running it
    fn native_sql(&self, sql: &str) -> EngineResult<String>;

    async fn metadata(&self) -> EngineResult<SessionMetadata>;

    async fn set_auto_commit(&self, auto_commit: bool) -> EngineResult<()>;

    async fn auto_commit(&self) -> EngineResult<bool>;

    async fn commit(&self) -> EngineResult<()>;

    async fn rollback(&self) -> EngineResult<()>;

    /// Closes the session and releases associated resources
    async fn close(&self) -> EngineResult<()>;

    fn is_closed(&self) -> bool;
}

/// A query-execution context that runs raw query text
#[async_trait]
pub trait Statement: Send + Sync {
    /// Runs a statement and returns the number of affected rows
    async fn execute_update(&self, sql: &str) -> EngineResult<u64>;

    /// Runs a statement and returns its row set
    async fn execute_query(&self, sql: &str) -> EngineResult<QueryResult>;

    /// Runs a statement of unknown kind
    async fn execute(&self, sql: &str) -> EngineResult<ExecuteOutcome>;

    /// Caps the number of rows returned by later queries (`None` = unlimited)
    async fn set_max_rows(&self, max_rows: Option<u64>) -> EngineResult<()>;

    async fn max_rows(&self) -> EngineResult<Option<u64>>;

    /// Cancels the statement currently running on this handle
    async fn cancel(&self) -> EngineResult<()>;

    async fn close(&self) -> EngineResult<()>;

    fn is_closed(&self) -> bool;
}

/// A statement whose query text was fixed when it was prepared
///
/// Parameter indexes are 1-based.
#[async_trait]
pub trait PreparedStatement: Statement {
    /// The query text this statement was prepared with
    fn sql(&self) -> String;

    async fn bind(&self, index: usize, value: Value) -> EngineResult<()>;

    async fn clear_parameters(&self) -> EngineResult<()>;

    async fn execute_prepared_query(&self) -> EngineResult<QueryResult>;

    async fn execute_prepared_update(&self) -> EngineResult<u64>;

    async fn execute_prepared(&self) -> EngineResult<ExecuteOutcome>;
}
