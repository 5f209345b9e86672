// SPDX-License-Identifier: Apache-2.0

//! SQLite Connector
//!
//! Reference implementation of the connector traits over SQLx.
//!
//! ## SQLite Specifics
//!
//! - URLs use the SQLx form: `sqlite:path/to.db`, `sqlite::memory:`
//! - One dedicated connection per session; `:memory:` databases are
//!   therefore private to the session that opened them
//! - The `create` property (default `true`) creates missing database files
//!
//! ## Transaction Handling
//!
//! Sessions start in auto-commit mode. Turning auto-commit off issues
//! `BEGIN`; `commit`/`rollback` end the transaction and immediately open the
//! next one for as long as the session stays in manual mode.

use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex as SyncMutex;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{Column, Connection, Row, TypeInfo};
use tokio::sync::Mutex;
use tracing::debug;

use crate::engine::error::{EngineError, EngineResult};
use crate::engine::traits::{Connector, PreparedStatement, Session, Statement};
use crate::engine::types::{
    ColumnInfo, ConnectionProperties, ExecuteOutcome, QueryResult, Row as QRow, SessionId,
    SessionMetadata, Value,
};

/// URL prefix understood by this connector
pub const URL_PREFIX: &str = "sqlite:";

/// Property controlling whether a missing database file is created
pub const PROP_CREATE: &str = "create";

/// Leading keywords of statements that produce a row set
const ROW_KEYWORDS: [&str; 5] = ["SELECT", "WITH", "VALUES", "PRAGMA", "EXPLAIN"];

/// SQLite's default SQLITE_MAX_VARIABLE_NUMBER
const MAX_PARAMETERS: usize = 32766;

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/// SQLite connector implementation
#[derive(Debug, Default)]
pub struct SqliteConnector;

impl SqliteConnector {
    pub fn new() -> Self {
        Self
    }

    fn build_connect_options(
        url: &str,
        props: &ConnectionProperties,
    ) -> EngineResult<SqliteConnectOptions> {
        let create = props
            .get(PROP_CREATE)
            .and_then(parse_bool_param)
            .unwrap_or(true);

        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| EngineError::connection_failed(e.to_string()))?
            .create_if_missing(create)
            .busy_timeout(Duration::from_secs(30));

        Ok(options)
    }
}

#[async_trait]
impl Connector for SqliteConnector {
    fn driver_id(&self) -> &'static str {
        "sqlite"
    }

    fn driver_name(&self) -> &'static str {
        "SQLite"
    }

    fn accepts_url(&self, url: &str) -> bool {
        url.starts_with(URL_PREFIX)
    }

    async fn connect(
        &self,
        url: &str,
        props: &ConnectionProperties,
    ) -> EngineResult<Option<Box<dyn Session>>> {
        if !self.accepts_url(url) {
            return Ok(None);
        }

        let options = Self::build_connect_options(url, props)?;
        let conn = SqliteConnection::connect_with(&options)
            .await
            .map_err(|e| EngineError::connection_failed(e.to_string()))?;

        let session = SqliteSession::new(conn, url.to_string());
        debug!(session = %session.state.id.0, "SQLite session opened");
        Ok(Some(Box::new(session)))
    }
}

/// State shared by a session and every statement it created
struct SessionState {
    id: SessionId,
    url: String,
    conn: Mutex<Option<SqliteConnection>>,
    auto_commit: AtomicBool,
    closed: AtomicBool,
}

impl SessionState {
    fn ensure_open(&self) -> EngineResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(EngineError::closed("Session"));
        }
        Ok(())
    }

    /// Runs a statement for its side effects only
    async fn run_plain(&self, sql: &str) -> EngineResult<()> {
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or_else(|| EngineError::closed("Session"))?;
        sqlx::query(sql)
            .execute(&mut *conn)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn fetch(
        &self,
        sql: &str,
        params: &[Value],
        max_rows: Option<u64>,
    ) -> EngineResult<QueryResult> {
        self.ensure_open()?;
        let start = Instant::now();

        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or_else(|| EngineError::closed("Session"))?;

        let sqlite_rows: Vec<SqliteRow> = bind_all(sqlx::query(sql), params)
            .fetch_all(&mut *conn)
            .await
            .map_err(map_sqlx_error)?;

        let execution_time_ms = start.elapsed().as_micros() as f64 / 1000.0;

        let columns = sqlite_rows.first().map(get_column_info).unwrap_or_default();
        let mut rows: Vec<QRow> = sqlite_rows.iter().map(convert_row).collect();
        if let Some(max) = max_rows {
            rows.truncate(max as usize);
        }

        Ok(QueryResult {
            columns,
            rows,
            execution_time_ms,
        })
    }

    async fn update(&self, sql: &str, params: &[Value]) -> EngineResult<u64> {
        self.ensure_open()?;

        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or_else(|| EngineError::closed("Session"))?;

        let result = bind_all(sqlx::query(sql), params)
            .execute(&mut *conn)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }

    async fn execute(
        &self,
        sql: &str,
        params: &[Value],
        max_rows: Option<u64>,
    ) -> EngineResult<ExecuteOutcome> {
        if returns_rows(sql) {
            self.fetch(sql, params, max_rows)
                .await
                .map(ExecuteOutcome::Rows)
        } else {
            self.update(sql, params).await.map(ExecuteOutcome::Updated)
        }
    }
}

/// Holds the connection state for a SQLite session.
pub struct SqliteSession {
    state: Arc<SessionState>,
}

impl SqliteSession {
    fn new(conn: SqliteConnection, url: String) -> Self {
        Self {
            state: Arc::new(SessionState {
                id: SessionId::new(),
                url,
                conn: Mutex::new(Some(conn)),
                auto_commit: AtomicBool::new(true),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Ends the current transaction and opens the next one
    async fn finish_transaction(&self, verb: &str) -> EngineResult<()> {
        self.state.ensure_open()?;
        if self.state.auto_commit.load(Ordering::SeqCst) {
            return Err(EngineError::transaction_error(format!(
                "No active transaction to {}",
                verb.to_ascii_lowercase()
            )));
        }

        self.state.run_plain(verb).await.map_err(|e| {
            EngineError::transaction_error(format!("Failed to {} transaction: {}", verb.to_ascii_lowercase(), e))
        })?;
        self.state.run_plain("BEGIN").await
    }
}

#[async_trait]
impl Session for SqliteSession {
    fn session_id(&self) -> SessionId {
        self.state.id
    }

    async fn create_statement(&self) -> EngineResult<Box<dyn Statement>> {
        self.state.ensure_open()?;
        Ok(Box::new(SqliteStatement::new(self.state.clone())))
    }

    async fn prepare_statement(&self, sql: &str) -> EngineResult<Box<dyn PreparedStatement>> {
        self.state.ensure_open()?;
        Ok(Box::new(SqlitePreparedStatement::new(
            self.state.clone(),
            sql.to_string(),
        )))
    }

    fn native_sql(&self, sql: &str) -> EngineResult<String> {
        self.state.ensure_open()?;
        Ok(sql.to_string())
    }

    async fn metadata(&self) -> EngineResult<SessionMetadata> {
        let version = self.state.fetch("SELECT sqlite_version()", &[], None).await?;
        let product_version = version
            .rows
            .first()
            .and_then(|row| row.get(0))
            .and_then(Value::as_text)
            .unwrap_or_default()
            .to_string();

        Ok(SessionMetadata {
            driver_name: "SQLite".to_string(),
            url: self.state.url.clone(),
            product_name: "SQLite".to_string(),
            product_version,
            catalog_term: "database".to_string(),
        })
    }

    async fn set_auto_commit(&self, auto_commit: bool) -> EngineResult<()> {
        self.state.ensure_open()?;
        let current = self.state.auto_commit.load(Ordering::SeqCst);
        if current == auto_commit {
            return Ok(());
        }

        // leaving manual mode commits the pending work
        let statement = if auto_commit { "COMMIT" } else { "BEGIN" };
        self.state.run_plain(statement).await.map_err(|e| {
            EngineError::transaction_error(format!("Failed to switch auto-commit: {}", e))
        })?;
        self.state.auto_commit.store(auto_commit, Ordering::SeqCst);
        Ok(())
    }

    async fn auto_commit(&self) -> EngineResult<bool> {
        self.state.ensure_open()?;
        Ok(self.state.auto_commit.load(Ordering::SeqCst))
    }

    async fn commit(&self) -> EngineResult<()> {
        self.finish_transaction("COMMIT").await
    }

    async fn rollback(&self) -> EngineResult<()> {
        self.finish_transaction("ROLLBACK").await
    }

    async fn close(&self) -> EngineResult<()> {
        if self.state.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let conn = self.state.conn.lock().await.take();
        if let Some(conn) = conn {
            conn.close()
                .await
                .map_err(|e| EngineError::connection_failed(e.to_string()))?;
        }
        debug!(session = %self.state.id.0, "SQLite session closed");
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.state.closed.load(Ordering::SeqCst)
    }
}

/// Statement handle running text against its session's connection
pub struct SqliteStatement {
    session: Arc<SessionState>,
    max_rows: SyncMutex<Option<u64>>,
    closed: AtomicBool,
}

impl SqliteStatement {
    fn new(session: Arc<SessionState>) -> Self {
        Self {
            session,
            max_rows: SyncMutex::new(None),
            closed: AtomicBool::new(false),
        }
    }

    fn ensure_open(&self) -> EngineResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(EngineError::closed("Statement"));
        }
        self.session.ensure_open()
    }

    fn current_max_rows(&self) -> Option<u64> {
        *self.max_rows.lock()
    }
}

#[async_trait]
impl Statement for SqliteStatement {
    async fn execute_update(&self, sql: &str) -> EngineResult<u64> {
        self.ensure_open()?;
        self.session.update(sql, &[]).await
    }

    async fn execute_query(&self, sql: &str) -> EngineResult<QueryResult> {
        self.ensure_open()?;
        self.session.fetch(sql, &[], self.current_max_rows()).await
    }

    async fn execute(&self, sql: &str) -> EngineResult<ExecuteOutcome> {
        self.ensure_open()?;
        self.session
            .execute(sql, &[], self.current_max_rows())
            .await
    }

    async fn set_max_rows(&self, max_rows: Option<u64>) -> EngineResult<()> {
        self.ensure_open()?;
        *self.max_rows.lock() = max_rows;
        Ok(())
    }

    async fn max_rows(&self) -> EngineResult<Option<u64>> {
        self.ensure_open()?;
        Ok(self.current_max_rows())
    }

    async fn cancel(&self) -> EngineResult<()> {
        // sqlite3_interrupt would have to run on the busy connection itself
        Err(EngineError::not_supported(
            "SQLite does not support query cancellation",
        ))
    }

    async fn close(&self) -> EngineResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst) || self.session.closed.load(Ordering::SeqCst)
    }
}

/// Prepared statement with 1-based positional parameters
pub struct SqlitePreparedStatement {
    statement: SqliteStatement,
    sql: String,
    params: SyncMutex<Vec<Value>>,
}

impl SqlitePreparedStatement {
    fn new(session: Arc<SessionState>, sql: String) -> Self {
        Self {
            statement: SqliteStatement::new(session),
            sql,
            params: SyncMutex::new(Vec::new()),
        }
    }

    fn bound_params(&self) -> Vec<Value> {
        self.params.lock().clone()
    }
}

#[async_trait]
impl Statement for SqlitePreparedStatement {
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
        self.params.lock().clear();
        self.statement.close().await
    }

    fn is_closed(&self) -> bool {
        self.statement.is_closed()
    }
}

#[async_trait]
impl PreparedStatement for SqlitePreparedStatement {
    fn sql(&self) -> String {
        self.sql.clone()
    }

    async fn bind(&self, index: usize, value: Value) -> EngineResult<()> {
        self.statement.ensure_open()?;
        if index == 0 {
            return Err(EngineError::validation("Parameter indexes start at 1"));
        }

        if index > MAX_PARAMETERS {
            return Err(EngineError::validation(format!(
                "Parameter index {} exceeds the limit of {}",
                index, MAX_PARAMETERS
            )));
        }

        let mut params = self.params.lock();
        if params.len() < index {
            params.resize(index, Value::Null);
        }
        params[index - 1] = value;
        Ok(())
    }

    async fn clear_parameters(&self) -> EngineResult<()> {
        self.statement.ensure_open()?;
        self.params.lock().clear();
        Ok(())
    }

    async fn execute_prepared_query(&self) -> EngineResult<QueryResult> {
        self.statement.ensure_open()?;
        let params = self.bound_params();
        self.statement
            .session
            .fetch(&self.sql, &params, self.statement.current_max_rows())
            .await
    }

    async fn execute_prepared_update(&self) -> EngineResult<u64> {
        self.statement.ensure_open()?;
        let params = self.bound_params();
        self.statement.session.update(&self.sql, &params).await
    }

    async fn execute_prepared(&self) -> EngineResult<ExecuteOutcome> {
        self.statement.ensure_open()?;
        let params = self.bound_params();
        self.statement
            .session
            .execute(&self.sql, &params, self.statement.current_max_rows())
            .await
    }
}

/// Whether a statement produces a row set, judged by its leading keyword
fn returns_rows(sql: &str) -> bool {
    let keyword = sql
        .trim_start_matches(|c: char| c.is_whitespace() || c == '(')
        .split(|c: char| !c.is_ascii_alphabetic())
        .next()
        .unwrap_or_default();

    ROW_KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(keyword))
}

fn parse_bool_param(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

fn map_sqlx_error(e: sqlx::Error) -> EngineError {
    let msg = e.to_string();
    if msg.contains("syntax") {
        EngineError::syntax_error(msg)
    } else {
        EngineError::execution_error(msg)
    }
}

/// Binds every value in order; unbound trailing placeholders read as NULL
fn bind_all<'q>(mut query: SqliteQuery<'q>, params: &'q [Value]) -> SqliteQuery<'q> {
    for value in params {
        query = bind_param(query, value);
    }
    query
}

/// Helper to bind a Value to a SQLite query
fn bind_param<'q>(query: SqliteQuery<'q>, value: &'q Value) -> SqliteQuery<'q> {
    match value {
        Value::Null => query.bind(Option::<String>::None),
        Value::Bool(b) => query.bind(b),
        Value::Int(i) => query.bind(i),
        Value::Float(f) => query.bind(f),
        Value::Text(s) => query.bind(s.as_str()),
        Value::Bytes(b) => query.bind(b.as_slice()),
    }
}

/// Converts a SQLx row to our universal Row type
fn convert_row(sqlite_row: &SqliteRow) -> QRow {
    let values: Vec<Value> = sqlite_row
        .columns()
        .iter()
        .map(|col| extract_value(sqlite_row, col.ordinal()))
        .collect();

    QRow { values }
}

/// Extracts a value from a SqliteRow at the given index
///
/// SQLite has dynamic typing, so we try multiple types in order of likelihood
fn extract_value(row: &SqliteRow, idx: usize) -> Value {
    if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
        return v.map(Value::Int).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
        return v.map(Value::Float).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(idx) {
        return v.map(Value::Bool).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
        return v.map(Value::Text).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(idx) {
        return v.map(Value::Bytes).unwrap_or(Value::Null);
    }

    Value::Null
}

/// Gets column info from a SqliteRow
fn get_column_info(row: &SqliteRow) -> Vec<ColumnInfo> {
    row.columns()
        .iter()
        .map(|col| ColumnInfo {
            name: col.name().to_string(),
            data_type: col.type_info().name().to_string(),
            nullable: true, // not exposed on row metadata
        })
        .collect()
}
