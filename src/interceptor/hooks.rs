// SPDX-License-Identifier: Apache-2.0

//! Hook table
//!
//! Lists, per handle role, which operations carry query text that has to be
//! translated before the call reaches the wrapped handle. Every other
//! operation is forwarded untouched.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::escape::{default_translator, Translator};

/// Every operation exposed by the session and statement traits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    // Session
    SessionId,
    CreateStatement,
    PrepareStatement,
    NativeSql,
    Metadata,
    SetAutoCommit,
    AutoCommit,
    Commit,
    Rollback,
    // Statement
    ExecuteUpdate,
    ExecuteQuery,
    Execute,
    SetMaxRows,
    MaxRows,
    Cancel,
    // Prepared statement
    Sql,
    Bind,
    ClearParameters,
    ExecutePreparedQuery,
    ExecutePreparedUpdate,
    ExecutePrepared,
    // Shared
    Close,
    IsClosed,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::SessionId => "session_id",
            Operation::CreateStatement => "create_statement",
            Operation::PrepareStatement => "prepare_statement",
            Operation::NativeSql => "native_sql",
            Operation::Metadata => "metadata",
            Operation::SetAutoCommit => "set_auto_commit",
            Operation::AutoCommit => "auto_commit",
            Operation::Commit => "commit",
            Operation::Rollback => "rollback",
            Operation::ExecuteUpdate => "execute_update",
            Operation::ExecuteQuery => "execute_query",
            Operation::Execute => "execute",
            Operation::SetMaxRows => "set_max_rows",
            Operation::MaxRows => "max_rows",
            Operation::Cancel => "cancel",
            Operation::Sql => "sql",
            Operation::Bind => "bind",
            Operation::ClearParameters => "clear_parameters",
            Operation::ExecutePreparedQuery => "execute_prepared_query",
            Operation::ExecutePreparedUpdate => "execute_prepared_update",
            Operation::ExecutePrepared => "execute_prepared",
            Operation::Close => "close",
            Operation::IsClosed => "is_closed",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of handle an operation is called on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Session,
    Statement,
    PreparedStatement,
}

const SESSION_OPERATIONS: &[Operation] = &[
    Operation::SessionId,
    Operation::CreateStatement,
    Operation::PrepareStatement,
    Operation::NativeSql,
    Operation::Metadata,
    Operation::SetAutoCommit,
    Operation::AutoCommit,
    Operation::Commit,
    Operation::Rollback,
    Operation::Close,
    Operation::IsClosed,
];

const STATEMENT_OPERATIONS: &[Operation] = &[
    Operation::ExecuteUpdate,
    Operation::ExecuteQuery,
    Operation::Execute,
    Operation::SetMaxRows,
    Operation::MaxRows,
    Operation::Cancel,
    Operation::Close,
    Operation::IsClosed,
];

const PREPARED_STATEMENT_OPERATIONS: &[Operation] = &[
    Operation::ExecuteUpdate,
    Operation::ExecuteQuery,
    Operation::Execute,
    Operation::SetMaxRows,
    Operation::MaxRows,
    Operation::Cancel,
    Operation::Close,
    Operation::IsClosed,
    Operation::Sql,
    Operation::Bind,
    Operation::ClearParameters,
    Operation::ExecutePreparedQuery,
    Operation::ExecutePreparedUpdate,
    Operation::ExecutePrepared,
];

const SESSION_HOOKS: &[Operation] = &[Operation::PrepareStatement];

const STATEMENT_HOOKS: &[Operation] = &[
    Operation::ExecuteUpdate,
    Operation::ExecuteQuery,
    Operation::Execute,
];

impl Role {
    /// Every operation a handle of this role exposes
    pub fn operations(&self) -> &'static [Operation] {
        match self {
            Role::Session => SESSION_OPERATIONS,
            Role::Statement => STATEMENT_OPERATIONS,
            Role::PreparedStatement => PREPARED_STATEMENT_OPERATIONS,
        }
    }

    /// Operations whose query text is translated before forwarding
    pub fn hooked_operations(&self) -> &'static [Operation] {
        match self {
            Role::Session => SESSION_HOOKS,
            Role::Statement | Role::PreparedStatement => STATEMENT_HOOKS,
        }
    }

    pub fn intercepts(&self, operation: Operation) -> bool {
        self.hooked_operations().contains(&operation)
    }
}

/// Translates `sql` with the default translator if `role` hooks `operation`
pub fn rewrite<'a>(role: Role, operation: Operation, sql: &'a str) -> Cow<'a, str> {
    rewrite_with(default_translator(), role, operation, sql)
}

/// Same as [`rewrite`] with an explicit translator
pub fn rewrite_with<'a>(
    translator: &Translator,
    role: Role,
    operation: Operation,
    sql: &'a str,
) -> Cow<'a, str> {
    if !role.intercepts(operation) {
        return Cow::Borrowed(sql);
    }

    let translated = translator.translate(sql);
    if translated != sql {
        debug!(?role, operation = operation.as_str(), "Rewrote query text");
    }
    Cow::Owned(translated)
}
