// SPDX-License-Identifier: Apache-2.0

//! Grammar-driven normalization of escape-free query text.
//!
//! A grammar parses the rewritten text into one statement and prints it
//! back in canonical form. Any parse failure is reported to the caller,
//! which keeps the text it already has.

use sqlparser::ast::Statement;
use sqlparser::dialect::{dialect_from_str, GenericDialect};
use sqlparser::parser::{Parser, ParserError};
use thiserror::Error;

/// Why a grammar refused to normalize a query
#[derive(Debug, Error)]
pub enum ParseFailure {
    #[error("{0}")]
    Syntax(#[from] ParserError),

    #[error("expected exactly one statement, found {0}")]
    StatementCount(usize),
}

/// A single parsed statement, ready to be printed back as text
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedStatement {
    statement: Statement,
}

impl ParsedStatement {
    pub fn new(statement: Statement) -> Self {
        Self { statement }
    }

    pub fn statement(&self) -> &Statement {
        &self.statement
    }

    /// Canonical text of the statement
    pub fn serialize(&self) -> String {
        self.statement.to_string()
    }
}

/// Parser used by the translator's normalization step
pub trait SqlGrammar: Send + Sync {
    fn parse(&self, sql: &str) -> Result<ParsedStatement, ParseFailure>;
}

/// [`SqlGrammar`] backed by sqlparser.
///
/// Unknown dialect names fall back to the generic dialect.
#[derive(Debug, Clone)]
pub struct SqlparserGrammar {
    dialect: String,
}

impl SqlparserGrammar {
    pub fn with_dialect(dialect: impl Into<String>) -> Self {
        Self {
            dialect: dialect.into(),
        }
    }

    pub fn dialect(&self) -> &str {
        &self.dialect
    }
}

impl Default for SqlparserGrammar {
    fn default() -> Self {
        Self::with_dialect("generic")
    }
}

impl SqlGrammar for SqlparserGrammar {
    fn parse(&self, sql: &str) -> Result<ParsedStatement, ParseFailure> {
        let dialect = dialect_from_str(&self.dialect).unwrap_or_else(|| Box::new(GenericDialect {}));
        let mut statements = Parser::parse_sql(dialect.as_ref(), sql)?;

        if statements.len() != 1 {
            return Err(ParseFailure::StatementCount(statements.len()));
        }

        Ok(ParsedStatement::new(statements.remove(0)))
    }
}
