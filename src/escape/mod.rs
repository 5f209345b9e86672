// SPDX-License-Identifier: Apache-2.0

//! Escape-sequence translator
//!
//! Rewrites the bracketed escape dialect (`{fn ...}`, `{oj ...}`,
//! `{ts '...'}`, `{d '...'}`, `{t '...'}`) into plain SQL, then lets a
//! grammar print the result in canonical form.
//!
//! Translation never fails. Each stage falls back to the best text it has:
//! the grammar's output when it parses, the escape-free text when it does
//! not, and the caller's original text if anything unexpected happens.

pub mod grammar;
mod literal;
mod structural;

use std::panic::{self, AssertUnwindSafe};
use std::sync::OnceLock;

use tracing::{trace, warn};

pub use grammar::{ParseFailure, ParsedStatement, SqlGrammar, SqlparserGrammar};

/// Runs the two rewrite passes and the optional normalization step
pub struct Translator {
    grammar: Option<Box<dyn SqlGrammar>>,
}

impl Translator {
    pub fn new(grammar: impl SqlGrammar + 'static) -> Self {
        Self {
            grammar: Some(Box::new(grammar)),
        }
    }

    /// A translator that only rewrites escapes and never normalizes
    pub fn without_grammar() -> Self {
        Self { grammar: None }
    }

    /// A translator normalizing with the named sqlparser dialect
    pub fn for_dialect(name: &str) -> Self {
        Self::new(SqlparserGrammar::with_dialect(name))
    }

    pub fn translate(&self, sql: &str) -> String {
        match panic::catch_unwind(AssertUnwindSafe(|| self.rewrite_and_normalize(sql))) {
            Ok(translated) => translated,
            Err(_) => {
                warn!("Escape translation aborted, forwarding query unchanged");
                sql.to_string()
            }
        }
    }

    fn rewrite_and_normalize(&self, sql: &str) -> String {
        let rewritten = rewrite_escapes(sql);

        let Some(grammar) = &self.grammar else {
            return rewritten;
        };

        match grammar.parse(&rewritten) {
            Ok(parsed) => parsed.serialize(),
            Err(failure) => {
                trace!(error = %failure, "Grammar rejected rewritten query, keeping escape-free text");
                rewritten
            }
        }
    }
}

impl Default for Translator {
    fn default() -> Self {
        Self::new(SqlparserGrammar::default())
    }
}

/// Process-wide translator using the generic dialect
pub fn default_translator() -> &'static Translator {
    static TRANSLATOR: OnceLock<Translator> = OnceLock::new();
    TRANSLATOR.get_or_init(Translator::default)
}

/// Translates query text with the default translator
pub fn translate(sql: &str) -> String {
    default_translator().translate(sql)
}

/// Like [`translate`], passing absent text through as absent
pub fn translate_opt(sql: Option<&str>) -> Option<String> {
    sql.map(translate)
}

/// Literal pass followed by the structural pass, without normalization.
///
/// Literals go first: they can sit inside a `{fn ...}` payload and never
/// introduce braces of their own.
pub fn rewrite_escapes(sql: &str) -> String {
    structural::unwrap_structural(&literal::replace_literals(sql))
}
