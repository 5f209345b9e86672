// SPDX-License-Identifier: Apache-2.0

//! Literal escape forms: `{ts '...'}`, `{d '...'}` and `{t '...'}`.
//!
//! Each form is one regex substitution. The quoted value never contains
//! braces, so these never need depth tracking.

use std::sync::OnceLock;

use regex::Regex;

struct LiteralForm {
    pattern: Regex,
    replacement: String,
}

impl LiteralForm {
    fn new(tag: &str, keyword: &str) -> Self {
        // (?i) tag case, (?s) values spanning lines, lazy value up to the first `'}`
        let pattern = Regex::new(&format!(r"(?is)\{{{tag}\s+'(.*?)'\}}"))
            .expect("literal escape pattern is a valid regex");

        Self {
            pattern,
            replacement: format!("{keyword} '${{1}}'"),
        }
    }
}

fn literal_forms() -> &'static [LiteralForm] {
    static FORMS: OnceLock<Vec<LiteralForm>> = OnceLock::new();
    FORMS.get_or_init(|| {
        vec![
            LiteralForm::new("ts", "TIMESTAMP"),
            LiteralForm::new("d", "DATE"),
            LiteralForm::new("t", "TIME"),
        ]
    })
}

/// Replaces every literal escape with its ANSI typed literal.
pub fn replace_literals(sql: &str) -> String {
    let mut result = sql.to_string();
    for form in literal_forms() {
        result = form
            .pattern
            .replace_all(&result, form.replacement.as_str())
            .into_owned();
    }
    result
}
