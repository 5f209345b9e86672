// SPDX-License-Identifier: Apache-2.0

//! Structural escape forms: `{fn ...}` and `{oj ...}`.
//!
//! Payloads can nest further forms and carry their own braces, so the
//! closing brace is found with a depth counter rather than a regex. One
//! pass strips the outermost layer of every balanced form it sees;
//! [`unwrap_structural`] repeats the pass until the text stops changing.
//!
//! The first marker without a closing brace ends the pass: from there to
//! the end of input the text is kept byte for byte, whichever tags it holds.

use std::sync::OnceLock;

use regex::Regex;

fn marker() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| {
        Regex::new(r"(?i)\{(?:fn|oj)\s+").expect("structural escape marker is a valid regex")
    })
}

/// Strips every `{fn ...}` and `{oj ...}` wrapper, keeping the trimmed payload.
///
/// An unbalanced form is left in place, from its marker to the end of input.
pub fn unwrap_structural(sql: &str) -> String {
    let mut current = sql.to_string();
    loop {
        let next = unwrap_pass(&current);

        // every successful unwrap shortens the text, so this terminates
        if next == current {
            return current;
        }
        current = next;
    }
}

/// One left-to-right pass over both tags.
fn unwrap_pass(sql: &str) -> String {
    let bytes = sql.as_bytes();
    let mut out = String::with_capacity(sql.len());
    let mut cursor = 0;

    while let Some(found) = marker().find_at(sql, cursor) {
        out.push_str(&sql[cursor..found.start()]);

        match closing_brace(bytes, found.end()) {
            Some(close) => {
                out.push_str(sql[found.end()..close].trim());
                cursor = close + 1;
            }
            None => {
                // unbalanced: keep the rest verbatim
                out.push_str(&sql[found.start()..]);
                return out;
            }
        }
    }

    out.push_str(&sql[cursor..]);
    out
}

/// Index of the brace closing a form whose payload starts at `from`.
///
/// `{` and `}` are single-byte in UTF-8, so a byte scan never lands inside
/// a multi-byte character.
fn closing_brace(bytes: &[u8], from: usize) -> Option<usize> {
    let mut depth = 1usize;
    for (offset, byte) in bytes[from..].iter().enumerate() {
        match byte {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(from + offset);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_escape() {
        assert_eq!(
            unwrap_structural("SELECT {fn UPPER(name)} FROM t"),
            "SELECT UPPER(name) FROM t"
        );
    }

    #[test]
    fn test_outer_join_escape() {
        assert_eq!(
            unwrap_structural("SELECT * FROM {oj t1 LEFT OUTER JOIN t2 ON t1.id = t2.id}"),
            "SELECT * FROM t1 LEFT OUTER JOIN t2 ON t1.id = t2.id"
        );
    }

    #[test]
    fn test_payload_is_trimmed() {
        assert_eq!(unwrap_structural("{fn   NOW()   }"), "NOW()");
        assert_eq!(unwrap_structural("{FN\n  NOW()\n}"), "NOW()");
    }

    #[test]
    fn test_nested_function_escapes() {
        assert_eq!(
            unwrap_structural("WHERE {fn LENGTH({fn UPPER(name)})} > 0"),
            "WHERE LENGTH(UPPER(name)) > 0"
        );
        assert_eq!(
            unwrap_structural("{fn A({fn B({fn C(x)})})}"),
            "A(B(C(x)))"
        );
    }

    #[test]
    fn test_function_inside_outer_join() {
        assert_eq!(
            unwrap_structural("FROM {oj a LEFT OUTER JOIN b ON {fn LOWER(a.k)} = b.k}"),
            "FROM a LEFT OUTER JOIN b ON LOWER(a.k) = b.k"
        );
    }

    #[test]
    fn test_alternating_tags_need_another_round() {
        // one layer per round
        assert_eq!(unwrap_structural("{oj {fn F({oj x})}}"), "F(x)");
    }

    #[test]
    fn test_siblings() {
        assert_eq!(
            unwrap_structural("SELECT {fn A(x)}, {fn B(y)} FROM t"),
            "SELECT A(x), B(y) FROM t"
        );
    }

    #[test]
    fn test_unbalanced_span_is_preserved() {
        let sql = "SELECT {fn UPPER(name) FROM t";
        assert_eq!(unwrap_structural(sql), sql);
    }

    #[test]
    fn test_balanced_form_before_unbalanced_one() {
        assert_eq!(
            unwrap_structural("SELECT {fn A(x)}, {fn B(y) FROM t"),
            "SELECT A(x), {fn B(y) FROM t"
        );
    }

    #[test]
    fn test_unbalanced_span_keeps_forms_of_either_tag() {
        let sql = "SELECT * FROM {oj a LEFT JOIN b ON {fn LOWER(a.k)} = b.k";
        assert_eq!(unwrap_structural(sql), sql);

        let sql = "SELECT {fn F({oj x}) FROM t";
        assert_eq!(unwrap_structural(sql), sql);
    }

    #[test]
    fn test_balanced_forms_before_unbalanced_span_of_other_tag() {
        assert_eq!(
            unwrap_structural("SELECT {fn A({oj x})} FROM {oj a JOIN b ON {fn B(a.k)} = b.k"),
            "SELECT A(x) FROM {oj a JOIN b ON {fn B(a.k)} = b.k"
        );
        assert_eq!(
            unwrap_structural("FROM {oj a JOIN b ON {fn C(a.k)} = b.k} WHERE {fn D({oj y}) > 0"),
            "FROM a JOIN b ON C(a.k) = b.k WHERE {fn D({oj y}) > 0"
        );
    }

    #[test]
    fn test_marker_requires_whitespace() {
        let sql = "SELECT '{fn}' , {fnord x} FROM t";
        assert_eq!(unwrap_structural(sql), sql);
    }

    #[test]
    fn test_multibyte_text_around_forms() {
        assert_eq!(
            unwrap_structural("SELECT {fn CONCAT('é', 'ü')} AS naïve"),
            "SELECT CONCAT('é', 'ü') AS naïve"
        );
    }
}
