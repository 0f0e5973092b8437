//! Query text normalization and clause extraction.
//!
//! ```text
//! MATCH (p:Person) // people only
//! WHERE p.age > 30
//! RETURN p.name
//!        │
//!        ▼  preprocess
//! MATCH (p:Person) WHERE p.age > 30 RETURN p.name
//!        │
//!        ▼  extract_clauses
//! match = "(p:Person)", where = "p.age > 30", return = "p.name"
//! ```

use serde::Serialize;

/// Strip comments and collapse whitespace.
///
/// `//` comments run to the end of their line and are removed first, then
/// `/* ... */` blocks (shortest match). An unterminated `/*` is left as is.
pub fn preprocess(query: &str) -> String {
    let without_line_comments = query
        .lines()
        .map(|line| match line.find("//") {
            Some(idx) => &line[..idx],
            None => line,
        })
        .collect::<Vec<_>>()
        .join("\n");

    let mut text = without_line_comments;
    let mut search_from = 0;
    while let Some(start) = text[search_from..].find("/*").map(|i| i + search_from) {
        match text[start + 2..].find("*/") {
            Some(len) => {
                text.replace_range(start..start + 2 + len + 2, "");
                search_from = start;
            }
            None => break,
        }
    }

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The three clause bodies of a normalized query, without their keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Clauses<'a> {
    pub match_clause: &'a str,
    pub where_clause: &'a str,
    pub return_clause: &'a str,
}

/// Split normalized text into MATCH, WHERE and RETURN bodies.
///
/// Each body runs from its keyword to the next keyword that may follow it
/// (MATCH stops at WHERE or RETURN, WHERE stops at RETURN, RETURN runs to the
/// end). A missing keyword yields an empty body; deciding whether that is an
/// error is left to the caller.
pub fn extract_clauses(text: &str) -> Clauses<'_> {
    Clauses {
        match_clause: clause_body(text, "MATCH", &["WHERE", "RETURN"]),
        where_clause: clause_body(text, "WHERE", &["RETURN"]),
        return_clause: clause_body(text, "RETURN", &[]),
    }
}

fn clause_body<'a>(text: &'a str, keyword: &str, terminators: &[&str]) -> &'a str {
    let Some((_, body_start)) = find_keyword(text, keyword, 0) else {
        return "";
    };
    let body_end = terminators
        .iter()
        .filter_map(|term| find_keyword(text, term, body_start).map(|(start, _)| start))
        .min()
        .unwrap_or(text.len());
    text[body_start..body_end].trim()
}

/// Locate `keyword` as a whole word at or after `from`, ignoring text inside
/// double quotes. Returns the keyword start and the offset just past it.
fn find_keyword(text: &str, keyword: &str, from: usize) -> Option<(usize, usize)> {
    let bytes = text.as_bytes();
    let kw = keyword.as_bytes();
    let mut in_quotes = false;

    for (idx, ch) in text.char_indices() {
        if ch == '"' {
            in_quotes = !in_quotes;
            continue;
        }
        if in_quotes || idx < from {
            continue;
        }
        let end = idx + kw.len();
        if end > bytes.len() || !bytes[idx..end].eq_ignore_ascii_case(kw) {
            continue;
        }
        let boundary_before = text[..idx]
            .chars()
            .next_back()
            .is_none_or(|c| !is_word_char(c));
        let boundary_after = text[end..].chars().next().is_none_or(|c| !is_word_char(c));
        if boundary_before && boundary_after {
            return Some((idx, end));
        }
    }
    None
}

pub(crate) fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
