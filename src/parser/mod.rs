//! Pattern and clause parsers built on nom.
//!
//! # Grammar
//!
//! ```text
//! node          (variable? (:Label)? {key: value, ...}?)
//! relationship  -[variable? (:TYPE)? {key: value, ...}?]->
//!               <-[variable? (:TYPE)? {key: value, ...}?]-
//! comparison    variable.property op literal      op: = != < <= > >=
//! return item   variable.property | variable | *
//! ```
//!
//! Parsing is best-effort: an element that does not match its shape is
//! reported as absent and the caller decides whether to skip it or to fail.

pub mod clauses;
pub mod descriptors;
pub mod pattern;

pub use clauses::{parse_return, parse_where, ReturnEntry, WhereMatch};
pub use descriptors::{parse_node, parse_relationship, RelationshipParts};
pub use pattern::{parse_pattern, split_segments, Segment, SegmentKind};

use nom::{
    bytes::complete::take_while1,
    error::{Error, ErrorKind},
    IResult,
};

use crate::preprocess::is_word_char;

/// Parse an identifier (variable, label, type, property name).
pub(crate) fn identifier(input: &str) -> IResult<&str, &str> {
    take_while1(is_word_char)(input)
}

/// Parse a double-quoted string and return it with its quotes.
pub(crate) fn quoted(input: &str) -> IResult<&str, &str> {
    if !input.starts_with('"') {
        return Err(nom::Err::Error(Error::new(input, ErrorKind::Char)));
    }
    match input[1..].find('"') {
        Some(end) => Ok((&input[end + 2..], &input[..end + 2])),
        None => Err(nom::Err::Error(Error::new(input, ErrorKind::Char))),
    }
}

/// Split on `separator` outside double-quoted text.
/// Returns each piece with its byte offset in `text`.
pub(crate) fn split_top_level(text: &str, separator: char) -> Vec<(usize, &str)> {
    let mut pieces = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;

    for (idx, ch) in text.char_indices() {
        if ch == '"' {
            in_quotes = !in_quotes;
        } else if ch == separator && !in_quotes {
            pieces.push((start, &text[start..idx]));
            start = idx + ch.len_utf8();
        }
    }
    pieces.push((start, &text[start..]));
    pieces
}

/// Byte offset of the first `close` at or after `from` that is outside
/// double quotes.
pub(crate) fn find_unquoted(text: &str, from: usize, close: char) -> Option<usize> {
    let mut in_quotes = false;
    for (idx, ch) in text[from..].char_indices() {
        if ch == '"' {
            in_quotes = !in_quotes;
        } else if ch == close && !in_quotes {
            return Some(from + idx);
        }
    }
    None
}

/// Run `parser` at every position of `text` where `accept` holds and return
/// the first success with its offset.
pub(crate) fn search<'a, O, F, A>(text: &'a str, accept: A, mut parser: F) -> Option<(usize, &'a str, O)>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
    A: Fn(&str, usize) -> bool,
{
    text.char_indices()
        .map(|(idx, _)| idx)
        .filter(|&idx| accept(text, idx))
        .find_map(|idx| {
            parser(&text[idx..])
                .ok()
                .map(|(rest, out)| (idx, rest, out))
        })
}
