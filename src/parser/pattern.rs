//! MATCH pattern assembly.

use serde::Serialize;
use tracing::debug;

use super::descriptors::{parse_node, parse_relationship};
use super::find_unquoted;
use crate::ast::{NodeDescriptor, Pattern, RelationshipDescriptor};
use crate::error::{ClauseKind, CypherError, CypherResult};
use crate::names::NameGenerator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SegmentKind {
    Node,
    Relationship,
}

/// A slice of the MATCH clause. Node and relationship segments alternate,
/// starting and ending with a (possibly empty) node segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Segment<'a> {
    pub kind: SegmentKind,
    pub text: &'a str,
    /// Byte offset of `text` in the MATCH clause.
    pub offset: usize,
}

/// Split MATCH text at relationship segments (`-[...]->` and `<-[...]-`).
/// Text inside double quotes never starts or ends a segment.
pub fn split_segments(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut node_start = 0;
    let mut in_quotes = false;
    let mut idx = 0;

    while idx < text.len() {
        let rest = &text[idx..];
        let Some(ch) = rest.chars().next() else {
            break;
        };
        if ch == '"' {
            in_quotes = !in_quotes;
        } else if !in_quotes {
            if let Some(end) = relationship_end(text, idx) {
                push_node(&mut segments, text, node_start, idx);
                segments.push(Segment {
                    kind: SegmentKind::Relationship,
                    text: &text[idx..end],
                    offset: idx,
                });
                node_start = end;
                idx = end;
                continue;
            }
        }
        idx += ch.len_utf8();
    }
    push_node(&mut segments, text, node_start, text.len());
    segments
}

/// If a relationship segment starts at `idx`, return its end offset.
fn relationship_end(text: &str, idx: usize) -> Option<usize> {
    let rest = &text[idx..];
    let (open_len, closing) = if rest.starts_with("<-[") {
        (3, "-")
    } else if rest.starts_with("-[") {
        (2, "->")
    } else {
        return None;
    };
    let close = find_unquoted(text, idx + open_len, ']')?;
    text[close + 1..]
        .starts_with(closing)
        .then(|| close + 1 + closing.len())
}

fn push_node<'a>(segments: &mut Vec<Segment<'a>>, text: &'a str, start: usize, end: usize) {
    let raw = &text[start..end];
    let trimmed = raw.trim_start();
    let offset = start + (raw.len() - trimmed.len());
    segments.push(Segment {
        kind: SegmentKind::Node,
        text: trimmed.trim_end(),
        offset,
    });
}

/// Assemble a [`Pattern`] from a MATCH clause body.
///
/// Each node segment is parsed once. A relationship needs a current node
/// and a parsed node segment directly after it; otherwise it is dropped, or
/// reported when `strict` is set. Skipped node segments leave the cursor
/// where it was.
///
/// Only the first node and relationship targets enter the pattern, so every
/// node in the result is reachable from the base.
pub fn parse_pattern(
    match_clause: &str,
    names: &mut dyn NameGenerator,
    strict: bool,
) -> CypherResult<Pattern> {
    let segments = split_segments(match_clause);
    let parsed: Vec<Option<NodeDescriptor>> = segments
        .iter()
        .map(|seg| match seg.kind {
            SegmentKind::Node if !seg.text.is_empty() => parse_node(seg.text, names),
            _ => None,
        })
        .collect();

    let mut pattern = Pattern::default();
    let mut current: Option<String> = None;

    for (i, seg) in segments.iter().enumerate() {
        match seg.kind {
            SegmentKind::Node => match &parsed[i] {
                Some(node) if pattern.nodes.is_empty() => {
                    current = Some(node.variable.clone());
                    pattern.insert_node(node.clone());
                }
                Some(node) if pattern.contains(&node.variable) => {
                    current = Some(node.variable.clone());
                }
                Some(_) => {
                    skip(strict, seg.offset, "node is not connected to the pattern", seg.text)?;
                }
                None if !seg.text.is_empty() => {
                    skip(strict, seg.offset, "expected a node pattern", seg.text)?;
                }
                None => {}
            },
            SegmentKind::Relationship => {
                let Some(parts) = parse_relationship(seg.text) else {
                    skip(strict, seg.offset, "malformed relationship pattern", seg.text)?;
                    continue;
                };
                let Some(source) = current.clone() else {
                    skip(strict, seg.offset, "relationship has no preceding node", seg.text)?;
                    continue;
                };
                let Some(next) = parsed.get(i + 1).and_then(Option::as_ref) else {
                    skip(strict, seg.offset, "relationship has no following node", seg.text)?;
                    continue;
                };

                pattern.relationships.push(RelationshipDescriptor {
                    id: names.next_name("rel"),
                    variable: parts.variable,
                    rel_type: parts.rel_type,
                    properties: parts.properties,
                    direction: parts.direction,
                    source,
                    target: next.variable.clone(),
                });
                pattern.insert_node(next.clone());
            }
        }
    }

    Ok(pattern)
}

fn skip(strict: bool, offset: usize, reason: &str, text: &str) -> CypherResult<()> {
    if strict {
        return Err(CypherError::parse(
            ClauseKind::Match,
            offset,
            format!("{}: '{}'", reason, text),
        ));
    }
    debug!(offset, segment = text, "skipping MATCH segment: {}", reason);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Direction;
    use crate::names::SequentialNames;
    use pretty_assertions::assert_eq;

    fn pattern(text: &str) -> Pattern {
        parse_pattern(text, &mut SequentialNames::new(), false).unwrap()
    }

    fn variables(p: &Pattern) -> Vec<&str> {
        p.nodes.iter().map(|n| n.variable.as_str()).collect()
    }

    #[test]
    fn test_split_segments() {
        let segments = split_segments("(a)-[:R]->(b)<-[s]-(c)");
        let texts: Vec<_> = segments.iter().map(|s| (s.kind, s.text, s.offset)).collect();
        assert_eq!(
            texts,
            vec![
                (SegmentKind::Node, "(a)", 0),
                (SegmentKind::Relationship, "-[:R]->", 3),
                (SegmentKind::Node, "(b)", 10),
                (SegmentKind::Relationship, "<-[s]-", 13),
                (SegmentKind::Node, "(c)", 19),
            ]
        );
    }

    #[test]
    fn test_split_ignores_arrows_in_quotes() {
        let segments = split_segments(r#"(a {x: "-[:R]->"})"#);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].kind, SegmentKind::Node);
    }

    #[test]
    fn test_single_node_pattern() {
        let p = pattern("(p:Person)");
        assert_eq!(variables(&p), vec!["p"]);
        assert!(p.relationships.is_empty());
    }

    #[test]
    fn test_chain_pattern() {
        let p = pattern("(p:Person)-[:FRIEND]->(f:Person)-[:LIVES_IN]->(c:City)");
        assert_eq!(variables(&p), vec!["p", "f", "c"]);
        assert_eq!(p.relationships.len(), 2);
        assert_eq!(p.relationships[0].source, "p");
        assert_eq!(p.relationships[0].target, "f");
        assert_eq!(p.relationships[1].source, "f");
        assert_eq!(p.relationships[1].target, "c");
        assert_eq!(p.relationships[1].rel_type.as_deref(), Some("LIVES_IN"));
    }

    #[test]
    fn test_incoming_pattern() {
        let p = pattern("(c:City)<-[:LIVES_IN]-(p:Person)");
        assert_eq!(variables(&p), vec!["c", "p"]);
        let rel = &p.relationships[0];
        assert_eq!(rel.direction, Direction::Incoming);
        assert_eq!(rel.source, "c");
        assert_eq!(rel.target, "p");
    }

    #[test]
    fn test_anonymous_target_is_parsed_once() {
        let p = pattern("(a)-[:KNOWS]->()-[:KNOWS]->(b)");
        assert_eq!(variables(&p), vec!["a", "anon_1", "b"]);
        assert_eq!(p.relationships[0].target, "anon_1");
        assert_eq!(p.relationships[1].source, "anon_1");
    }

    #[test]
    fn test_repeated_variable_keeps_first_descriptor() {
        let p = pattern("(a:Person)-[:KNOWS]->(b)-[:KNOWS]->(a)");
        assert_eq!(variables(&p), vec!["a", "b"]);
        assert_eq!(p.relationships.len(), 2);
        assert_eq!(p.relationships[1].target, "a");
        assert_eq!(p.node("a").and_then(|n| n.label.as_deref()), Some("Person"));
    }

    #[test]
    fn test_dangling_relationships_are_dropped() {
        let p = pattern("-[:R]->(a)-[:S]->");
        assert_eq!(variables(&p), vec!["a"]);
        assert!(p.relationships.is_empty());
    }

    #[test]
    fn test_unparseable_node_keeps_cursor() {
        let p = pattern("(a)-[:R]->junk-[:S]->(c)");
        assert_eq!(variables(&p), vec!["a", "c"]);
        assert_eq!(p.relationships.len(), 1);
        let rel = &p.relationships[0];
        assert_eq!((rel.source.as_str(), rel.target.as_str()), ("a", "c"));
        assert_eq!(rel.rel_type.as_deref(), Some("S"));
    }

    #[test]
    fn test_disconnected_node_is_left_out() {
        let p = pattern("(a)-[x y]->(b)");
        assert_eq!(variables(&p), vec!["a"]);
        assert!(p.relationships.is_empty());

        let p = pattern("(a)-[x y]->(b)-[:S]->(c)");
        assert_eq!(variables(&p), vec!["a", "c"]);
        assert_eq!(p.relationships[0].source, "a");

        assert!(parse_pattern("(a)-[x y]->(b)", &mut SequentialNames::new(), true).is_err());
    }

    #[test]
    fn test_strict_reports_skips() {
        let err = parse_pattern("(a)-[:R]->junk", &mut SequentialNames::new(), true).unwrap_err();
        match err {
            CypherError::Parse { clause, position, .. } => {
                assert_eq!(clause, ClauseKind::Match);
                assert_eq!(position, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(parse_pattern("-[:R]->(a)", &mut SequentialNames::new(), true).is_err());
        assert!(parse_pattern("(a)-[:R]->(b)", &mut SequentialNames::new(), true).is_ok());
    }
}
