//! Node and relationship descriptor parsers.

use nom::{
    character::complete::{char, multispace0},
    combinator::opt,
    error::{Error, ErrorKind},
    sequence::{delimited, pair, preceded},
    IResult,
};

use super::{find_unquoted, identifier, search, split_top_level};
use crate::ast::{Direction, NodeDescriptor, Properties};
use crate::names::NameGenerator;

/// The pieces shared by node and relationship bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ElementParts<'a> {
    variable: Option<&'a str>,
    label: Option<&'a str>,
    properties: Option<&'a str>,
}

/// A relationship segment before it is bound to its neighbouring nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipParts {
    pub variable: Option<String>,
    pub rel_type: Option<String>,
    pub properties: Properties,
    pub direction: Direction,
}

/// Parse the first node shape found in `segment`.
///
/// Returns `None` if no `( ... )` in the segment has node shape. An omitted
/// variable is replaced by a fresh `anon_*` name from `names`.
pub fn parse_node(segment: &str, names: &mut dyn NameGenerator) -> Option<NodeDescriptor> {
    let (_, _, parts) = search(segment, |text, idx| text[idx..].starts_with('('), node_shape)?;

    let variable = match parts.variable {
        Some(var) => var.to_string(),
        None => names.next_name("anon"),
    };

    Some(NodeDescriptor {
        variable,
        label: parts.label.map(str::to_string),
        properties: parts.properties.map(parse_properties).unwrap_or_default(),
    })
}

/// Parse a `-[...]->` or `<-[...]-` segment.
///
/// A leading `<` makes the relationship incoming.
pub fn parse_relationship(segment: &str) -> Option<RelationshipParts> {
    let segment = segment.trim();
    let (_, _, parts) = search(segment, |text, idx| text[idx..].starts_with('['), relationship_shape)?;

    let direction = if segment.starts_with('<') {
        Direction::Incoming
    } else {
        Direction::Outgoing
    };

    Some(RelationshipParts {
        variable: parts.variable.map(str::to_string),
        rel_type: parts.label.map(str::to_string),
        properties: parts.properties.map(parse_properties).unwrap_or_default(),
        direction,
    })
}

/// Build a property map from a brace body: top-level commas separate
/// entries, the first colon separates key from value. Entries without a
/// colon or with an empty key are ignored.
pub fn parse_properties(body: &str) -> Properties {
    let mut properties = Properties::new();
    for (_, entry) in split_top_level(body, ',') {
        if let Some((key, value)) = entry.split_once(':') {
            let key = key.trim();
            if !key.is_empty() {
                properties.insert(key, value.trim());
            }
        }
    }
    properties
}

fn node_shape(input: &str) -> IResult<&str, ElementParts<'_>> {
    delimited(char('('), element_body, preceded(multispace0, char(')')))(input)
}

fn relationship_shape(input: &str) -> IResult<&str, ElementParts<'_>> {
    delimited(char('['), element_body, preceded(multispace0, char(']')))(input)
}

fn element_body(input: &str) -> IResult<&str, ElementParts<'_>> {
    let (input, _) = multispace0(input)?;
    let (input, variable) = opt(identifier)(input)?;
    let (input, _) = multispace0(input)?;
    let (input, label) = opt(preceded(pair(char(':'), multispace0), identifier))(input)?;
    let (input, _) = multispace0(input)?;
    let (input, properties) = opt(brace_body)(input)?;

    Ok((
        input,
        ElementParts {
            variable,
            label,
            properties,
        },
    ))
}

/// Parse `{ ... }` and return the text between the braces. A `}` inside a
/// double-quoted value does not close the body.
fn brace_body(input: &str) -> IResult<&str, &str> {
    let (body_input, _) = char('{')(input)?;
    match find_unquoted(body_input, 0, '}') {
        Some(end) => Ok((&body_input[end + 1..], &body_input[..end])),
        None => Err(nom::Err::Error(Error::new(input, ErrorKind::Char))),
    }
}
