//! WHERE comparison and RETURN item parsers.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{char, multispace0},
    combinator::{map, value},
    sequence::separated_pair,
    IResult,
};

use super::{identifier, quoted, search, split_top_level};
use crate::ast::{CompareOp, Comparison, PropertyValue, ReturnItem};
use crate::preprocess::is_word_char;

/// The comparison found in a WHERE clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhereMatch<'a> {
    pub comparison: Comparison,
    /// Byte offset of the comparison in the clause.
    pub offset: usize,
    /// Text before the comparison, trimmed.
    pub leading: &'a str,
    /// Text after the comparison, trimmed.
    pub trailing: &'a str,
}

impl WhereMatch<'_> {
    /// Whether the clause consisted of nothing but the comparison.
    pub fn is_exact(&self) -> bool {
        self.leading.is_empty() && self.trailing.is_empty()
    }
}

/// Locate the first `variable.property op literal` comparison in `text`.
pub fn parse_where(text: &str) -> Option<WhereMatch<'_>> {
    let (offset, rest, comparison) = search(text, starts_word, comparison_expr)?;
    Some(WhereMatch {
        comparison,
        offset,
        leading: text[..offset].trim(),
        trailing: rest.trim(),
    })
}

/// One comma-separated entry of a RETURN clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnEntry<'a> {
    /// Byte offset of the entry in the clause.
    pub offset: usize,
    pub text: &'a str,
    /// The recognized item, if the entry starts with one.
    pub item: Option<ReturnItem>,
    /// Text following the recognized item (aliases and the like).
    pub trailing: &'a str,
}

/// Split a RETURN clause on top-level commas and recognize each item.
pub fn parse_return(text: &str) -> Vec<ReturnEntry<'_>> {
    split_top_level(text, ',')
        .into_iter()
        .map(|(offset, raw)| {
            let trimmed = raw.trim_start();
            let offset = offset + (raw.len() - trimmed.len());
            let entry = trimmed.trim_end();
            match return_item(entry) {
                Ok((rest, item)) => ReturnEntry {
                    offset,
                    text: entry,
                    item: Some(item),
                    trailing: rest.trim(),
                },
                Err(_) => ReturnEntry {
                    offset,
                    text: entry,
                    item: None,
                    trailing: "",
                },
            }
        })
        .collect()
}

fn starts_word(text: &str, idx: usize) -> bool {
    let at_word = text[idx..].chars().next().is_some_and(is_word_char);
    let after_word = text[..idx].chars().next_back().is_some_and(is_word_char);
    at_word && !after_word
}

fn comparison_expr(input: &str) -> IResult<&str, Comparison> {
    let (input, (variable, property)) = property_ref(input)?;
    let (input, _) = multispace0(input)?;
    let (input, op) = compare_op(input)?;
    let (input, _) = multispace0(input)?;
    let (input, raw) = alt((quoted, bare_value))(input)?;

    Ok((
        input,
        Comparison {
            variable: variable.to_string(),
            property: property.to_string(),
            op,
            value: PropertyValue::from_raw(raw),
        },
    ))
}

fn property_ref(input: &str) -> IResult<&str, (&str, &str)> {
    separated_pair(identifier, char('.'), identifier)(input)
}

fn compare_op(input: &str) -> IResult<&str, CompareOp> {
    alt((
        value(CompareOp::Lte, tag("<=")),
        value(CompareOp::Gte, tag(">=")),
        value(CompareOp::Ne, tag("!=")),
        value(CompareOp::Lt, char('<')),
        value(CompareOp::Gt, char('>')),
        value(CompareOp::Eq, char('=')),
    ))(input)
}

fn bare_value(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| !c.is_whitespace() && c != ',')(input)
}

fn return_item(input: &str) -> IResult<&str, ReturnItem> {
    alt((property_item, value(ReturnItem::Star, char('*')), variable_item))(input)
}

fn property_item(input: &str) -> IResult<&str, ReturnItem> {
    map(property_ref, |(variable, property)| ReturnItem::Property {
        variable: variable.to_string(),
        property: property.to_string(),
    })(input)
}

fn variable_item(input: &str) -> IResult<&str, ReturnItem> {
    map(identifier, |v| ReturnItem::Variable(v.to_string()))(input)
}
