//! Intermediate representation of a parsed graph query.
//!
//! Descriptors are produced by the parser for a single translation call and
//! consumed by the transpiler; nothing here outlives that call.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Ordered property map. Insertion order is preserved and a repeated key
/// overwrites the earlier value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Properties(Vec<(String, String)>);

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a raw literal under `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A parsed `(variable:Label {key: value})` element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDescriptor {
    /// Explicit variable, or a synthesized `anon_*` name.
    pub variable: String,
    pub label: Option<String>,
    pub properties: Properties,
}

/// Which way a relationship segment points, relative to pattern order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// `-[...]->`
    Outgoing,
    /// `<-[...]-`
    Incoming,
}

/// A parsed `-[variable:TYPE {key: value}]->` element bound to its neighbours.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipDescriptor {
    /// Synthetic identifier, unique within one translation.
    pub id: String,
    pub variable: Option<String>,
    pub rel_type: Option<String>,
    pub properties: Properties,
    pub direction: Direction,
    /// Variable of the node written before the segment.
    pub source: String,
    /// Variable of the node written after the segment.
    pub target: String,
}

impl RelationshipDescriptor {
    /// The alias used for the edge relation: the explicit variable, or
    /// `r_<source>_<target>`.
    pub fn alias(&self) -> String {
        match &self.variable {
            Some(var) => var.clone(),
            None => format!("r_{}_{}", self.source, self.target),
        }
    }
}

/// The structural graph shape of a MATCH clause.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pattern {
    /// Nodes in first-seen order; variables are unique.
    pub nodes: Vec<NodeDescriptor>,
    /// Relationships in encounter order.
    pub relationships: Vec<RelationshipDescriptor>,
}

impl Pattern {
    pub fn node(&self, variable: &str) -> Option<&NodeDescriptor> {
        self.nodes.iter().find(|n| n.variable == variable)
    }

    pub fn contains(&self, variable: &str) -> bool {
        self.node(variable).is_some()
    }

    /// The first-inserted node, which anchors FROM.
    pub fn base(&self) -> Option<&NodeDescriptor> {
        self.nodes.first()
    }

    /// Insert a node unless its variable is already bound. Returns whether
    /// the node was inserted.
    pub fn insert_node(&mut self, node: NodeDescriptor) -> bool {
        if self.contains(&node.variable) {
            return false;
        }
        self.nodes.push(node);
        true
    }
}

/// How a raw property literal is emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyValue {
    /// A double-quoted string with its quotes removed.
    Quoted(String),
    /// A `$name` parameter reference.
    Param(String),
    /// Any other token, passed through unchanged.
    Bare(String),
}

impl PropertyValue {
    /// Classify raw literal text. No numeric or boolean coercion happens.
    pub fn from_raw(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
            return Self::Quoted(raw[1..raw.len() - 1].to_string());
        }
        if let Some(name) = raw.strip_prefix('$') {
            if !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_') {
                return Self::Param(name.to_string());
            }
        }
        Self::Bare(raw.to_string())
    }
}

/// Comparison operators accepted in WHERE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
        };
        write!(f, "{}", op)
    }
}

/// A single `variable.property op literal` WHERE comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comparison {
    pub variable: String,
    pub property: String,
    pub op: CompareOp,
    pub value: PropertyValue,
}

/// One item of the RETURN list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReturnItem {
    /// `v.prop`
    Property { variable: String, property: String },
    /// `v`
    Variable(String),
    /// `*`
    Star,
}

impl fmt::Display for ReturnItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnItem::Property { variable, property } => write!(f, "{}.{}", variable, property),
            ReturnItem::Variable(v) => write!(f, "{}", v),
            ReturnItem::Star => write!(f, "*"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_properties_overwrite_in_place() {
        let mut props = Properties::new();
        props.insert("name", "\"a\"");
        props.insert("age", "3");
        props.insert("name", "\"b\"");
        let entries: Vec<_> = props.iter().collect();
        assert_eq!(entries, vec![("name", "\"b\""), ("age", "3")]);
    }

    #[test]
    fn test_property_value_classification() {
        assert_eq!(
            PropertyValue::from_raw("\"O'Brien\""),
            PropertyValue::Quoted("O'Brien".to_string())
        );
        assert_eq!(PropertyValue::from_raw("42"), PropertyValue::Bare("42".to_string()));
        assert_eq!(PropertyValue::from_raw("'x'"), PropertyValue::Bare("'x'".to_string()));
        assert_eq!(PropertyValue::from_raw("$name"), PropertyValue::Param("name".to_string()));
        assert_eq!(PropertyValue::from_raw("\""), PropertyValue::Bare("\"".to_string()));
    }

    #[test]
    fn test_relationship_alias() {
        let mut rel = RelationshipDescriptor {
            id: "rel_1".to_string(),
            variable: None,
            rel_type: Some("FRIEND".to_string()),
            properties: Properties::new(),
            direction: Direction::Outgoing,
            source: "a".to_string(),
            target: "b".to_string(),
        };
        assert_eq!(rel.alias(), "r_a_b");
        rel.variable = Some("f".to_string());
        assert_eq!(rel.alias(), "f");
    }

    #[test]
    fn test_pattern_keeps_first_seen_node() {
        let mut pattern = Pattern::default();
        assert!(pattern.insert_node(NodeDescriptor {
            variable: "a".to_string(),
            label: Some("Person".to_string()),
            properties: Properties::new(),
        }));
        assert!(!pattern.insert_node(NodeDescriptor {
            variable: "a".to_string(),
            label: None,
            properties: Properties::new(),
        }));
        assert_eq!(pattern.nodes.len(), 1);
        assert_eq!(pattern.base().and_then(|n| n.label.as_deref()), Some("Person"));
    }
}
