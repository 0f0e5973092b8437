//! Generated query fragments and their SQL renderings.
//!
//! A [`GeneratedQuery`] keeps trusted SQL text, identifiers, literals and
//! parameter placeholders apart until render time. Identifiers are always
//! double-quoted and literals always single-quoted with their quotes doubled,
//! so text taken from a query can never change the shape of the SQL.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One piece of generated SQL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Fragment {
    /// Trusted SQL text: keywords, operators, punctuation, spacing.
    Keyword(String),
    /// A possibly qualified name, one entry per dotted part.
    Identifier(Vec<String>),
    /// A string value.
    Literal(String),
    /// A named query parameter.
    Placeholder(String),
}

/// Positional parameter produced by [`GeneratedQuery::to_parameterized`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Param {
    /// A literal value lifted out of the SQL text.
    Value(String),
    /// A named parameter the caller has to supply.
    Named(String),
}

/// SQL text with `$n` placeholders and the values they stand for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterizedQuery {
    pub sql: String,
    /// `params[0]` binds `$1`.
    pub params: Vec<Param>,
}

/// Trait for rendering generated fragments as inline SQL.
pub trait ToSql {
    /// Render with literals inlined and named placeholders numbered `$n`.
    fn to_sql(&self) -> String;
}

/// Ordered fragment sequence of one translated query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedQuery {
    fragments: Vec<Fragment>,
}

impl GeneratedQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn keyword(&mut self, sql: impl Into<String>) -> &mut Self {
        self.fragments.push(Fragment::Keyword(sql.into()));
        self
    }

    pub fn ident(&mut self, name: impl Into<String>) -> &mut Self {
        self.fragments.push(Fragment::Identifier(vec![name.into()]));
        self
    }

    /// Push `"a"."b"` style qualified name.
    pub fn qualified<I, S>(&mut self, parts: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fragments
            .push(Fragment::Identifier(parts.into_iter().map(Into::into).collect()));
        self
    }

    pub fn literal(&mut self, value: impl Into<String>) -> &mut Self {
        self.fragments.push(Fragment::Literal(value.into()));
        self
    }

    pub fn placeholder(&mut self, name: impl Into<String>) -> &mut Self {
        self.fragments.push(Fragment::Placeholder(name.into()));
        self
    }

    /// Move all fragments of `other` to the end of this query.
    pub fn append(&mut self, other: GeneratedQuery) -> &mut Self {
        self.fragments.extend(other.fragments);
        self
    }

    /// Append `parts` separated by the keyword `separator`.
    pub fn join(&mut self, parts: Vec<GeneratedQuery>, separator: &str) -> &mut Self {
        for (i, part) in parts.into_iter().enumerate() {
            if i > 0 {
                self.keyword(separator);
            }
            self.append(part);
        }
        self
    }

    /// Number of keyword fragments whose trimmed text equals `keyword`.
    pub fn keyword_count(&self, keyword: &str) -> usize {
        self.fragments
            .iter()
            .filter(|f| matches!(f, Fragment::Keyword(k) if k.trim() == keyword))
            .count()
    }

    /// All literal values, in order.
    pub fn literals(&self) -> impl Iterator<Item = &str> {
        self.fragments.iter().filter_map(|f| match f {
            Fragment::Literal(v) => Some(v.as_str()),
            _ => None,
        })
    }

    /// Distinct placeholder names, in order of first appearance.
    pub fn placeholders(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for f in &self.fragments {
            if let Fragment::Placeholder(name) = f {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Render every literal and placeholder as a positional `$n` parameter.
    /// Literals each get their own position; a repeated placeholder name
    /// reuses its first position.
    pub fn to_parameterized(&self) -> ParameterizedQuery {
        let mut sql = String::new();
        let mut params: Vec<Param> = Vec::new();

        for f in &self.fragments {
            match f {
                Fragment::Keyword(k) => sql.push_str(k),
                Fragment::Identifier(parts) => sql.push_str(&quote_identifier(parts)),
                Fragment::Literal(v) => {
                    params.push(Param::Value(v.clone()));
                    sql.push_str(&format!("${}", params.len()));
                }
                Fragment::Placeholder(name) => {
                    let existing = params
                        .iter()
                        .position(|p| matches!(p, Param::Named(n) if n == name));
                    let index = match existing {
                        Some(i) => i + 1,
                        None => {
                            params.push(Param::Named(name.clone()));
                            params.len()
                        }
                    };
                    sql.push_str(&format!("${}", index));
                }
            }
        }

        ParameterizedQuery { sql, params }
    }
}

impl ToSql for GeneratedQuery {
    fn to_sql(&self) -> String {
        let names = self.placeholders();
        let mut sql = String::new();
        for f in &self.fragments {
            match f {
                Fragment::Keyword(k) => sql.push_str(k),
                Fragment::Identifier(parts) => sql.push_str(&quote_identifier(parts)),
                Fragment::Literal(v) => sql.push_str(&quote_literal(v)),
                Fragment::Placeholder(name) => {
                    let index = names.iter().position(|n| n == name).unwrap_or(0) + 1;
                    sql.push_str(&format!("${}", index));
                }
            }
        }
        sql
    }
}

impl fmt::Display for GeneratedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_sql())
    }
}

/// Double-quote each part of a name, doubling embedded quotes.
pub fn quote_identifier<S: AsRef<str>>(parts: &[S]) -> String {
    parts
        .iter()
        .map(|part| format!("\"{}\"", part.as_ref().replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(".")
}

/// Single-quote a string value, doubling embedded quotes.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
