//! # pgcypher: graph patterns over relational tables
//!
//! pgcypher translates a small graph query language into PostgreSQL that
//! runs against a property graph stored as a node table and an edge table,
//! each with a type column and a JSON property bag.
//!
//! ## Quick Example
//!
//! ```rust
//! use pgcypher::prelude::*;
//!
//! let query = pgcypher::translate(
//!     "MATCH (p:Product)-[:CATEGORY]->(c:ProductCategory) RETURN p.name",
//! )?;
//! let sql = query.to_sql();
//! assert!(sql.starts_with(r#"SELECT "p"."properties" ->> 'name' FROM "pgraf"."nodes" AS "p""#));
//!
//! // Or with every value lifted into a positional parameter
//! let rendered = query.to_parameterized();
//! assert_eq!(rendered.params.len(), 4);
//! # Ok::<(), CypherError>(())
//! ```
//!
//! ## Supported Syntax
//!
//! | Clause   | Form                                             |
//! |----------|--------------------------------------------------|
//! | `MATCH`  | `(a:Label {k: v})-[r:TYPE {k: v}]->(b)`, `<-[...]-` |
//! | `WHERE`  | one `var.prop op value`, op in `= != < <= > >=`  |
//! | `RETURN` | `var.prop`, `var`, `*`                           |
//!
//! Values are double-quoted strings, bare tokens or `$name` parameters.
//! Anything outside this subset is skipped, or rejected in strict mode.

pub mod ast;
pub mod config;
pub mod error;
pub mod fragment;
pub mod names;
pub mod parser;
pub mod preprocess;
pub mod schema;
pub mod translator;
pub mod transpiler;

pub mod prelude {
    pub use crate::ast::*;
    pub use crate::config::Config;
    pub use crate::error::*;
    pub use crate::fragment::{Fragment, GeneratedQuery, Param, ParameterizedQuery, ToSql};
    pub use crate::names::{NameGenerator, RandomNames, SequentialNames};
    pub use crate::schema::{GraphSchema, JsonOperator};
    pub use crate::translator::{ParsedQuery, Translator};
}

/// Translate a query against the default `pgraf` schema.
///
/// # Example
///
/// ```
/// use pgcypher::translate;
///
/// let query = translate("MATCH (p:Person) WHERE p.age > 30 RETURN p.name").unwrap();
/// assert_eq!(query.keyword_count("WHERE"), 1);
/// ```
pub fn translate(query: &str) -> Result<fragment::GeneratedQuery, error::CypherError> {
    translator::Translator::default().translate(query)
}
