//! Translation entry point: text in, fragments out.

use serde::Serialize;
use tracing::trace;

use crate::ast::Pattern;
use crate::error::{ClauseKind, CypherError, CypherResult};
use crate::fragment::GeneratedQuery;
use crate::names::{NameGenerator, RandomNames};
use crate::parser::parse_pattern;
use crate::preprocess::{extract_clauses, preprocess};
use crate::schema::GraphSchema;
use crate::transpiler::Transpiler;

/// A query after the front end: normalized text, clause bodies and the
/// assembled pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedQuery {
    pub normalized: String,
    pub match_clause: String,
    pub where_clause: String,
    pub return_clause: String,
    pub pattern: Pattern,
}

/// Translates graph queries into SQL for one target schema.
///
/// ```
/// use pgcypher::prelude::*;
///
/// let translator = Translator::new(GraphSchema::default());
/// let query = translator.translate("MATCH (p:Person) RETURN p.name").unwrap();
/// assert_eq!(query.keyword_count("JOIN"), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Translator {
    schema: GraphSchema,
    strict: bool,
}

impl Translator {
    pub fn new(schema: GraphSchema) -> Self {
        Self {
            schema,
            strict: false,
        }
    }

    /// Turn best-effort skipping into errors.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn schema(&self) -> &GraphSchema {
        &self.schema
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Translate with random anonymous names.
    pub fn translate(&self, query: &str) -> CypherResult<GeneratedQuery> {
        self.translate_with(query, &mut RandomNames::new())
    }

    /// Translate with anonymous names drawn from `names`.
    pub fn translate_with(
        &self,
        query: &str,
        names: &mut dyn NameGenerator,
    ) -> CypherResult<GeneratedQuery> {
        let parsed = self.parse_with(query, names)?;
        let generated = Transpiler::new(&self.schema)
            .strict(self.strict)
            .generate(&parsed.pattern, &parsed.where_clause, &parsed.return_clause)?;
        trace!(sql = %generated, "generated query");
        Ok(generated)
    }

    /// Run the front end only.
    pub fn parse(&self, query: &str) -> CypherResult<ParsedQuery> {
        self.parse_with(query, &mut RandomNames::new())
    }

    pub fn parse_with(&self, query: &str, names: &mut dyn NameGenerator) -> CypherResult<ParsedQuery> {
        let normalized = preprocess(query);
        let clauses = extract_clauses(&normalized);

        if clauses.match_clause.is_empty() {
            return Err(CypherError::MissingClause(ClauseKind::Match));
        }
        if clauses.return_clause.is_empty() {
            return Err(CypherError::MissingClause(ClauseKind::Return));
        }
        trace!(?clauses, "extracted clauses");

        let pattern = parse_pattern(clauses.match_clause, names, self.strict)?;
        if pattern.nodes.is_empty() {
            return Err(CypherError::EmptyPattern);
        }

        Ok(ParsedQuery {
            match_clause: clauses.match_clause.to_string(),
            where_clause: clauses.where_clause.to_string(),
            return_clause: clauses.return_clause.to_string(),
            pattern,
            normalized,
        })
    }
}
