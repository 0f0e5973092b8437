//! SQL generation for parsed graph patterns.
//!
//! The first node of the pattern becomes the base relation; every
//! relationship joins the edge table and, the first time a node shows up as
//! a relationship target, the node table for that node:
//!
//! ```text
//! MATCH (p:Product)-[:CATEGORY]->(l:ProductCategory) RETURN p.name
//!
//! SELECT "p"."properties" ->> 'name'
//!   FROM "pgraf"."nodes" AS "p"
//!   JOIN "pgraf"."edges" AS "r_p_l" ON ("p"."id" = "r_p_l"."source" AND "r_p_l"."label" = 'CATEGORY')
//!   JOIN "pgraf"."nodes" AS "l" ON "r_p_l"."target" = "l"."id"
//!  WHERE "p"."type" = 'Product' AND "l"."type" = 'ProductCategory'
//! ```
//!
//! The link from an edge to a newly joined node sits on that node's join, so
//! every ON clause only references aliases already in scope.

use tracing::debug;

use crate::ast::{Comparison, Direction, NodeDescriptor, Pattern, Properties, PropertyValue, ReturnItem};
use crate::error::{ClauseKind, CypherError, CypherResult};
use crate::fragment::GeneratedQuery;
use crate::parser::{parse_return, parse_where};
use crate::schema::{GraphSchema, JsonOperator};

/// Generates a [`GeneratedQuery`] for one schema.
#[derive(Debug, Clone, Copy)]
pub struct Transpiler<'s> {
    schema: &'s GraphSchema,
    strict: bool,
}

impl<'s> Transpiler<'s> {
    pub fn new(schema: &'s GraphSchema) -> Self {
        Self {
            schema,
            strict: false,
        }
    }

    /// Report skipped WHERE and RETURN text as errors instead of ignoring it.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Build SELECT, FROM, JOINs and WHERE, in that order.
    pub fn generate(
        &self,
        pattern: &Pattern,
        where_clause: &str,
        return_clause: &str,
    ) -> CypherResult<GeneratedQuery> {
        let base = pattern.base().ok_or(CypherError::EmptyPattern)?;

        let mut query = GeneratedQuery::new();
        query.keyword("SELECT ");
        query.join(self.projection(pattern, return_clause)?, ", ");

        query
            .keyword(" FROM ")
            .qualified(self.schema.node_table_path())
            .keyword(" AS ")
            .ident(&base.variable);

        let mut conditions = self.node_filters(base);
        let mut joined: Vec<&str> = vec![base.variable.as_str()];

        for rel in &pattern.relationships {
            let alias = rel.alias();
            let (current_col, next_col) = match rel.direction {
                Direction::Outgoing => (&self.schema.source_column, &self.schema.target_column),
                Direction::Incoming => (&self.schema.target_column, &self.schema.source_column),
            };
            let next_is_new = !joined.contains(&rel.target.as_str());

            let mut on = vec![self.id_binding(&rel.source, &alias, current_col)];
            if let Some(rel_type) = &rel.rel_type {
                on.push(self.equals_literal(&alias, &self.schema.edge_type_column, rel_type));
            }
            on.extend(self.property_filters(&alias, &rel.properties));
            if !next_is_new {
                on.push(self.edge_binding(&alias, next_col, &rel.target));
            }

            query
                .keyword(" JOIN ")
                .qualified(self.schema.edge_table_path())
                .keyword(" AS ")
                .ident(&alias)
                .keyword(" ON (");
            query.join(on, " AND ").keyword(")");

            // The edge-to-node binding goes on the node join so ON only names joined aliases.
            if next_is_new {
                query
                    .keyword(" JOIN ")
                    .qualified(self.schema.node_table_path())
                    .keyword(" AS ")
                    .ident(&rel.target)
                    .keyword(" ON ")
                    .append(self.edge_binding(&alias, next_col, &rel.target));

                if let Some(target) = pattern.node(&rel.target) {
                    conditions.extend(self.node_filters(target));
                }
                joined.push(&rel.target);
            }
        }

        if let Some(condition) = self.where_condition(pattern, where_clause)? {
            conditions.push(condition);
        }

        if !conditions.is_empty() {
            query.keyword(" WHERE ");
            query.join(conditions, " AND ");
        }

        Ok(query)
    }

    fn projection(&self, pattern: &Pattern, return_clause: &str) -> CypherResult<Vec<GeneratedQuery>> {
        let mut items = Vec::new();

        for entry in parse_return(return_clause) {
            let Some(item) = entry.item else {
                self.skip(ClauseKind::Return, entry.offset, "unsupported RETURN item", entry.text)?;
                continue;
            };
            if !entry.trailing.is_empty() {
                self.skip(ClauseKind::Return, entry.offset, "unsupported text after RETURN item", entry.text)?;
                // A property read still projects; `v AS x` and `* ...` do not.
                if !matches!(item, ReturnItem::Property { .. }) {
                    continue;
                }
            }

            match item {
                ReturnItem::Property { variable, property } => {
                    if pattern.contains(&variable) {
                        items.push(self.json_read(&variable, &property, self.schema.json_operator));
                    } else {
                        self.unknown(ClauseKind::Return, &variable)?;
                    }
                }
                ReturnItem::Variable(variable) => {
                    if pattern.contains(&variable) {
                        items.push(all_columns(&variable));
                    } else {
                        self.unknown(ClauseKind::Return, &variable)?;
                    }
                }
                ReturnItem::Star => {
                    items.extend(pattern.nodes.iter().map(|n| all_columns(&n.variable)));
                }
            }
        }

        if items.is_empty() {
            debug!("no RETURN item recognized, projecting every node");
            items.extend(pattern.nodes.iter().map(|n| all_columns(&n.variable)));
        }
        Ok(items)
    }

    fn where_condition(&self, pattern: &Pattern, where_clause: &str) -> CypherResult<Option<GeneratedQuery>> {
        if where_clause.is_empty() {
            return Ok(None);
        }
        let Some(found) = parse_where(where_clause) else {
            self.skip(ClauseKind::Where, 0, "expected `variable.property op value`", where_clause)?;
            return Ok(None);
        };
        if !found.is_exact() {
            self.skip(
                ClauseKind::Where,
                found.offset,
                "only a single comparison is supported",
                where_clause,
            )?;
        }

        let Comparison {
            variable,
            property,
            op,
            value,
        } = found.comparison;
        if !pattern.contains(&variable) {
            self.unknown(ClauseKind::Where, &variable)?;
            return Ok(None);
        }

        let mut condition = GeneratedQuery::new();
        condition
            .keyword("(")
            .append(self.json_read(&variable, &property, JsonOperator::Text))
            .keyword(format!(") {} ", op))
            .append(value_fragment(&value));
        Ok(Some(condition))
    }

    /// Label and property filters of a node.
    fn node_filters(&self, node: &NodeDescriptor) -> Vec<GeneratedQuery> {
        let mut filters = Vec::new();
        if let Some(label) = &node.label {
            filters.push(self.equals_literal(&node.variable, &self.schema.node_type_column, label));
        }
        filters.extend(self.property_filters(&node.variable, &node.properties));
        filters
    }

    fn property_filters(&self, alias: &str, properties: &Properties) -> Vec<GeneratedQuery> {
        properties
            .iter()
            .map(|(key, raw)| {
                let mut filter = self.json_read(alias, key, JsonOperator::Text);
                filter
                    .keyword(" = ")
                    .append(value_fragment(&PropertyValue::from_raw(raw)));
                filter
            })
            .collect()
    }

    /// `"alias"."properties" <operator> 'key'`. Filters compare against text
    /// values and always pass [`JsonOperator::Text`].
    fn json_read(&self, alias: &str, key: &str, operator: JsonOperator) -> GeneratedQuery {
        let mut read = GeneratedQuery::new();
        read.qualified([alias, self.schema.properties_column.as_str()])
            .keyword(format!(" {} ", operator))
            .literal(key);
        read
    }

    /// `"alias"."column" = 'value'`
    fn equals_literal(&self, alias: &str, column: &str, value: &str) -> GeneratedQuery {
        let mut filter = GeneratedQuery::new();
        filter.qualified([alias, column]).keyword(" = ").literal(value);
        filter
    }

    /// `"node"."id" = "edge"."column"`
    fn id_binding(&self, node: &str, edge: &str, column: &str) -> GeneratedQuery {
        let mut binding = GeneratedQuery::new();
        binding
            .qualified([node, self.schema.id_column.as_str()])
            .keyword(" = ")
            .qualified([edge, column]);
        binding
    }

    /// `"edge"."column" = "node"."id"`
    fn edge_binding(&self, edge: &str, column: &str, node: &str) -> GeneratedQuery {
        let mut binding = GeneratedQuery::new();
        binding
            .qualified([edge, column])
            .keyword(" = ")
            .qualified([node, self.schema.id_column.as_str()]);
        binding
    }

    fn skip(&self, clause: ClauseKind, offset: usize, reason: &str, text: &str) -> CypherResult<()> {
        if self.strict {
            return Err(CypherError::parse(clause, offset, format!("{}: '{}'", reason, text)));
        }
        debug!(%clause, offset, text, "skipping: {}", reason);
        Ok(())
    }

    fn unknown(&self, clause: ClauseKind, variable: &str) -> CypherResult<()> {
        if self.strict {
            return Err(CypherError::unknown(clause, variable));
        }
        debug!(%clause, variable, "skipping reference to unknown variable");
        Ok(())
    }
}

/// `"alias".*`
fn all_columns(alias: &str) -> GeneratedQuery {
    let mut cols = GeneratedQuery::new();
    cols.ident(alias).keyword(".*");
    cols
}

fn value_fragment(value: &PropertyValue) -> GeneratedQuery {
    let mut fragment = GeneratedQuery::new();
    match value {
        PropertyValue::Quoted(s) | PropertyValue::Bare(s) => fragment.literal(s.as_str()),
        PropertyValue::Param(name) => fragment.placeholder(name.as_str()),
    };
    fragment
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::{Fragment, ToSql};
    use crate::names::SequentialNames;
    use crate::parser::parse_pattern;
    use pretty_assertions::assert_eq;

    fn sql(match_clause: &str, where_clause: &str, return_clause: &str) -> String {
        let schema = GraphSchema::default();
        let pattern = parse_pattern(match_clause, &mut SequentialNames::new(), false).unwrap();
        Transpiler::new(&schema)
            .generate(&pattern, where_clause, return_clause)
            .unwrap()
            .to_sql()
    }

    #[test]
    fn test_single_node() {
        assert_eq!(
            sql("(p:Person)", "", "p.name"),
            r#"SELECT "p"."properties" ->> 'name' FROM "pgraf"."nodes" AS "p" WHERE "p"."type" = 'Person'"#
        );
    }

    #[test]
    fn test_base_properties() {
        assert_eq!(
            sql(r#"(p {name: "O'Brien", age: 42})"#, "", "p"),
            concat!(
                r#"SELECT "p".* FROM "pgraf"."nodes" AS "p" "#,
                r#"WHERE "p"."properties" ->> 'name' = 'O''Brien' AND "p"."properties" ->> 'age' = '42'"#
            )
        );
    }

    #[test]
    fn test_outgoing_join() {
        assert_eq!(
            sql("(p:Product)-[:CATEGORY]->(l:ProductCategory)", "", "p.name"),
            concat!(
                r#"SELECT "p"."properties" ->> 'name' FROM "pgraf"."nodes" AS "p" "#,
                r#"JOIN "pgraf"."edges" AS "r_p_l" ON ("p"."id" = "r_p_l"."source" AND "r_p_l"."label" = 'CATEGORY') "#,
                r#"JOIN "pgraf"."nodes" AS "l" ON "r_p_l"."target" = "l"."id" "#,
                r#"WHERE "p"."type" = 'Product' AND "l"."type" = 'ProductCategory'"#
            )
        );
    }

    #[test]
    fn test_incoming_join() {
        assert_eq!(
            sql("(c:City)<-[r:LIVES_IN]-(p)", "", "p"),
            concat!(
                r#"SELECT "p".* FROM "pgraf"."nodes" AS "c" "#,
                r#"JOIN "pgraf"."edges" AS "r" ON ("c"."id" = "r"."target" AND "r"."label" = 'LIVES_IN') "#,
                r#"JOIN "pgraf"."nodes" AS "p" ON "r"."source" = "p"."id" "#,
                r#"WHERE "c"."type" = 'City'"#
            )
        );
    }

    #[test]
    fn test_cycle_binds_both_ends_on_edge() {
        assert_eq!(
            sql("(a)-[:KNOWS]->(b)-[:KNOWS]->(a)", "", "a"),
            concat!(
                r#"SELECT "a".* FROM "pgraf"."nodes" AS "a" "#,
                r#"JOIN "pgraf"."edges" AS "r_a_b" ON ("a"."id" = "r_a_b"."source" AND "r_a_b"."label" = 'KNOWS') "#,
                r#"JOIN "pgraf"."nodes" AS "b" ON "r_a_b"."target" = "b"."id" "#,
                r#"JOIN "pgraf"."edges" AS "r_b_a" ON ("b"."id" = "r_b_a"."source" AND "r_b_a"."label" = 'KNOWS' AND "r_b_a"."target" = "a"."id")"#
            )
        );
    }

    #[test]
    fn test_relationship_properties_filter_edge() {
        assert_eq!(
            sql("(a)-[e {since: 2020}]->(b)", "", "b"),
            concat!(
                r#"SELECT "b".* FROM "pgraf"."nodes" AS "a" "#,
                r#"JOIN "pgraf"."edges" AS "e" ON ("a"."id" = "e"."source" AND "e"."properties" ->> 'since' = '2020') "#,
                r#"JOIN "pgraf"."nodes" AS "b" ON "e"."target" = "b"."id""#
            )
        );
    }

    #[test]
    fn test_where_comparison() {
        assert_eq!(
            sql("(p:Person)", "p.age > 30", "p.name, p.age"),
            concat!(
                r#"SELECT "p"."properties" ->> 'name', "p"."properties" ->> 'age' FROM "pgraf"."nodes" AS "p" "#,
                r#"WHERE "p"."type" = 'Person' AND ("p"."properties" ->> 'age') > '30'"#
            )
        );
    }

    #[test]
    fn test_where_unknown_variable_is_ignored() {
        assert_eq!(
            sql("(p)", "q.age > 30", "p"),
            r#"SELECT "p".* FROM "pgraf"."nodes" AS "p""#
        );
        assert_eq!(sql("(p)", "whatever", "p"), r#"SELECT "p".* FROM "pgraf"."nodes" AS "p""#);
    }

    #[test]
    fn test_where_parameter() {
        assert_eq!(
            sql("(p)", "p.name = $name", "p"),
            r#"SELECT "p".* FROM "pgraf"."nodes" AS "p" WHERE ("p"."properties" ->> 'name') = $1"#
        );
    }

    #[test]
    fn test_star_and_default_projection() {
        let star = sql("(a)-[:R]->(b)", "", "*");
        assert!(star.starts_with(r#"SELECT "a".*, "b".* FROM"#));
        let fallback = sql("(a)-[:R]->(b)", "", "zzz.name");
        assert!(fallback.starts_with(r#"SELECT "a".*, "b".* FROM"#));
    }

    #[test]
    fn test_unknown_return_items_are_dropped() {
        assert!(sql("(a)-[:R]->(b)", "", "b.name, x.name").starts_with(r#"SELECT "b"."properties" ->> 'name' FROM"#));
    }

    #[test]
    fn test_fragments_keep_values_out_of_keywords() {
        let schema = GraphSchema::default();
        let pattern = parse_pattern(r#"(p:Person {name: "x' OR '1'='1"})"#, &mut SequentialNames::new(), false).unwrap();
        let query = Transpiler::new(&schema).generate(&pattern, "", "p").unwrap();
        assert!(query.fragments().contains(&Fragment::Literal("x' OR '1'='1".to_string())));
        assert!(query.fragments().iter().all(|f| match f {
            Fragment::Keyword(k) => !k.contains('\''),
            _ => true,
        }));
    }

    #[test]
    fn test_custom_schema() {
        let schema = GraphSchema {
            node_table: "vertices".to_string(),
            edge_table: "g.links".to_string(),
            node_type_column: "kind".to_string(),
            json_operator: JsonOperator::Json,
            ..GraphSchema::default()
        };
        let pattern = parse_pattern("(a:User)-[:OWNS]->(b)", &mut SequentialNames::new(), false).unwrap();
        let query = Transpiler::new(&schema).generate(&pattern, "", "b.title").unwrap();
        assert_eq!(
            query.to_sql(),
            concat!(
                r#"SELECT "b"."properties" -> 'title' FROM "vertices" AS "a" "#,
                r#"JOIN "g"."links" AS "r_a_b" ON ("a"."id" = "r_a_b"."source" AND "r_a_b"."label" = 'OWNS') "#,
                r#"JOIN "vertices" AS "b" ON "r_a_b"."target" = "b"."id" "#,
                r#"WHERE "a"."kind" = 'User'"#
            )
        );
    }

    #[test]
    fn test_json_operator_only_applies_to_projection() {
        let schema = GraphSchema {
            json_operator: JsonOperator::Json,
            ..GraphSchema::default()
        };
        let pattern = parse_pattern(r#"(p {name: "Ada"})"#, &mut SequentialNames::new(), false).unwrap();
        let query = Transpiler::new(&schema)
            .generate(&pattern, r#"p.city = "Oslo""#, "p.name")
            .unwrap();
        assert_eq!(
            query.to_sql(),
            concat!(
                r#"SELECT "p"."properties" -> 'name' FROM "pgraf"."nodes" AS "p" "#,
                r#"WHERE "p"."properties" ->> 'name' = 'Ada' AND ("p"."properties" ->> 'city') = 'Oslo'"#
            )
        );
    }

    #[test]
    fn test_variable_with_trailing_text_is_dropped() {
        assert!(sql("(a)-[:R]->(b)", "", "b AS x").starts_with(r#"SELECT "a".*, "b".* FROM"#));
        assert!(sql("(a)-[:R]->(b)", "", "a.name AS n, b AS x")
            .starts_with(r#"SELECT "a"."properties" ->> 'name' FROM"#));
        assert!(sql("(a)", "", "count(a)").starts_with(r#"SELECT "a".* FROM"#));
    }

    #[test]
    fn test_empty_pattern_is_structural() {
        let schema = GraphSchema::default();
        let err = Transpiler::new(&schema)
            .generate(&Pattern::default(), "", "*")
            .unwrap_err();
        assert!(matches!(err, CypherError::EmptyPattern));
    }

    #[test]
    fn test_strict_rejects_skips() {
        let schema = GraphSchema::default();
        let pattern = parse_pattern("(p)", &mut SequentialNames::new(), true).unwrap();
        let strict = Transpiler::new(&schema).strict(true);

        assert!(matches!(
            strict.generate(&pattern, "q.age > 3", "p"),
            Err(CypherError::UnknownVariable { clause: ClauseKind::Where, .. })
        ));
        assert!(matches!(
            strict.generate(&pattern, "p.age > 3 AND p.age < 9", "p"),
            Err(CypherError::Parse { clause: ClauseKind::Where, .. })
        ));
        assert!(matches!(
            strict.generate(&pattern, "", "p, x"),
            Err(CypherError::UnknownVariable { clause: ClauseKind::Return, .. })
        ));
        assert!(matches!(
            strict.generate(&pattern, "", "p.name AS n"),
            Err(CypherError::Parse { clause: ClauseKind::Return, .. })
        ));
        assert!(strict.generate(&pattern, "p.age > 3", "p.name").is_ok());
    }
}
