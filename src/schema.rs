//! Target storage shape for generated SQL.
//!
//! The node and edge tables are owned by the storage layer; the translator
//! only needs their names, their column names and the JSON operator used to
//! read a property.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CypherError, CypherResult};

/// JSON operator for projected properties. Filters always read with `->>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum JsonOperator {
    /// `->>`, yields text.
    #[default]
    #[serde(rename = "->>")]
    Text,
    /// `->`, yields json.
    #[serde(rename = "->")]
    Json,
}

impl fmt::Display for JsonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsonOperator::Text => write!(f, "->>"),
            JsonOperator::Json => write!(f, "->"),
        }
    }
}

/// Names of the node and edge relations and their columns.
///
/// Defaults match the `pgraf` storage schema:
/// `pgraf.nodes(id, type, properties)` and
/// `pgraf.edges(source, target, label, properties)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GraphSchema {
    /// Node table, optionally schema-qualified.
    pub node_table: String,
    /// Edge table, optionally schema-qualified.
    pub edge_table: String,
    pub id_column: String,
    /// Column holding a node's label.
    pub node_type_column: String,
    /// Column holding an edge's type.
    pub edge_type_column: String,
    pub properties_column: String,
    pub source_column: String,
    pub target_column: String,
    pub json_operator: JsonOperator,
}

impl Default for GraphSchema {
    fn default() -> Self {
        Self {
            node_table: "pgraf.nodes".to_string(),
            edge_table: "pgraf.edges".to_string(),
            id_column: "id".to_string(),
            node_type_column: "type".to_string(),
            edge_type_column: "label".to_string(),
            properties_column: "properties".to_string(),
            source_column: "source".to_string(),
            target_column: "target".to_string(),
            json_operator: JsonOperator::Text,
        }
    }
}

impl GraphSchema {
    /// Node table split into its dotted parts.
    pub fn node_table_path(&self) -> Vec<String> {
        split_path(&self.node_table)
    }

    /// Edge table split into its dotted parts.
    pub fn edge_table_path(&self) -> Vec<String> {
        split_path(&self.edge_table)
    }

    /// Reject empty names and empty table path segments.
    pub fn validate(&self) -> CypherResult<()> {
        for (field, table) in [("node_table", &self.node_table), ("edge_table", &self.edge_table)] {
            if table.split('.').any(|part| part.trim().is_empty()) {
                return Err(CypherError::Config(format!(
                    "{} '{}' has an empty name segment",
                    field, table
                )));
            }
        }
        let columns = [
            ("id_column", &self.id_column),
            ("node_type_column", &self.node_type_column),
            ("edge_type_column", &self.edge_type_column),
            ("properties_column", &self.properties_column),
            ("source_column", &self.source_column),
            ("target_column", &self.target_column),
        ];
        for (field, column) in columns {
            if column.trim().is_empty() {
                return Err(CypherError::Config(format!("{} must not be empty", field)));
            }
        }
        Ok(())
    }
}

fn split_path(table: &str) -> Vec<String> {
    table.split('.').map(|part| part.trim().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schema() {
        let schema = GraphSchema::default();
        assert_eq!(schema.node_table_path(), vec!["pgraf", "nodes"]);
        assert_eq!(schema.edge_table_path(), vec!["pgraf", "edges"]);
        assert_eq!(schema.json_operator.to_string(), "->>");
        assert!(schema.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_segments() {
        let schema = GraphSchema {
            node_table: "graph.".to_string(),
            ..GraphSchema::default()
        };
        assert!(matches!(schema.validate(), Err(CypherError::Config(_))));

        let schema = GraphSchema {
            id_column: " ".to_string(),
            ..GraphSchema::default()
        };
        assert!(schema.validate().is_err());
    }

    #[test]
    fn test_partial_schema_from_toml() {
        let schema: GraphSchema = toml::from_str(
            r#"
            node_table = "vertices"
            json_operator = "->"
            "#,
        )
        .unwrap();
        assert_eq!(schema.node_table_path(), vec!["vertices"]);
        assert_eq!(schema.edge_table, "pgraf.edges");
        assert_eq!(schema.json_operator, JsonOperator::Json);
    }
}
