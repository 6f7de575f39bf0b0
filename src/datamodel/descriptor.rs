//! Table descriptors and their translation into the schema graph

use super::DatamodelError;
use crate::graph::Graph;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Table and column names must be plain SQL identifiers, they are spliced
/// into generated statements unquoted.
static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
});

/// One foreign-key column and the table it points at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKeyRef {
    pub column: String,
    pub references: String,
    /// Edge weight override; `0` marks the link impassable for path search
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
}

/// Static description of a table as declared by the schema layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDescriptor {
    pub name: String,
    pub number: u32,
    pub primary_key: Vec<String>,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyRef>,
}

impl TableDescriptor {
    pub fn new(name: &str, number: u32, primary_key: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            number,
            primary_key: primary_key.iter().map(|c| c.to_string()).collect(),
            columns: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Add a foreign key with the default edge weight
    pub fn references(mut self, column: &str, table: &str) -> Self {
        self.foreign_keys.push(ForeignKeyRef {
            column: column.to_string(),
            references: table.to_string(),
            weight: None,
        });
        self
    }

    pub fn references_weighted(mut self, column: &str, table: &str, weight: u32) -> Self {
        self.foreign_keys.push(ForeignKeyRef {
            column: column.to_string(),
            references: table.to_string(),
            weight: Some(weight),
        });
        self
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}

/// Check a descriptor set for the problems that make a registry unusable
pub fn validate_descriptors(descriptors: &[TableDescriptor]) -> Result<(), DatamodelError> {
    let mut names = HashSet::new();
    let mut numbers = HashSet::new();

    for table in descriptors {
        let malformed = |reason: String| DatamodelError::MalformedDescriptor {
            table: table.name.clone(),
            reason,
        };

        if !IDENTIFIER.is_match(&table.name) {
            return Err(malformed("table name is not a plain identifier".to_string()));
        }
        if !names.insert(table.name.as_str()) {
            return Err(malformed("table is declared more than once".to_string()));
        }
        if !numbers.insert(table.number) {
            return Err(malformed(format!(
                "table number {} is already taken",
                table.number
            )));
        }
        if table.primary_key.is_empty() {
            return Err(malformed("primary key is empty".to_string()));
        }

        let fk_columns = table.foreign_keys.iter().map(|fk| &fk.column);
        for column in table.primary_key.iter().chain(table.columns.iter()).chain(fk_columns) {
            if !IDENTIFIER.is_match(column) {
                return Err(malformed(format!("column '{}' is not a plain identifier", column)));
            }
            if !table.columns.is_empty() && !table.has_column(column) {
                return Err(malformed(format!("column '{}' is not declared", column)));
            }
        }
    }

    for table in descriptors {
        for fk in &table.foreign_keys {
            if !names.contains(fk.references.as_str()) {
                return Err(DatamodelError::MalformedDescriptor {
                    table: table.name.clone(),
                    reason: format!(
                        "column '{}' references unknown table '{}'",
                        fk.column, fk.references
                    ),
                });
            }
            // A single column can only match a single-column key
            let composite = descriptors
                .iter()
                .any(|t| t.name == fk.references && t.primary_key.len() > 1);
            if composite {
                return Err(DatamodelError::MalformedDescriptor {
                    table: table.name.clone(),
                    reason: format!(
                        "column '{}' references '{}', whose primary key is composite",
                        fk.column, fk.references
                    ),
                });
            }
        }
    }

    Ok(())
}

/// Translate descriptors into the table graph.
///
/// Every table becomes a node in declaration order; every foreign key an
/// undirected edge between owner and referenced table. When several keys
/// join the same pair, the lightest passable weight wins. Self-references
/// add no edge.
pub fn build_graph(
    descriptors: &[TableDescriptor],
    default_weight: u32,
) -> Result<Graph<String>, DatamodelError> {
    validate_descriptors(descriptors)?;

    let mut graph = Graph::new();
    graph.add_nodes(descriptors.iter().map(|t| t.name.clone()));

    for table in descriptors {
        for fk in &table.foreign_keys {
            if fk.references == table.name {
                continue;
            }
            let weight = fk.weight.unwrap_or(default_weight);
            let weight = match graph.get_edge(&table.name, &fk.references) {
                Some(existing) => lightest_passable(existing, weight),
                None => weight,
            };
            graph.add_edge(table.name.clone(), fk.references.clone(), weight);
        }
    }

    Ok(graph)
}

fn lightest_passable(a: u32, b: u32) -> u32 {
    match (a, b) {
        (0, other) | (other, 0) => other,
        (a, b) => a.min(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn small_schema() -> Vec<TableDescriptor> {
        vec![
            TableDescriptor::new("projects", 1, &["project_id"]),
            TableDescriptor::new("taxa", 2, &["taxon_id"])
                .references_weighted("project_id", "projects", 100),
            TableDescriptor::new("media", 3, &["media_id"])
                .references("taxon_id", "taxa")
                .references("alt_taxon_id", "taxa")
                .references("derived_from_id", "media"),
        ]
    }

    #[test]
    fn test_build_graph_from_descriptors() {
        let graph = build_graph(&small_schema(), 10).unwrap();

        assert_eq!(graph.num_nodes(), 3);
        assert_eq!(graph.num_edges(), 2);
        assert_eq!(graph.get_edge(&"taxa".to_string(), &"projects".to_string()), Some(100));
        assert_eq!(graph.get_edge(&"media".to_string(), &"taxa".to_string()), Some(10));
        assert_eq!(graph.get_edge(&"media".to_string(), &"media".to_string()), None);
    }

    #[test]
    fn test_unknown_reference_is_malformed() {
        let descriptors = vec![TableDescriptor::new("taxa", 1, &["taxon_id"])
            .references("project_id", "projects")];

        let err = build_graph(&descriptors, 10).unwrap_err();
        assert!(matches!(
            err,
            DatamodelError::MalformedDescriptor { ref table, .. } if table == "taxa"
        ));
    }

    #[test]
    fn test_duplicate_number_is_malformed() {
        let descriptors = vec![
            TableDescriptor::new("taxa", 1, &["taxon_id"]),
            TableDescriptor::new("media", 1, &["media_id"]),
        ];
        assert!(validate_descriptors(&descriptors).is_err());
    }

    #[test]
    fn test_undeclared_key_column_is_malformed() {
        let descriptors = vec![TableDescriptor::new("taxa", 1, &["taxon_id"])
            .columns(&["genus", "species"])];
        assert!(validate_descriptors(&descriptors).is_err());
    }

    #[test]
    fn test_non_identifier_name_is_malformed() {
        let descriptors = vec![TableDescriptor::new("taxa; DROP TABLE users", 1, &["taxon_id"])];
        assert!(validate_descriptors(&descriptors).is_err());
    }

    #[test]
    fn test_reference_to_composite_key_is_malformed() {
        let descriptors = vec![
            TableDescriptor::new("cell_batch", 1, &["matrix_id", "taxon_id"]),
            TableDescriptor::new("cell_notes", 2, &["note_id"]).references("batch_id", "cell_batch"),
        ];
        let err = validate_descriptors(&descriptors).unwrap_err();
        assert_eq!(
            err,
            DatamodelError::MalformedDescriptor {
                table: "cell_notes".to_string(),
                reason: "column 'batch_id' references 'cell_batch', whose primary key is composite"
                    .to_string(),
            }
        );
    }

    #[test]
    fn test_lightest_passable_weight() {
        assert_eq!(lightest_passable(0, 10), 10);
        assert_eq!(lightest_passable(10, 0), 10);
        assert_eq!(lightest_passable(0, 0), 0);
        assert_eq!(lightest_passable(100, 10), 10);
    }

    #[test]
    fn test_descriptor_deserializes_from_camel_case() {
        let json = r#"{
            "name": "taxa",
            "number": 4,
            "primaryKey": ["taxon_id"],
            "foreignKeys": [{"column": "project_id", "references": "projects", "weight": 100}]
        }"#;
        let table: TableDescriptor = serde_json::from_str(json).unwrap();

        assert_eq!(table.primary_key, vec!["taxon_id"]);
        assert!(table.columns.is_empty());
        assert_eq!(table.foreign_keys[0].weight, Some(100));
    }
}
