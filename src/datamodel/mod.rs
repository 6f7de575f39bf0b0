//! Schema registry
//!
//! Builds the table graph from the declared descriptors once at startup and
//! answers structural questions about the schema: primary keys, which
//! tables a table references, which tables reference it, and the cheapest
//! chain of foreign keys between two tables. Read-only after `build`.

pub mod catalog;
pub mod descriptor;

pub use descriptor::{build_graph, ForeignKeyRef, TableDescriptor};

use crate::collections::{HyperTable, OrderedMap, Table};
use crate::graph::Graph;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DatamodelError {
    #[error("Malformed descriptor for table '{table}': {reason}")]
    MalformedDescriptor { table: String, reason: String },

    #[error("Unknown table: {0}")]
    UnknownTable(String),

    #[error("No path from table '{from}' to table '{to}'")]
    NoPath { from: String, to: String },
}

/// Path search cost: zero-weight links are impassable
fn foreign_key_cost(weight: u32) -> Option<u64> {
    (weight > 0).then_some(u64::from(weight))
}

#[derive(Debug)]
pub struct Datamodel {
    tables: OrderedMap<String, TableDescriptor>,
    numbers: HashMap<u32, String>,
    graph: Graph<String>,
    /// table → referenced table → column → weight
    foreign_keys: HyperTable<String, String, String, u32>,
    /// referenced table → referencing table → columns
    referencing: Table<String, String, Vec<String>>,
    checksum: String,
}

impl Datamodel {
    /// Validate the descriptors and build the registry
    pub fn build(
        descriptors: Vec<TableDescriptor>,
        default_weight: u32,
    ) -> Result<Self, DatamodelError> {
        let graph = build_graph(&descriptors, default_weight)?;
        let checksum = Self::compute_checksum(&descriptors);

        let mut foreign_keys = HyperTable::new();
        let mut referencing: Table<String, String, Vec<String>> = Table::new();
        let mut numbers = HashMap::new();
        let mut tables = OrderedMap::new();

        for table in descriptors {
            for fk in &table.foreign_keys {
                let weight = fk.weight.unwrap_or(default_weight);
                foreign_keys.set(
                    table.name.clone(),
                    fk.references.clone(),
                    fk.column.clone(),
                    weight,
                );
                match referencing.get_mut(&fk.references, &table.name) {
                    Some(columns) => columns.push(fk.column.clone()),
                    None => {
                        referencing.set(
                            fk.references.clone(),
                            table.name.clone(),
                            vec![fk.column.clone()],
                        );
                    }
                }
            }
            numbers.insert(table.number, table.name.clone());
            tables.insert(table.name.clone(), table);
        }

        info!(
            "Datamodel built: {} tables, {} foreign-key edges (checksum {})",
            graph.num_nodes(),
            graph.num_edges(),
            &checksum[..12]
        );

        Ok(Self {
            tables,
            numbers,
            graph,
            foreign_keys,
            referencing,
            checksum,
        })
    }

    /// Fingerprint of the declared tables and their foreign keys
    pub fn compute_checksum(descriptors: &[TableDescriptor]) -> String {
        let mut hasher = Sha256::new();
        for table in descriptors {
            hasher.update(format!("{}#{}:{}", table.name, table.number, table.primary_key.join(",")).as_bytes());
            for fk in &table.foreign_keys {
                hasher.update(
                    format!(
                        "FK:{}.{}->{}@{}",
                        table.name,
                        fk.column,
                        fk.references,
                        fk.weight.map(|w| w.to_string()).unwrap_or_default()
                    )
                    .as_bytes(),
                );
            }
        }
        format!("{:x}", hasher.finalize())
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }

    pub fn table_exists(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn table_by_name(&self, name: &str) -> Option<&TableDescriptor> {
        self.tables.get(name)
    }

    pub fn table_by_number(&self, number: u32) -> Option<&TableDescriptor> {
        self.numbers.get(&number).and_then(|name| self.tables.get(name))
    }

    /// Declared primary-key columns, in order
    pub fn primary_key(&self, name: &str) -> Option<&[String]> {
        self.tables.get(name).map(|t| t.primary_key.as_slice())
    }

    /// Tables this table's foreign keys point at
    pub fn neighboring_tables(&self, name: &str) -> Vec<&str> {
        self.foreign_keys
            .row(name)
            .map(|row| row.row_keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Tables holding a foreign key that points at this table
    pub fn referencing_tables(&self, name: &str) -> Vec<&str> {
        self.referencing
            .row(name)
            .map(|row| row.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Columns of `from` that reference `to`, in declaration order
    pub fn foreign_key_columns(&self, from: &str, to: &str) -> Vec<&str> {
        self.foreign_keys
            .cell(from, to)
            .map(|cell| cell.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Column of `from` referencing `to` that path search may travel: the
    /// lightest weight above zero, first declared on ties
    pub fn passable_foreign_key(&self, from: &str, to: &str) -> Option<&str> {
        self.foreign_keys
            .cell(from, to)?
            .iter()
            .filter(|(_, &weight)| foreign_key_cost(weight).is_some())
            .min_by_key(|(_, &weight)| weight)
            .map(|(column, _)| column.as_str())
    }

    /// Cheapest chain of tables joining `from` to `to`, both inclusive.
    /// Empty when the tables are unknown or not connected.
    pub fn path(&self, from: &str, to: &str) -> Vec<String> {
        let path = self
            .graph
            .get_path(&from.to_string(), &to.to_string(), foreign_key_cost);
        debug!("Path {} -> {}: {:?}", from, to, path);
        path
    }

    pub fn graph(&self) -> &Graph<String> {
        &self.graph
    }

    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Descriptor for a table that must exist
    pub fn require_table(&self, name: &str) -> Result<&TableDescriptor, DatamodelError> {
        self.table_by_name(name)
            .ok_or_else(|| DatamodelError::UnknownTable(name.to_string()))
    }
}
