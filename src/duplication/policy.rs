//! Static classification of tables for duplication and scans

use crate::datamodel::catalog::{PROJECTS, USERS};
use serde::Serialize;
use std::collections::HashMap;

/// What a scan does with the rows of a table it reaches
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Disposition {
    /// Copy rows verbatim
    Duplicate,
    /// Leave rows alone and stop walking past this table
    Ignore,
    /// Copy rows and renumber them by their ordinal position
    #[serde(rename_all = "camelCase")]
    Numbered { position_column: String },
}

#[derive(Debug, Clone)]
pub struct DuplicationPolicy {
    dispositions: HashMap<String, Disposition>,
    fallback: Disposition,
    scope_table: Option<String>,
}

impl DuplicationPolicy {
    /// Policy classifying every table as `fallback` until told otherwise
    pub fn new(fallback: Disposition) -> Self {
        Self {
            dispositions: HashMap::new(),
            fallback,
            scope_table: None,
        }
    }

    /// Statements filter on this table's key as a bound `?` parameter
    pub fn with_scope(mut self, table: &str) -> Self {
        self.scope_table = Some(table.to_string());
        self
    }

    pub fn ignore(mut self, tables: &[&str]) -> Self {
        for table in tables {
            self.dispositions.insert(table.to_string(), Disposition::Ignore);
        }
        self
    }

    pub fn duplicate(mut self, tables: &[&str]) -> Self {
        for table in tables {
            self.dispositions.insert(table.to_string(), Disposition::Duplicate);
        }
        self
    }

    pub fn numbered(mut self, table: &str, position_column: &str) -> Self {
        self.dispositions.insert(
            table.to_string(),
            Disposition::Numbered {
                position_column: position_column.to_string(),
            },
        );
        self
    }

    pub fn disposition(&self, table: &str) -> Disposition {
        self.dispositions
            .get(table)
            .cloned()
            .unwrap_or_else(|| self.fallback.clone())
    }

    pub fn scope_table(&self) -> Option<&str> {
        self.scope_table.as_deref()
    }
}

impl Default for DuplicationPolicy {
    /// Copy everything except the account and project hubs
    fn default() -> Self {
        Self::new(Disposition::Duplicate)
            .with_scope(PROJECTS)
            .ignore(&[USERS, PROJECTS])
    }
}

/// Policy for copying one partition into a project
pub fn partition_policy() -> DuplicationPolicy {
    DuplicationPolicy::default()
        .ignore(&["project_members", "project_documents", "matrix_file_uploads"])
        .numbered("matrix_taxa_order", "position")
        .numbered("matrix_character_order", "position")
}
