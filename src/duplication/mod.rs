//! Dependency scanning and duplication planning
//!
//! Starting from one root entity (a partition, a project, a taxon...), the
//! scanner walks the schema graph outward, classifies every table it meets
//! through a [`DuplicationPolicy`], and produces a [`ScanPlan`]: the tables
//! to copy, the tables to leave alone, the statements selecting the rows
//! involved, and the order in which copies can be inserted.
//!
//! Scanners borrow the shared [`Datamodel`] and own nothing else; each call
//! to `scan` builds a fresh [`ScanState`].

pub mod executor;
pub mod partition;
pub mod policy;
pub mod sql;

pub use executor::{ScanExecutor, TableRowCount};
pub use partition::PartitionModelDuplicator;
pub use policy::{partition_policy, Disposition, DuplicationPolicy};

use crate::datamodel::{Datamodel, DatamodelError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sql::{insert_template, StatementBuilder};
use std::collections::{HashSet, VecDeque};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Tables classified so far by one scan
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanState {
    pub root_table: String,
    pub root_id: i64,
    pub duplicated_tables: Vec<String>,
    pub ignored_tables: Vec<String>,
    pub numbered_tables: Vec<String>,
    /// Every classified table with its disposition, in discovery order
    #[serde(skip)]
    discovered: Vec<(String, Disposition)>,
    #[serde(skip)]
    visited: HashSet<String>,
}

impl ScanState {
    pub fn new(root_table: &str, root_id: i64) -> Self {
        Self {
            root_table: root_table.to_string(),
            root_id,
            duplicated_tables: Vec::new(),
            ignored_tables: Vec::new(),
            numbered_tables: Vec::new(),
            discovered: Vec::new(),
            visited: HashSet::new(),
        }
    }

    pub fn is_visited(&self, table: &str) -> bool {
        self.visited.contains(table)
    }

    /// Record a newly discovered table. Returns false if it was already seen.
    pub fn classify(&mut self, table: &str, disposition: Disposition) -> bool {
        if !self.visited.insert(table.to_string()) {
            return false;
        }
        match &disposition {
            Disposition::Duplicate => self.duplicated_tables.push(table.to_string()),
            Disposition::Ignore => self.ignored_tables.push(table.to_string()),
            Disposition::Numbered { .. } => self.numbered_tables.push(table.to_string()),
        }
        self.discovered.push((table.to_string(), disposition));
        true
    }

    /// Duplicated and numbered tables, in discovery order
    pub fn copied_tables(&self) -> impl Iterator<Item = (&str, &Disposition)> {
        self.discovered
            .iter()
            .filter(|(_, d)| *d != Disposition::Ignore)
            .map(|(t, d)| (t.as_str(), d))
    }
}

/// Statements for one table of a plan
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableStatement {
    pub table: String,
    pub disposition: Disposition,
    pub select_sql: String,
    /// Names of the `?` placeholders in `select_sql`, in order
    pub params: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insert_sql: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanPlan {
    pub id: Uuid,
    pub generated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub state: ScanState,
    pub statements: Vec<TableStatement>,
    /// Copied tables with every referenced table ahead of its referrers
    pub insert_order: Vec<String>,
}

impl ScanPlan {
    pub fn statement(&self, table: &str) -> Option<&TableStatement> {
        self.statements.iter().find(|s| s.table == table)
    }
}

pub struct DependencyScanner<'a> {
    datamodel: &'a Datamodel,
    policy: &'a DuplicationPolicy,
}

impl<'a> DependencyScanner<'a> {
    pub fn new(datamodel: &'a Datamodel, policy: &'a DuplicationPolicy) -> Self {
        Self { datamodel, policy }
    }

    /// Walk outward from `root_table` and plan every table reached
    pub fn scan(&self, root_table: &str, root_id: i64) -> Result<ScanPlan, DatamodelError> {
        self.datamodel.require_table(root_table)?;

        let mut state = ScanState::new(root_table, root_id);
        let mut queue = VecDeque::new();

        // The root is always expanded, even when the policy ignores its rows
        state.classify(root_table, self.policy.disposition(root_table));
        queue.push_back(root_table.to_string());

        while let Some(table) = queue.pop_front() {
            let referencing = self.datamodel.referencing_tables(&table);
            let neighbors = self.datamodel.neighboring_tables(&table);

            for next in referencing.into_iter().chain(neighbors) {
                if state.is_visited(next) {
                    continue;
                }
                let disposition = self.policy.disposition(next);
                debug!("Scan {}#{}: {} -> {} ({:?})", root_table, root_id, table, next, disposition);
                let expand = disposition != Disposition::Ignore;
                if state.classify(next, disposition) && expand {
                    queue.push_back(next.to_string());
                }
            }
        }

        let builder = StatementBuilder::new(
            self.datamodel,
            root_table,
            root_id,
            self.policy.scope_table(),
        );
        let statements = state
            .copied_tables()
            .map(|(table, disposition)| self.build_statement(&builder, table, disposition))
            .collect::<Result<Vec<_>, _>>()?;

        let insert_order = self.insert_order(&state);

        info!(
            "Scanned {}#{}: {} duplicated, {} numbered, {} ignored",
            root_table,
            root_id,
            state.duplicated_tables.len(),
            state.numbered_tables.len(),
            state.ignored_tables.len()
        );

        Ok(ScanPlan {
            id: Uuid::new_v4(),
            generated_at: Utc::now(),
            state,
            statements,
            insert_order,
        })
    }

    /// Statement for a single table without walking the whole graph
    pub fn statement_for(
        &self,
        root_table: &str,
        root_id: i64,
        table: &str,
    ) -> Result<TableStatement, DatamodelError> {
        self.datamodel.require_table(root_table)?;
        let builder = StatementBuilder::new(
            self.datamodel,
            root_table,
            root_id,
            self.policy.scope_table(),
        );
        self.build_statement(&builder, table, &self.policy.disposition(table))
    }

    fn build_statement(
        &self,
        builder: &StatementBuilder<'_>,
        table: &str,
        disposition: &Disposition,
    ) -> Result<TableStatement, DatamodelError> {
        let select = builder.select(table, disposition)?;
        Ok(TableStatement {
            table: table.to_string(),
            disposition: disposition.clone(),
            select_sql: select.sql,
            params: select.params,
            insert_sql: insert_template(self.datamodel, table),
        })
    }

    /// Parents before children among the copied tables. Ties keep
    /// discovery order; tables caught in a cycle go last.
    fn insert_order(&self, state: &ScanState) -> Vec<String> {
        let copied: Vec<&str> = state.copied_tables().map(|(table, _)| table).collect();
        let members: HashSet<&str> = copied.iter().copied().collect();
        let mut placed: HashSet<&str> = HashSet::new();
        let mut order = Vec::with_capacity(copied.len());

        while order.len() < copied.len() {
            let ready = copied.iter().copied().find(|table| {
                !placed.contains(table)
                    && self
                        .datamodel
                        .neighboring_tables(table)
                        .into_iter()
                        .all(|parent| parent == *table || !members.contains(parent) || placed.contains(parent))
            });

            match ready {
                Some(table) => {
                    placed.insert(table);
                    order.push(table.to_string());
                }
                None => {
                    let cyclic: Vec<&str> = copied
                        .iter()
                        .copied()
                        .filter(|table| !placed.contains(table))
                        .collect();
                    warn!("Foreign-key cycle among {:?}; appending in discovery order", cyclic);
                    order.extend(cyclic.into_iter().map(str::to_string));
                }
            }
        }

        order
    }
}
