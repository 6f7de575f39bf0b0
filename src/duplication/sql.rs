//! Statement builder for scans
//!
//! Turns a foreign-key path from a table to the scan root into a single
//! `SELECT` that fetches the rows of that table belonging to one root
//! entity. The root id is written into the statement; the scope id stays a
//! `?` placeholder for the storage layer to bind.

use super::policy::Disposition;
use crate::datamodel::{Datamodel, DatamodelError};

/// A join from the table already in the chain to the next one
struct Join {
    clause: String,
    /// The joined table references the previous one, so rows may fan out
    into_child: bool,
}

/// The SQL selecting `table`'s rows for `root_id`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectStatement {
    pub sql: String,
    /// Names of the `?` placeholders, in order
    pub params: Vec<String>,
}

pub struct StatementBuilder<'a> {
    datamodel: &'a Datamodel,
    root_table: &'a str,
    root_id: i64,
    scope_table: Option<&'a str>,
}

impl<'a> StatementBuilder<'a> {
    pub fn new(
        datamodel: &'a Datamodel,
        root_table: &'a str,
        root_id: i64,
        scope_table: Option<&'a str>,
    ) -> Self {
        Self {
            datamodel,
            root_table,
            root_id,
            scope_table,
        }
    }

    pub fn select(
        &self,
        table: &str,
        disposition: &Disposition,
    ) -> Result<SelectStatement, DatamodelError> {
        self.datamodel.require_table(table)?;
        let root = self.root_table;

        let path = self.datamodel.path(table, root);
        if path.is_empty() {
            return Err(DatamodelError::NoPath {
                from: table.to_string(),
                to: root.to_string(),
            });
        }

        // A link table next to the root already holds the root id, so the
        // root itself need not be joined
        let (joined, filter) = match path.len() {
            1 => (path.as_slice(), format!("{}.{} = {}", root, self.key_of(root)?, self.root_id)),
            n => {
                let last = path[n - 2].as_str();
                match self.datamodel.passable_foreign_key(last, root) {
                    Some(column) => (&path[..n - 1], format!("{}.{} = {}", last, column, self.root_id)),
                    None => (
                        path.as_slice(),
                        format!("{}.{} = {}", root, self.key_of(root)?, self.root_id),
                    ),
                }
            }
        };

        let mut joins = Vec::new();
        let mut fans_out = false;
        let last_join = joined.len().saturating_sub(2);
        for (step, pair) in joined.windows(2).enumerate() {
            let join = self.join(&pair[0], &pair[1])?;
            if join.into_child && step < last_join {
                fans_out = true;
            }
            joins.push(join.clause);
        }

        let mut params = Vec::new();
        let mut sql = format!(
            "SELECT {}{}.* FROM {}",
            if fans_out { "DISTINCT " } else { "" },
            table,
            table
        );
        for clause in &joins {
            sql.push(' ');
            sql.push_str(clause);
        }
        sql.push_str(" WHERE ");
        sql.push_str(&filter);

        if let Some(scope) = self.scope_table.filter(|scope| *scope != root && *scope != table) {
            if let Some(column) = self.datamodel.foreign_key_columns(table, scope).first() {
                sql.push_str(&format!(" AND {}.{} = ?", table, column));
                params.push(column.to_string());
            }
        }

        if let Disposition::Numbered { position_column } = disposition {
            sql.push_str(&format!(" ORDER BY {}.{}", table, position_column));
        }

        Ok(SelectStatement { sql, params })
    }

    fn join(&self, prev: &str, next: &str) -> Result<Join, DatamodelError> {
        if let Some(column) = self.datamodel.passable_foreign_key(prev, next) {
            let key = self.key_of(next)?;
            return Ok(Join {
                clause: Self::join_clause(next, prev, column, next, key),
                into_child: false,
            });
        }
        if let Some(column) = self.datamodel.passable_foreign_key(next, prev) {
            let key = self.key_of(prev)?;
            return Ok(Join {
                clause: Self::join_clause(next, next, column, prev, key),
                into_child: true,
            });
        }
        Err(DatamodelError::NoPath {
            from: prev.to_string(),
            to: next.to_string(),
        })
    }

    /// `USING` when the referencing column shares the key's name
    fn join_clause(
        joined: &str,
        fk_table: &str,
        fk_column: &str,
        key_table: &str,
        key_column: &str,
    ) -> String {
        if fk_column == key_column {
            format!("INNER JOIN {} USING ({})", joined, fk_column)
        } else {
            format!(
                "INNER JOIN {} ON {}.{} = {}.{}",
                joined, fk_table, fk_column, key_table, key_column
            )
        }
    }

    /// The single primary-key column, used as the join and filter target
    fn key_of(&self, table: &str) -> Result<&'a str, DatamodelError> {
        let key = self
            .datamodel
            .primary_key(table)
            .ok_or_else(|| DatamodelError::UnknownTable(table.to_string()))?;
        match key {
            [column] => Ok(column.as_str()),
            _ => Err(DatamodelError::MalformedDescriptor {
                table: table.to_string(),
                reason: format!(
                    "composite primary key ({}) cannot be matched by one column",
                    key.join(", ")
                ),
            }),
        }
    }
}

/// `INSERT` template for copying one row of `table`; the primary key is
/// left to the database and returned. `None` without a column list.
pub fn insert_template(datamodel: &Datamodel, table: &str) -> Option<String> {
    let descriptor = datamodel.table_by_name(table)?;
    let columns: Vec<&str> = descriptor
        .columns
        .iter()
        .filter(|c| !descriptor.primary_key.contains(*c))
        .map(String::as_str)
        .collect();
    if columns.is_empty() {
        return None;
    }

    let placeholders = vec!["?"; columns.len()].join(", ");
    Some(format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        table,
        columns.join(", "),
        placeholders,
        descriptor.primary_key.join(", ")
    ))
}

/// Collapse runs of whitespace so statements compare by tokens
pub fn normalize_whitespace(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}
