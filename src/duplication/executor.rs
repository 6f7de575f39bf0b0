//! Runs scan statements against the project database
//!
//! Plans carry portable `?` placeholders; PostgreSQL wants numbered ones.
//! The executor rewrites them, binds the scope values, and counts the rows
//! each statement would copy.

use super::ScanPlan;
use crate::error::AppError;
use deadpool_postgres::Pool;
use serde::Serialize;
use std::collections::HashMap;
use tokio_postgres::types::ToSql;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRowCount {
    pub table: String,
    pub rows: i64,
}

pub struct ScanExecutor {
    pool: Pool,
}

impl ScanExecutor {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Count the rows selected by every statement of `plan`. `bindings`
    /// maps placeholder names (e.g. `project_id`) to their values.
    pub async fn count_rows(
        &self,
        plan: &ScanPlan,
        bindings: &HashMap<String, i64>,
    ) -> Result<Vec<TableRowCount>, AppError> {
        // Resolve every parameter before touching the pool
        let mut prepared = Vec::with_capacity(plan.statements.len());
        for statement in &plan.statements {
            let values = statement
                .params
                .iter()
                .map(|name| {
                    bindings.get(name).copied().ok_or_else(|| {
                        AppError::Validation(format!(
                            "Missing value for '{}' required by table '{}'",
                            name, statement.table
                        ))
                    })
                })
                .collect::<Result<Vec<i64>, _>>()?;
            prepared.push((statement.table.as_str(), count_query(&statement.select_sql), values));
        }

        let client = self.pool.get().await?;
        let mut counts = Vec::with_capacity(prepared.len());

        for (table, query, values) in prepared {
            let params: Vec<&(dyn ToSql + Sync)> =
                values.iter().map(|v| v as &(dyn ToSql + Sync)).collect();
            let row = client.query_one(&query, &params).await?;
            let rows: i64 = row.get(0);
            debug!("Scan {}#{}: {} has {} rows", plan.state.root_table, plan.state.root_id, table, rows);
            counts.push(TableRowCount {
                table: table.to_string(),
                rows,
            });
        }

        info!(
            "Counted rows for {} tables of {}#{}",
            counts.len(),
            plan.state.root_table,
            plan.state.root_id
        );
        Ok(counts)
    }
}

/// Replace `?` placeholders outside string literals with `$1::bigint`,
/// `$2::bigint`, ...
pub fn to_postgres_placeholders(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 16);
    let mut in_literal = false;
    let mut next = 1;

    for ch in sql.chars() {
        match ch {
            '\'' => {
                in_literal = !in_literal;
                out.push(ch);
            }
            '?' if !in_literal => {
                out.push_str(&format!("${}::bigint", next));
                next += 1;
            }
            _ => out.push(ch),
        }
    }
    out
}

pub fn count_query(select_sql: &str) -> String {
    format!(
        "SELECT COUNT(*) FROM ({}) AS scanned",
        to_postgres_placeholders(select_sql)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datamodel::catalog::research_catalog;
    use crate::datamodel::Datamodel;
    use crate::duplication::PartitionModelDuplicator;
    use deadpool_postgres::{Config, Runtime};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_placeholders_are_numbered() {
        assert_eq!(
            to_postgres_placeholders("SELECT * FROM t WHERE a = ? AND b = ?"),
            "SELECT * FROM t WHERE a = $1::bigint AND b = $2::bigint"
        );
        assert_eq!(to_postgres_placeholders("SELECT 1"), "SELECT 1");
    }

    #[test]
    fn test_placeholders_skip_string_literals() {
        assert_eq!(
            to_postgres_placeholders("SELECT * FROM t WHERE note = 'why?' AND a = ?"),
            "SELECT * FROM t WHERE note = 'why?' AND a = $1::bigint"
        );
    }

    #[test]
    fn test_count_query_wraps_statement() {
        assert_eq!(
            count_query("SELECT taxa.* FROM taxa WHERE taxa.project_id = ?"),
            "SELECT COUNT(*) FROM (SELECT taxa.* FROM taxa WHERE taxa.project_id = $1::bigint) AS scanned"
        );
    }

    #[tokio::test]
    async fn test_missing_binding_is_rejected_before_connecting() {
        let mut cfg = Config::new();
        cfg.host = Some("localhost".to_string());
        cfg.dbname = Some("unused".to_string());
        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), tokio_postgres::NoTls)
            .unwrap();

        let model = Datamodel::build(research_catalog(), 10).unwrap();
        let plan = PartitionModelDuplicator::new(&model).plan(1).unwrap();

        let result = ScanExecutor::new(pool)
            .count_rows(&plan, &HashMap::new())
            .await;
        let err = tokio_test::assert_err!(result);
        assert!(matches!(err, AppError::Validation(_)));
    }
}
