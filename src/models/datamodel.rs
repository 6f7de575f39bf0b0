//! Registry models and DTOs

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Overview of the loaded registry
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatamodelSummary {
    pub table_count: usize,
    pub edge_count: usize,
    pub checksum: String,
}

#[derive(Debug, Serialize)]
pub struct TableSummary {
    pub name: String,
    pub number: u32,
}

#[derive(Debug, Serialize)]
pub struct TableListResponse {
    pub tables: Vec<TableSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryKeyResponse {
    pub table: String,
    pub primary_key: Vec<String>,
}

/// Tables linked to `table` in one direction
#[derive(Debug, Serialize)]
pub struct RelatedTablesResponse {
    pub table: String,
    pub tables: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PathQuery {
    #[validate(length(min = 1, max = 63, message = "Source table must be between 1 and 63 characters"))]
    pub from: String,

    #[validate(length(min = 1, max = 63, message = "Target table must be between 1 and 63 characters"))]
    pub to: String,
}

#[derive(Debug, Serialize)]
pub struct PathResponse {
    pub from: String,
    pub to: String,
    pub path: Vec<String>,
}
