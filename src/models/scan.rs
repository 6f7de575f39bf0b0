//! Scan and duplication models and DTOs

use crate::duplication::TableRowCount;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Request to plan a scan from any root entity
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    #[validate(length(min = 1, max = 63, message = "Root table must be between 1 and 63 characters"))]
    pub root_table: String,

    #[validate(range(min = 1, message = "Root id must be positive"))]
    pub root_id: i64,
}

/// Request to count the rows a partition copy would touch
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DuplicationScanRequest {
    #[validate(range(min = 1, message = "Project id must be positive"))]
    pub project_id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicationScanResponse {
    pub plan_id: Uuid,
    pub partition_id: i64,
    pub project_id: i64,
    pub counts: Vec<TableRowCount>,
    pub total_rows: i64,
}
