//! Scan and partition duplication route handlers

use crate::duplication::{DependencyScanner, DuplicationPolicy, PartitionModelDuplicator, ScanPlan};
use crate::error::{validation_error, ApiResult};
use crate::models::{DuplicationScanRequest, DuplicationScanResponse, ScanRequest, SuccessResponse};
use crate::state::SharedState;
use axum::{
    extract::{Path, State},
    Json,
};
use std::collections::HashMap;
use tracing::{debug, info};
use validator::Validate;

/// Plan a scan from any root entity with the default policy
pub async fn create_scan(
    State(state): State<SharedState>,
    Json(payload): Json<ScanRequest>,
) -> ApiResult<Json<SuccessResponse<ScanPlan>>> {
    payload.validate().map_err(|e| validation_error(e.to_string()))?;
    debug!("Scanning {}#{}", payload.root_table, payload.root_id);

    let policy = DuplicationPolicy::default();
    let plan = DependencyScanner::new(&state.datamodel, &policy)
        .scan(&payload.root_table, payload.root_id)?;

    Ok(Json(SuccessResponse::with_data("Scan planned.", plan)))
}

/// Every table copied along with a partition, with its statements
pub async fn duplication_plan(
    State(state): State<SharedState>,
    Path(partition_id): Path<i64>,
) -> ApiResult<Json<SuccessResponse<ScanPlan>>> {
    check_partition_id(partition_id)?;
    let plan = PartitionModelDuplicator::new(&state.datamodel).plan(partition_id)?;

    Ok(Json(SuccessResponse::with_data(
        "Duplication plan generated.",
        plan,
    )))
}

/// Count the rows a partition copy would touch in the project database
pub async fn duplication_scan(
    State(state): State<SharedState>,
    Path(partition_id): Path<i64>,
    Json(payload): Json<DuplicationScanRequest>,
) -> ApiResult<Json<SuccessResponse<DuplicationScanResponse>>> {
    check_partition_id(partition_id)?;
    payload.validate().map_err(|e| validation_error(e.to_string()))?;

    let executor = state.scan_executor()?;
    let plan = PartitionModelDuplicator::new(&state.datamodel).plan(partition_id)?;

    // Every placeholder in a partition plan is the project scope
    let bindings: HashMap<String, i64> = plan
        .statements
        .iter()
        .flat_map(|s| s.params.iter())
        .map(|name| (name.clone(), payload.project_id))
        .collect();

    let counts = executor.count_rows(&plan, &bindings).await?;
    let total_rows = counts.iter().map(|c| c.rows).sum();

    info!(
        "Partition {} of project {}: {} rows across {} tables",
        partition_id,
        payload.project_id,
        total_rows,
        counts.len()
    );

    Ok(Json(SuccessResponse::with_data(
        "Duplication scan complete.",
        DuplicationScanResponse {
            plan_id: plan.id,
            partition_id,
            project_id: payload.project_id,
            counts,
            total_rows,
        },
    )))
}

fn check_partition_id(partition_id: i64) -> ApiResult<()> {
    if partition_id < 1 {
        return Err(validation_error("Partition id must be positive"));
    }
    Ok(())
}
