//! Schema registry route handlers
//!
//! Read-only views over the datamodel built at startup.

use crate::datamodel::{DatamodelError, TableDescriptor};
use crate::error::{validation_error, ApiResult, AppError};
use crate::models::{
    DatamodelSummary, PathQuery, PathResponse, PrimaryKeyResponse, RelatedTablesResponse,
    SuccessResponse, TableListResponse, TableSummary,
};
use crate::state::SharedState;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::debug;
use validator::Validate;

/// Table count, edge count and checksum of the registry
pub async fn summary(
    State(state): State<SharedState>,
) -> ApiResult<Json<SuccessResponse<DatamodelSummary>>> {
    let model = &state.datamodel;
    Ok(Json(SuccessResponse::with_data(
        "Datamodel fetched successfully.",
        DatamodelSummary {
            table_count: model.len(),
            edge_count: model.graph().num_edges(),
            checksum: model.checksum().to_string(),
        },
    )))
}

/// List all tables in declaration order
pub async fn list_tables(
    State(state): State<SharedState>,
) -> ApiResult<Json<SuccessResponse<TableListResponse>>> {
    let model = &state.datamodel;
    let tables = model
        .table_names()
        .into_iter()
        .filter_map(|name| model.table_by_name(name))
        .map(|table| TableSummary {
            name: table.name.clone(),
            number: table.number,
        })
        .collect();

    Ok(Json(SuccessResponse::with_data(
        "Tables fetched successfully.",
        TableListResponse { tables },
    )))
}

pub async fn get_table(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> ApiResult<Json<SuccessResponse<TableDescriptor>>> {
    let table = state.datamodel.require_table(&name)?;
    Ok(Json(SuccessResponse::with_data(
        "Table fetched successfully.",
        table.clone(),
    )))
}

pub async fn get_table_by_number(
    State(state): State<SharedState>,
    Path(number): Path<u32>,
) -> ApiResult<Json<SuccessResponse<TableDescriptor>>> {
    let table = state
        .datamodel
        .table_by_number(number)
        .ok_or_else(|| AppError::NotFound(format!("No table numbered {}", number)))?;
    Ok(Json(SuccessResponse::with_data(
        "Table fetched successfully.",
        table.clone(),
    )))
}

pub async fn get_primary_key(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> ApiResult<Json<SuccessResponse<PrimaryKeyResponse>>> {
    let table = state.datamodel.require_table(&name)?;
    Ok(Json(SuccessResponse::with_data(
        "Primary key fetched successfully.",
        PrimaryKeyResponse {
            table: table.name.clone(),
            primary_key: table.primary_key.clone(),
        },
    )))
}

/// Tables this table references
pub async fn get_neighbors(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> ApiResult<Json<SuccessResponse<RelatedTablesResponse>>> {
    state.datamodel.require_table(&name)?;
    let tables = owned(state.datamodel.neighboring_tables(&name));
    Ok(Json(SuccessResponse::with_data(
        "Neighboring tables fetched successfully.",
        RelatedTablesResponse { table: name, tables },
    )))
}

/// Tables referencing this table
pub async fn get_referencing(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> ApiResult<Json<SuccessResponse<RelatedTablesResponse>>> {
    state.datamodel.require_table(&name)?;
    let tables = owned(state.datamodel.referencing_tables(&name));
    Ok(Json(SuccessResponse::with_data(
        "Referencing tables fetched successfully.",
        RelatedTablesResponse { table: name, tables },
    )))
}

/// Cheapest foreign-key chain between two tables
pub async fn find_path(
    State(state): State<SharedState>,
    Query(params): Query<PathQuery>,
) -> ApiResult<Json<SuccessResponse<PathResponse>>> {
    params.validate().map_err(|e| validation_error(e.to_string()))?;

    let model = &state.datamodel;
    model.require_table(&params.from)?;
    model.require_table(&params.to)?;

    debug!("Finding path: {} -> {}", params.from, params.to);
    let path = model.path(&params.from, &params.to);
    if path.is_empty() {
        return Err(DatamodelError::NoPath {
            from: params.from,
            to: params.to,
        }
        .into());
    }

    Ok(Json(SuccessResponse::with_data(
        "Path found.",
        PathResponse {
            from: params.from,
            to: params.to,
            path,
        },
    )))
}

fn owned(tables: Vec<&str>) -> Vec<String> {
    tables.into_iter().map(str::to_string).collect()
}
