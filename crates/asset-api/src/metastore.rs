//! Metastore lookup and mirror-trigger handlers.
//!
//! Lookup responses mirror the service's degrade-to-empty semantics: an
//! empty list means "currently unknown", not "does not exist". Only the
//! single-table endpoint turns absence into a 404.

use crate::error::ApiError;
use crate::AppState;
use axum::extract::{Path, State};
use axum::Json;
use meridian_metastore::{MirrorReport, TableDescriptor};

pub async fn list_databases(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.metastore.all_databases().await)
}

pub async fn list_tables(
    State(state): State<AppState>,
    Path(db): Path<String>,
) -> Json<Vec<String>> {
    Json(state.metastore.all_table_names(&db).await)
}

pub async fn get_table(
    State(state): State<AppState>,
    Path((db, table)): Path<(String, String)>,
) -> Result<Json<TableDescriptor>, ApiError> {
    match state.metastore.table(&db, &table).await {
        Some(descriptor) => Ok(Json(descriptor)),
        None => Err(ApiError::not_found(format!(
            "table {}.{} is unknown or the metastore is unreachable",
            db, table
        ))),
    }
}

/// Run one mirror pass synchronously and return its report.
pub async fn run_sync(State(state): State<AppState>) -> Result<Json<MirrorReport>, ApiError> {
    let report = state.mirror.run_pass().await?;
    Ok(Json(report))
}
