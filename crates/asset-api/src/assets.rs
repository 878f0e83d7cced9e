//! Asset CRUD handlers.

use crate::error::ApiError;
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use meridian_asset_core::{AssetKind, AssetRecord, AssetUpdate, NewAsset};
use serde::Deserialize;

fn default_page_size() -> usize {
    20
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    /// Asset kind filter; empty or absent means all kinds.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub page: usize,
    #[serde(default = "default_page_size")]
    pub size: usize,
}

pub async fn list_assets(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<AssetRecord>>, ApiError> {
    let kind = match params.kind.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(raw.parse::<AssetKind>()?),
    };
    let records = state.assets.list(kind, params.page, params.size).await?;
    Ok(Json(records))
}

pub async fn create_asset(
    State(state): State<AppState>,
    Json(req): Json<NewAsset>,
) -> Result<(StatusCode, Json<AssetRecord>), ApiError> {
    let record = state.assets.create(req).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn update_asset(
    State(state): State<AppState>,
    Json(req): Json<AssetUpdate>,
) -> Result<StatusCode, ApiError> {
    state.assets.update(req).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_asset(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.assets.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
