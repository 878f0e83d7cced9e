//! Meridian Asset API Server
//!
//! REST facade over the asset CRUD service and the metastore lookup/mirror
//! subsystem. Thin by design: conflict rules live in
//! `meridian-asset-core`, degrade-to-empty lookup semantics in
//! `meridian-metastore`; handlers only translate HTTP.

use axum::routing::{delete, get, post};
use axum::Router;
use meridian_asset_core::AssetService;
use meridian_metastore::{MetastoreService, MirrorRunner};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub mod assets;
pub mod error;
pub mod metastore;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub assets: AssetService,
    pub metastore: Arc<MetastoreService>,
    pub mirror: Arc<MirrorRunner>,
}

/// Build the router with all routes mounted.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route(
            "/api/v1/assets",
            get(assets::list_assets)
                .post(assets::create_asset)
                .put(assets::update_asset),
        )
        .route("/api/v1/assets/:id", delete(assets::delete_asset))
        .route("/api/v1/metastore/databases", get(metastore::list_databases))
        .route(
            "/api/v1/metastore/databases/:db/tables",
            get(metastore::list_tables),
        )
        .route(
            "/api/v1/metastore/databases/:db/tables/:table",
            get(metastore::get_table),
        )
        .route("/api/v1/metastore/sync", post(metastore::run_sync))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Basic health check, suitable for load balancers.
async fn health_check() -> &'static str {
    "ok"
}
