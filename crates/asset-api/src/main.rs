//! Meridian API server binary.

use meridian_asset_api::{app, AppState};
use meridian_asset_core::{AssetService, AssetStore};
use meridian_metastore::{HttpMetastoreClient, MetastoreConfig, MetastoreService, MirrorRunner};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let db_path =
        std::env::var("MERIDIAN_DB_PATH").unwrap_or_else(|_| "meridian_assets.db".to_string());
    let metastore_url = std::env::var("MERIDIAN_METASTORE_URL")
        .unwrap_or_else(|_| "http://localhost:8083".to_string());
    let db_filter = std::env::var("MERIDIAN_DB_FILTER").unwrap_or_default();
    let default_db = std::env::var("MERIDIAN_DEFAULT_DB").unwrap_or_else(|_| "default".to_string());

    tracing::info!(db_path = %db_path, metastore = %metastore_url, "starting meridian api");

    let config = match MetastoreConfig::builder(metastore_url)
        .database_filter(&db_filter)
        .default_database(default_db)
        .build()
    {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid metastore configuration: {}", e);
            std::process::exit(1);
        }
    };

    let client = match HttpMetastoreClient::new(config.clone()) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            tracing::error!("Failed to create metastore client: {}", e);
            std::process::exit(1);
        }
    };

    let store = AssetStore::new(&db_path);
    let metastore = Arc::new(MetastoreService::new(client, &config));
    let mirror = Arc::new(MirrorRunner::new(
        Arc::clone(&metastore),
        store.clone(),
        &config,
    ));

    let state = AppState {
        assets: AssetService::new(store),
        metastore,
        mirror,
    };

    let port = std::env::var("MERIDIAN_PORT")
        .or_else(|_| std::env::var("PORT"))
        .unwrap_or_else(|_| "8080".to_string())
        .parse::<u16>()
        .expect("PORT must be a valid number");

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Meridian API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app(state)).await.unwrap();
}
