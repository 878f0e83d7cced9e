//! Meridian Metastore
//!
//! Hive metastore synchronization and caching subsystem: a client seam to
//! the remote metastore gateway, a no-TTL memoization layer over its read
//! operations, a bounded reconnect supervisor for flaky connectivity, and
//! the mirror that reconciles a local asset table against the remote
//! catalog with a timestamp mark-and-sweep.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use meridian_asset_core::AssetStore;
//! use meridian_metastore::{
//!     HttpMetastoreClient, MetastoreConfig, MetastoreService, MirrorRunner,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = MetastoreConfig::builder("http://metastore:8083")
//!         .database_filter("sales,marketing")
//!         .build()?;
//!
//!     let client = Arc::new(HttpMetastoreClient::new(config.clone())?);
//!     let service = Arc::new(MetastoreService::new(client, &config));
//!
//!     // cached, degrade-to-empty lookups
//!     for db in service.all_databases().await {
//!         println!("{}: {:?}", db, service.all_table_names(&db).await);
//!     }
//!
//!     // one full mirror pass
//!     let store = AssetStore::new("meridian_assets.db");
//!     let mirror = MirrorRunner::new(service, store, &config);
//!     let report = mirror.run_pass().await?;
//!     println!("mirrored {} tables", report.tables_mirrored);
//!     Ok(())
//! }
//! ```
//!
//! # Failure Model
//!
//! Remote failures are recoverable by definition: lookups return empty and
//! request a reconnect, mirror passes degrade to a partial mirror. Only a
//! failure of the durable store aborts a pass, and then before its deletion
//! sweep runs.

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod mirror;
pub mod reconnect;
pub mod service;
pub mod types;

// Re-exports for convenience
pub use cache::MetaCache;
pub use client::{HttpMetastoreClient, MetastoreClient};
pub use config::{parse_database_filter, MetastoreConfig, MetastoreConfigBuilder};
pub use error::{MetastoreError, Result};
pub use mirror::{CatalogSnapshot, MirrorReport, MirrorRunner};
pub use reconnect::ReconnectSupervisor;
pub use service::{DatabaseScan, MetastoreService};
pub use types::{
    DatabasesResponse, FieldSchema, StorageDescriptor, TableDescriptor, TablesResponse,
    MIRRORED_ASSET_VERSION,
};
