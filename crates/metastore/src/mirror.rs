//! Full-catalog mirror passes with timestamp reconciliation.
//!
//! A pass enumerates the remote catalog, converts every table descriptor
//! into a mirrored asset record stamped with one epoch, upserts the batch,
//! and then sweeps away mirrored records the pass did not refresh. The
//! epoch is captured once per pass and threaded through as a parameter, so
//! concurrent passes cannot interleave their reconciliation boundaries.

use crate::config::MetastoreConfig;
use crate::service::MetastoreService;
use crate::types::TableDescriptor;
use chrono::Utc;
use meridian_asset_core::{AssetError, AssetStore};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// In-memory snapshot of one mirror pass: database name to the table
/// descriptors fetched for it. Never persisted; only the asset records
/// derived from it are.
pub type CatalogSnapshot = HashMap<String, Vec<TableDescriptor>>;

/// Outcome summary of one mirror pass.
#[derive(Debug, Clone, Serialize)]
pub struct MirrorReport {
    /// The pass's sync epoch (UTC millis), also its reconciliation boundary.
    pub epoch: i64,
    pub databases_scanned: usize,
    pub tables_mirrored: usize,
    /// Tables skipped because their descriptor fetch failed.
    pub tables_failed: usize,
    /// Stale mirrored records purged by the reconciliation sweep.
    pub records_deleted: usize,
}

/// Runs mirror passes against the metastore service and the asset store.
pub struct MirrorRunner {
    service: Arc<MetastoreService>,
    store: AssetStore,
    database_filter: Vec<String>,
    concurrency: usize,
}

impl MirrorRunner {
    pub fn new(service: Arc<MetastoreService>, store: AssetStore, config: &MetastoreConfig) -> Self {
        Self {
            service,
            store,
            database_filter: config.database_filter.clone(),
            concurrency: config.mirror_concurrency.max(1),
        }
    }

    /// Run one full pass.
    ///
    /// Remote failures degrade the pass to a partial mirror and never fail
    /// it; only a store failure aborts, and then before the deletion sweep,
    /// so a failed write can not trigger a purge of good records.
    pub async fn run_pass(&self) -> Result<MirrorReport, AssetError> {
        let databases = if self.database_filter.is_empty() {
            self.service.all_databases().await
        } else {
            self.database_filter.clone()
        };

        let (snapshot, tables_failed) = self.scan_catalog(&databases).await;

        // one epoch for the whole pass, captured before conversion; it is
        // both the stamp on every refreshed record and the sweep boundary
        let now = Utc::now();
        let epoch = now.timestamp_millis();

        let mut batch = Vec::new();
        for tables in snapshot.into_values() {
            for table in tables {
                batch.push(table.into_asset_record(epoch, now));
            }
        }
        let tables_mirrored = batch.len();

        self.store.save_all(&batch).await?;
        let records_deleted = self.store.delete_mirrored_before(epoch).await?;

        let report = MirrorReport {
            epoch,
            databases_scanned: databases.len(),
            tables_mirrored,
            tables_failed,
            records_deleted,
        };
        tracing::info!(
            epoch = report.epoch,
            databases = report.databases_scanned,
            tables = report.tables_mirrored,
            failed = report.tables_failed,
            deleted = report.records_deleted,
            "mirror pass complete"
        );
        Ok(report)
    }

    /// Scan every target database with bounded fan-out. Scans bypass the
    /// lookup cache so a pass sees the remote as it is now.
    async fn scan_catalog(&self, databases: &[String]) -> (CatalogSnapshot, usize) {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut join_set = JoinSet::new();

        for db in databases {
            let db = db.clone();
            let service = Arc::clone(&self.service);
            let semaphore = Arc::clone(&semaphore);
            join_set.spawn(async move {
                // the semaphore is never closed while we hold it
                let _permit = semaphore.acquire_owned().await.ok();
                let scan = service.scan_database(&db).await;
                (db, scan)
            });
        }

        let mut snapshot = CatalogSnapshot::new();
        let mut tables_failed = 0;
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((db, scan)) => {
                    tables_failed += scan.failed_tables;
                    snapshot.insert(db, scan.tables);
                }
                Err(e) => {
                    // a panicked scan task degrades like any other failure
                    tracing::error!(error = %e, "database scan task failed");
                }
            }
        }
        (snapshot, tables_failed)
    }
}
