//! Cached on-demand lookups against the metastore.
//!
//! Every lookup degrades on remote failure: the error is logged, a
//! reconnect is requested, and the caller gets an empty collection or
//! `None`. Absence therefore means "currently unknown", not "does not
//! exist", except where the remote answered 404, which is a definitive
//! answer and is cached as such.

use crate::cache::MetaCache;
use crate::client::MetastoreClient;
use crate::config::MetastoreConfig;
use crate::reconnect::ReconnectSupervisor;
use crate::types::TableDescriptor;
use std::sync::Arc;

/// Result of an uncached scan of one database, used by mirror passes.
#[derive(Debug, Default)]
pub struct DatabaseScan {
    pub tables: Vec<TableDescriptor>,
    /// Tables whose descriptor fetch failed and were skipped.
    pub failed_tables: usize,
    /// Whether the table-name enumeration itself failed.
    pub enumeration_failed: bool,
}

/// Cached read facade over a [`MetastoreClient`].
pub struct MetastoreService {
    client: Arc<dyn MetastoreClient>,
    cache: MetaCache,
    reconnect: ReconnectSupervisor,
    default_database: String,
}

impl MetastoreService {
    pub fn new(client: Arc<dyn MetastoreClient>, config: &MetastoreConfig) -> Self {
        let reconnect = ReconnectSupervisor::start(
            Arc::clone(&client),
            config.reconnect_queue_capacity,
            config.reconnect_workers,
        );
        Self {
            client,
            cache: MetaCache::new(config.cache_capacity),
            reconnect,
            default_database: config.default_database.clone(),
        }
    }

    /// Map an empty/unset database name to the configured default before any
    /// remote call or cache key computation.
    fn use_db_name<'a>(&'a self, db: &'a str) -> &'a str {
        if db.trim().is_empty() {
            &self.default_database
        } else {
            db
        }
    }

    /// All database names, or empty when the metastore is unavailable.
    pub async fn all_databases(&self) -> Vec<String> {
        if let Some(databases) = self.cache.get_databases().await {
            return databases;
        }

        let lock = self.cache.key_lock("databases");
        let _guard = lock.lock().await;
        if let Some(databases) = self.cache.get_databases().await {
            return databases;
        }

        match self.client.list_databases().await {
            Ok(databases) => {
                self.cache.put_databases(databases.clone()).await;
                databases
            }
            Err(e) => {
                tracing::error!(error = %e, "can not list databases");
                self.reconnect.request_reconnect();
                Vec::new()
            }
        }
    }

    /// Table names of one database, or empty when unavailable.
    pub async fn all_table_names(&self, db: &str) -> Vec<String> {
        let db = self.use_db_name(db);
        if let Some(names) = self.cache.get_table_names(db).await {
            return names;
        }

        let lock = self.cache.key_lock(&format!("table_names:{}", db));
        let _guard = lock.lock().await;
        if let Some(names) = self.cache.get_table_names(db).await {
            return names;
        }

        match self.client.list_tables(db).await {
            Ok(names) => {
                self.cache.put_table_names(db.to_string(), names.clone()).await;
                names
            }
            Err(e) if e.is_not_found() => {
                // unknown database is a definitive empty answer
                self.cache.put_table_names(db.to_string(), Vec::new()).await;
                Vec::new()
            }
            Err(e) => {
                tracing::error!(db = %db, error = %e, "can not list tables");
                self.reconnect.request_reconnect();
                Vec::new()
            }
        }
    }

    /// Descriptor of one table; `None` when unknown or unavailable.
    pub async fn table(&self, db: &str, table: &str) -> Option<TableDescriptor> {
        let db = self.use_db_name(db);
        if let Some(cached) = self.cache.get_table(db, table).await {
            return cached;
        }

        let lock = self.cache.key_lock(&format!("table:{}.{}", db, table));
        let _guard = lock.lock().await;
        if let Some(cached) = self.cache.get_table(db, table).await {
            return cached;
        }

        match self.client.get_table(db, table).await {
            Ok(descriptor) => {
                self.cache
                    .put_table(db.to_string(), table.to_string(), Some(descriptor.clone()))
                    .await;
                Some(descriptor)
            }
            Err(e) if e.is_not_found() => {
                self.cache
                    .put_table(db.to_string(), table.to_string(), None)
                    .await;
                None
            }
            Err(e) => {
                tracing::error!(db = %db, table = %table, error = %e, "can not fetch table");
                self.reconnect.request_reconnect();
                None
            }
        }
    }

    /// All table descriptors of one database, assembled from an enumeration
    /// plus per-table fetches. Cached only when fully successful; a partial
    /// result is returned but never cached.
    pub async fn all_tables(&self, db: &str) -> Vec<TableDescriptor> {
        let db = self.use_db_name(db);
        if let Some(tables) = self.cache.get_db_tables(db).await {
            return tables;
        }

        let lock = self.cache.key_lock(&format!("db_tables:{}", db));
        let _guard = lock.lock().await;
        if let Some(tables) = self.cache.get_db_tables(db).await {
            return tables;
        }

        let scan = self.scan_database(db).await;
        if !scan.enumeration_failed && scan.failed_tables == 0 {
            self.cache.put_db_tables(db.to_string(), scan.tables.clone()).await;
        }
        scan.tables
    }

    /// Uncached scan of one database. Mirror passes use this directly so
    /// that a pass always reflects the remote as it is now, not as the
    /// cache remembers it. A failed table fetch is logged and skipped; it
    /// never aborts the scan.
    pub async fn scan_database(&self, db: &str) -> DatabaseScan {
        let db = self.use_db_name(db);
        let names = match self.client.list_tables(db).await {
            Ok(names) => names,
            Err(e) if e.is_not_found() => Vec::new(),
            Err(e) => {
                tracing::error!(db = %db, error = %e, "can not enumerate tables");
                self.reconnect.request_reconnect();
                return DatabaseScan {
                    enumeration_failed: true,
                    ..DatabaseScan::default()
                };
            }
        };

        let mut scan = DatabaseScan::default();
        for name in names {
            match self.client.get_table(db, &name).await {
                Ok(descriptor) => scan.tables.push(descriptor),
                Err(e) => {
                    scan.failed_tables += 1;
                    tracing::warn!(db = %db, table = %name, error = %e, "table skipped");
                    if !e.is_not_found() {
                        self.reconnect.request_reconnect();
                    }
                }
            }
        }
        scan
    }

    /// External invalidation hook: drop every cached entry.
    pub async fn invalidate_cache(&self) {
        self.cache.invalidate_all().await;
    }

    /// Number of reconnect attempts currently running.
    pub fn reconnect_active(&self) -> usize {
        self.reconnect.active_count()
    }
}
