//! Memoization layer over metastore reads.
//!
//! One typed map per remote operation, keyed by the operation's arguments.
//! Entries have no TTL: a value stays until explicitly invalidated or the
//! process restarts, with the LRU capacity as a key-space bound only.
//! Successful empty answers are cached like any other value; failures are
//! never cached (the lookup service simply does not call `put_*` then).
//!
//! Population is single-flight per key: callers take the key's lock from
//! [`MetaCache::key_lock`], re-check the cache, and only then issue the
//! remote call, so at most one writer populates any key while the rest wait
//! and hit the fresh entry.

use crate::types::TableDescriptor;
use dashmap::DashMap;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, RwLock};

/// Cached value plus the time it was produced.
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    value: T,
    cached_at: Instant,
}

impl<T> CacheEntry<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            cached_at: Instant::now(),
        }
    }
}

/// Cache over the four metastore read operations.
pub struct MetaCache {
    /// `list_databases` has no arguments, so its slot is a singleton.
    databases: RwLock<Option<CacheEntry<Vec<String>>>>,
    /// Table names per database.
    table_names: RwLock<LruCache<String, CacheEntry<Vec<String>>>>,
    /// Descriptor per (database, table). `None` records a definitive
    /// "no such table" answer.
    tables: RwLock<LruCache<(String, String), CacheEntry<Option<TableDescriptor>>>>,
    /// Fully-assembled descriptor list per database.
    db_tables: RwLock<LruCache<String, CacheEntry<Vec<TableDescriptor>>>>,
    /// Per-key population locks for single-flight loading.
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl MetaCache {
    /// Create a cache whose maps each hold at most `capacity` keys.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            databases: RwLock::new(None),
            table_names: RwLock::new(LruCache::new(capacity)),
            tables: RwLock::new(LruCache::new(capacity)),
            db_tables: RwLock::new(LruCache::new(capacity)),
            locks: DashMap::new(),
        }
    }

    /// Population lock for a cache key. Hold it across the
    /// check-call-insert sequence to keep population single-flight.
    pub fn key_lock(&self, key: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    pub async fn get_databases(&self) -> Option<Vec<String>> {
        let slot = self.databases.read().await;
        slot.as_ref().map(|entry| {
            tracing::debug!("database list cache hit");
            entry.value.clone()
        })
    }

    pub async fn put_databases(&self, databases: Vec<String>) {
        let mut slot = self.databases.write().await;
        *slot = Some(CacheEntry::new(databases));
    }

    pub async fn get_table_names(&self, db: &str) -> Option<Vec<String>> {
        let cache = self.table_names.read().await;
        cache.peek(db).map(|entry| {
            tracing::debug!(db = %db, "table name cache hit");
            entry.value.clone()
        })
    }

    pub async fn put_table_names(&self, db: String, names: Vec<String>) {
        let mut cache = self.table_names.write().await;
        cache.put(db, CacheEntry::new(names));
    }

    pub async fn get_table(&self, db: &str, table: &str) -> Option<Option<TableDescriptor>> {
        let cache = self.tables.read().await;
        cache
            .peek(&(db.to_string(), table.to_string()))
            .map(|entry| {
                tracing::debug!(db = %db, table = %table, "table descriptor cache hit");
                entry.value.clone()
            })
    }

    pub async fn put_table(&self, db: String, table: String, descriptor: Option<TableDescriptor>) {
        let mut cache = self.tables.write().await;
        cache.put((db, table), CacheEntry::new(descriptor));
    }

    pub async fn get_db_tables(&self, db: &str) -> Option<Vec<TableDescriptor>> {
        let cache = self.db_tables.read().await;
        cache.peek(db).map(|entry| {
            tracing::debug!(db = %db, "database table cache hit");
            entry.value.clone()
        })
    }

    pub async fn put_db_tables(&self, db: String, tables: Vec<TableDescriptor>) {
        let mut cache = self.db_tables.write().await;
        cache.put(db, CacheEntry::new(tables));
    }

    /// External invalidation hook: drop every cached entry.
    pub async fn invalidate_all(&self) {
        {
            let mut slot = self.databases.write().await;
            *slot = None;
        }
        {
            let mut cache = self.table_names.write().await;
            cache.clear();
        }
        {
            let mut cache = self.tables.write().await;
            cache.clear();
        }
        {
            let mut cache = self.db_tables.write().await;
            cache.clear();
        }
        tracing::debug!("metastore cache cleared");
    }

    /// Age of the cached database list, if present. Mostly a diagnostics
    /// aid; entries never expire on their own.
    pub async fn databases_cached_for(&self) -> Option<std::time::Duration> {
        let slot = self.databases.read().await;
        slot.as_ref().map(|entry| entry.cached_at.elapsed())
    }
}
