//! SQLite-backed durable store for asset records.
//!
//! All SQLite work runs in `tokio::task::spawn_blocking`; a
//! `rusqlite::Connection` is never held across an await point.

use crate::error::{AssetError, Result};
use crate::{AssetKind, AssetRecord, SchemaDescriptor, SourceOrigin};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Largest page size honored by paged listings.
pub const MAX_PAGE_SIZE: usize = 1024;

/// Initialize the asset schema. Idempotent.
pub fn init_asset_schema(conn: &Connection) -> Result<()> {
    let ddl = r#"
    CREATE TABLE IF NOT EXISTS assets (
      id TEXT PRIMARY KEY,
      kind TEXT NOT NULL,
      version TEXT NOT NULL,
      database_name TEXT NOT NULL,
      table_name TEXT NOT NULL,
      location TEXT NOT NULL,
      owner TEXT,
      schema_json TEXT NOT NULL,
      origin TEXT NOT NULL,
      sync_epoch INTEGER,
      created_at TEXT NOT NULL,
      modified_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_assets_origin ON assets(origin);
    CREATE INDEX IF NOT EXISTS idx_assets_sync_epoch ON assets(sync_epoch);
    CREATE INDEX IF NOT EXISTS idx_assets_created_at ON assets(created_at);
    "#;

    conn.execute_batch(ddl)?;
    Ok(())
}

/// Durable key-value store for asset records on a local SQLite file.
#[derive(Clone, Debug)]
pub struct AssetStore {
    path: PathBuf,
}

impl AssetStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `f` with a fresh connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = Connection::open(&path)?;
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            init_asset_schema(&conn)?;
            f(&mut conn)
        })
        .await
        .map_err(|e| AssetError::Other(format!("task join error: {}", e)))?
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<AssetRecord>> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            let record = conn
                .query_row(
                    &format!("SELECT {} FROM assets WHERE id = ?1", SELECT_COLUMNS),
                    params![id],
                    record_from_row,
                )
                .optional()?;
            Ok(record)
        })
        .await
    }

    /// Insert or refresh a single record. `created_at` of an existing row is
    /// preserved.
    pub async fn save(&self, record: &AssetRecord) -> Result<()> {
        let record = record.clone();
        self.with_conn(move |conn| upsert(conn, &record)).await
    }

    /// Insert or refresh a batch of records in one transaction.
    ///
    /// The batch is all-or-nothing: a failed statement rolls the whole batch
    /// back, so a mirror pass never leaves a half-written epoch behind.
    pub async fn save_all(&self, records: &[AssetRecord]) -> Result<()> {
        let records = records.to_vec();
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            for record in &records {
                upsert(&tx, record)?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }

    /// Delete by id. Returns whether a row existed.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            let deleted = conn.execute("DELETE FROM assets WHERE id = ?1", params![id])?;
            Ok(deleted > 0)
        })
        .await
    }

    /// Reconciliation sweep: purge mirrored records whose sync epoch is
    /// strictly below `epoch`. The origin predicate excludes user-registered
    /// records from any epoch comparison.
    pub async fn delete_mirrored_before(&self, epoch: i64) -> Result<usize> {
        self.with_conn(move |conn| {
            let deleted = conn.execute(
                "DELETE FROM assets
                 WHERE origin = 'mirrored' AND sync_epoch IS NOT NULL AND sync_epoch < ?1",
                params![epoch],
            )?;
            Ok(deleted)
        })
        .await
    }

    /// Paged listing, newest first. `size` is capped at [`MAX_PAGE_SIZE`].
    pub async fn list(
        &self,
        kind: Option<AssetKind>,
        page: usize,
        size: usize,
    ) -> Result<Vec<AssetRecord>> {
        let size = size.min(MAX_PAGE_SIZE);
        let offset = page.saturating_mul(size);
        self.with_conn(move |conn| {
            let mut records = Vec::new();
            match kind {
                Some(kind) => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {} FROM assets WHERE kind = ?1
                         ORDER BY created_at DESC, id LIMIT ?2 OFFSET ?3",
                        SELECT_COLUMNS
                    ))?;
                    let rows = stmt.query_map(
                        params![kind.to_string(), size as i64, offset as i64],
                        record_from_row,
                    )?;
                    for row in rows {
                        records.push(row?);
                    }
                }
                None => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {} FROM assets
                         ORDER BY created_at DESC, id LIMIT ?1 OFFSET ?2",
                        SELECT_COLUMNS
                    ))?;
                    let rows =
                        stmt.query_map(params![size as i64, offset as i64], record_from_row)?;
                    for row in rows {
                        records.push(row?);
                    }
                }
            }
            Ok(records)
        })
        .await
    }

    pub async fn count(&self) -> Result<usize> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM assets", [], |row| row.get(0))?;
            Ok(count as usize)
        })
        .await
    }
}

const SELECT_COLUMNS: &str = "id, kind, version, database_name, table_name, location, owner, \
                              schema_json, origin, sync_epoch, created_at, modified_at";

fn upsert(conn: &Connection, record: &AssetRecord) -> Result<()> {
    let schema_json = record.schema.to_json()?;
    conn.execute(
        "INSERT INTO assets (id, kind, version, database_name, table_name, location, owner,
                             schema_json, origin, sync_epoch, created_at, modified_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
         ON CONFLICT(id) DO UPDATE SET
             kind = excluded.kind,
             version = excluded.version,
             database_name = excluded.database_name,
             table_name = excluded.table_name,
             location = excluded.location,
             owner = excluded.owner,
             schema_json = excluded.schema_json,
             origin = excluded.origin,
             sync_epoch = excluded.sync_epoch,
             modified_at = excluded.modified_at",
        params![
            record.id,
            record.kind.to_string(),
            record.version,
            record.database_name,
            record.table_name,
            record.location,
            record.owner,
            schema_json,
            record.origin.to_string(),
            record.sync_epoch,
            record.created_at.to_rfc3339(),
            record.modified_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<AssetRecord> {
    let kind: String = row.get(1)?;
    let schema_json: String = row.get(7)?;
    let origin: String = row.get(8)?;
    let created_at: String = row.get(10)?;
    let modified_at: String = row.get(11)?;

    Ok(AssetRecord {
        id: row.get(0)?,
        kind: AssetKind::from_str(&kind).map_err(|e| text_conversion_err(1, e))?,
        version: row.get(2)?,
        database_name: row.get(3)?,
        table_name: row.get(4)?,
        location: row.get(5)?,
        owner: row.get(6)?,
        schema: SchemaDescriptor::from_json(&schema_json)
            .map_err(|e| text_conversion_err(7, e))?,
        origin: SourceOrigin::from_str(&origin).map_err(|e| text_conversion_err(8, e))?,
        sync_epoch: row.get(9)?,
        created_at: parse_timestamp(10, &created_at)?,
        modified_at: parse_timestamp(11, &modified_at)?,
    })
}

fn parse_timestamp(column: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                column,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}

fn text_conversion_err(column: usize, err: AssetError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{asset_id, SchemaField};
    use tempfile::tempdir;

    fn test_record(db: &str, table: &str, origin: SourceOrigin, epoch: Option<i64>) -> AssetRecord {
        let now = Utc::now();
        AssetRecord {
            id: asset_id(db, table, origin),
            kind: AssetKind::Hive,
            version: "1.2".to_string(),
            database_name: db.to_string(),
            table_name: table.to_string(),
            location: format!("hdfs://warehouse/{}/{}", db, table),
            owner: Some("etl".to_string()),
            schema: SchemaDescriptor {
                partition_keys: vec![SchemaField {
                    name: "dt".to_string(),
                    field_type: "string".to_string(),
                    comment: None,
                }],
                columns: vec![SchemaField {
                    name: "id".to_string(),
                    field_type: "bigint".to_string(),
                    comment: None,
                }],
            },
            origin,
            sync_epoch: epoch,
            created_at: now,
            modified_at: now,
        }
    }

    fn test_store(dir: &tempfile::TempDir) -> AssetStore {
        AssetStore::new(dir.path().join("assets.db"))
    }

    #[tokio::test]
    async fn test_save_and_find_round_trip() {
        let dir = tempdir().unwrap();
        let store = test_store(&dir);

        let record = test_record("sales", "orders", SourceOrigin::Mirrored, Some(100));
        store.save(&record).await.unwrap();

        let found = store.find_by_id("sales_orders_true").await.unwrap().unwrap();
        assert_eq!(found.database_name, "sales");
        assert_eq!(found.table_name, "orders");
        assert_eq!(found.sync_epoch, Some(100));
        assert_eq!(found.schema, record.schema);
        assert_eq!(found.origin, SourceOrigin::Mirrored);
    }

    #[tokio::test]
    async fn test_find_missing_is_none() {
        let dir = tempdir().unwrap();
        let store = test_store(&dir);

        assert!(store.find_by_id("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_refreshes_epoch() {
        let dir = tempdir().unwrap();
        let store = test_store(&dir);

        let mut record = test_record("sales", "orders", SourceOrigin::Mirrored, Some(100));
        store.save(&record).await.unwrap();

        record.sync_epoch = Some(200);
        record.location = "hdfs://warehouse/sales/orders_v2".to_string();
        store.save(&record).await.unwrap();

        let found = store.find_by_id(&record.id).await.unwrap().unwrap();
        assert_eq!(found.sync_epoch, Some(200));
        assert_eq!(found.location, "hdfs://warehouse/sales/orders_v2");
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_sweep_deletes_only_stale_mirrored() {
        let dir = tempdir().unwrap();
        let store = test_store(&dir);

        store
            .save_all(&[
                test_record("db1", "t1", SourceOrigin::Mirrored, Some(100)),
                test_record("db1", "t2", SourceOrigin::Mirrored, Some(200)),
                test_record("db1", "t3", SourceOrigin::UserRegistered, None),
            ])
            .await
            .unwrap();

        let deleted = store.delete_mirrored_before(200).await.unwrap();
        assert_eq!(deleted, 1);

        assert!(store.find_by_id("db1_t1_true").await.unwrap().is_none());
        assert!(store.find_by_id("db1_t2_true").await.unwrap().is_some());
        // user-registered record survives any epoch comparison
        assert!(store.find_by_id("db1_t3_false").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_by_id() {
        let dir = tempdir().unwrap();
        let store = test_store(&dir);

        let record = test_record("db1", "t1", SourceOrigin::UserRegistered, None);
        store.save(&record).await.unwrap();

        assert!(store.delete(&record.id).await.unwrap());
        assert!(!store.delete(&record.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_pages_and_caps_size() {
        let dir = tempdir().unwrap();
        let store = test_store(&dir);

        let records: Vec<AssetRecord> = (0..5)
            .map(|i| test_record("db1", &format!("t{}", i), SourceOrigin::Mirrored, Some(100)))
            .collect();
        store.save_all(&records).await.unwrap();

        let page = store.list(None, 0, 3).await.unwrap();
        assert_eq!(page.len(), 3);
        let page = store.list(None, 1, 3).await.unwrap();
        assert_eq!(page.len(), 2);

        // an absurd size is capped rather than rejected
        let all = store.list(None, 0, MAX_PAGE_SIZE * 10).await.unwrap();
        assert_eq!(all.len(), 5);

        let hive = store.list(Some(AssetKind::Hive), 0, 10).await.unwrap();
        assert_eq!(hive.len(), 5);
    }
}
