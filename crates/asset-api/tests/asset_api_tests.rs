//! Integration tests for the Meridian REST surface.
//!
//! Drives the router directly with `tower::ServiceExt::oneshot` against a
//! temporary SQLite store and a scripted in-memory metastore.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::Utc;
use meridian_asset_api::{app, AppState};
use meridian_asset_core::{
    asset_id, AssetKind, AssetRecord, AssetService, AssetStore, SchemaDescriptor, SourceOrigin,
};
use meridian_metastore::{
    FieldSchema, MetastoreClient, MetastoreConfig, MetastoreError, MetastoreService, MirrorRunner,
    StorageDescriptor, TableDescriptor,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;

struct ScriptedMetastore {
    tables: HashMap<String, Vec<String>>,
}

impl ScriptedMetastore {
    fn new(catalog: &[(&str, &[&str])]) -> Arc<Self> {
        let mut tables = HashMap::new();
        for (db, names) in catalog {
            tables.insert(
                db.to_string(),
                names.iter().map(|n| n.to_string()).collect(),
            );
        }
        Arc::new(Self { tables })
    }
}

#[async_trait]
impl MetastoreClient for ScriptedMetastore {
    async fn list_databases(&self) -> Result<Vec<String>, MetastoreError> {
        let mut databases: Vec<String> = self.tables.keys().cloned().collect();
        databases.sort();
        Ok(databases)
    }

    async fn list_tables(&self, db: &str) -> Result<Vec<String>, MetastoreError> {
        self.tables
            .get(db)
            .cloned()
            .ok_or_else(|| MetastoreError::NotFound(db.to_string()))
    }

    async fn get_table(&self, db: &str, table: &str) -> Result<TableDescriptor, MetastoreError> {
        let known = self
            .tables
            .get(db)
            .map(|names| names.iter().any(|n| n == table))
            .unwrap_or(false);
        if !known {
            return Err(MetastoreError::NotFound(format!("{}.{}", db, table)));
        }
        Ok(TableDescriptor {
            db_name: db.to_string(),
            table_name: table.to_string(),
            owner: Some("etl".to_string()),
            sd: StorageDescriptor {
                columns: vec![FieldSchema {
                    name: "id".to_string(),
                    field_type: "bigint".to_string(),
                    comment: None,
                }],
                partition_keys: vec![],
                location: format!("hdfs://warehouse/{}/{}", db, table),
            },
        })
    }

    async fn reconnect(&self) -> Result<(), MetastoreError> {
        Ok(())
    }
}

struct TestApp {
    router: Router,
    store: AssetStore,
    _dir: tempfile::TempDir,
}

fn test_app(catalog: &[(&str, &[&str])]) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let store = AssetStore::new(dir.path().join("assets.db"));

    let config = MetastoreConfig::builder("http://unused:8083").build().unwrap();
    let client = ScriptedMetastore::new(catalog);
    let metastore = Arc::new(MetastoreService::new(client, &config));
    let mirror = Arc::new(MirrorRunner::new(
        Arc::clone(&metastore),
        store.clone(),
        &config,
    ));

    let state = AppState {
        assets: AssetService::new(store.clone()),
        metastore,
        mirror,
    };

    TestApp {
        router: app(state),
        store,
        _dir: dir,
    }
}

async fn make_request(
    app: &Router,
    method: &str,
    path: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let request = Request::builder()
        .uri(path)
        .method(method)
        .header("Content-Type", "application/json")
        .body(match body {
            Some(v) => Body::from(serde_json::to_string(&v).unwrap()),
            None => Body::empty(),
        })
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).to_string()));
    (status, json)
}

fn mirrored_record(db: &str, table: &str, epoch: i64) -> AssetRecord {
    let now = Utc::now();
    AssetRecord {
        id: asset_id(db, table, SourceOrigin::Mirrored),
        kind: AssetKind::Hive,
        version: "1.2".to_string(),
        database_name: db.to_string(),
        table_name: table.to_string(),
        location: format!("hdfs://warehouse/{}/{}", db, table),
        owner: None,
        schema: SchemaDescriptor::default(),
        origin: SourceOrigin::Mirrored,
        sync_epoch: Some(epoch),
        created_at: now,
        modified_at: now,
    }
}

#[tokio::test]
async fn test_health() {
    let app = test_app(&[]);
    let (status, body) = make_request(&app.router, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("ok".to_string()));
}

#[tokio::test]
async fn test_create_asset_returns_created() {
    let app = test_app(&[]);
    let (status, body) = make_request(
        &app.router,
        "POST",
        "/api/v1/assets",
        Some(json!({
            "kind": "hive",
            "database_name": "sales",
            "table_name": "orders",
            "location": "s3://bucket/orders",
            "owner": "analyst"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], "sales_orders_false");
    assert_eq!(body["origin"], "user_registered");
}

#[tokio::test]
async fn test_duplicate_create_conflicts_with_code() {
    let app = test_app(&[]);
    let payload = json!({
        "kind": "hive",
        "database_name": "sales",
        "table_name": "orders",
        "location": "s3://bucket/orders"
    });

    make_request(&app.router, "POST", "/api/v1/assets", Some(payload.clone())).await;
    let (status, body) =
        make_request(&app.router, "POST", "/api/v1/assets", Some(payload)).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 40901);
}

#[tokio::test]
async fn test_update_mirrored_is_bad_request() {
    let app = test_app(&[]);
    app.store
        .save(&mirrored_record("sales", "orders", 100))
        .await
        .unwrap();

    let (status, body) = make_request(
        &app.router,
        "PUT",
        "/api/v1/assets",
        Some(json!({
            "id": "sales_orders_true",
            "location": "s3://elsewhere"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 40011);
}

#[tokio::test]
async fn test_delete_unknown_is_not_found() {
    let app = test_app(&[]);
    let (status, body) =
        make_request(&app.router, "DELETE", "/api/v1/assets/missing_false", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 40404);
}

#[tokio::test]
async fn test_delete_user_registered_no_content() {
    let app = test_app(&[]);
    make_request(
        &app.router,
        "POST",
        "/api/v1/assets",
        Some(json!({
            "kind": "hive",
            "database_name": "sales",
            "table_name": "orders",
            "location": "s3://bucket/orders"
        })),
    )
    .await;

    let (status, _) =
        make_request(&app.router, "DELETE", "/api/v1/assets/sales_orders_false", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(app.store.find_by_id("sales_orders_false").await.unwrap().is_none());
}

#[tokio::test]
async fn test_list_assets_filters_by_type() {
    let app = test_app(&[]);
    app.store
        .save(&mirrored_record("sales", "orders", 100))
        .await
        .unwrap();

    let (status, body) =
        make_request(&app.router, "GET", "/api/v1/assets?type=hive", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) =
        make_request(&app.router, "GET", "/api/v1/assets?type=bogus", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("bogus"));
}

#[tokio::test]
async fn test_metastore_lookup_routes() {
    let app = test_app(&[("sales", &["orders"])]);

    let (status, body) =
        make_request(&app.router, "GET", "/api/v1/metastore/databases", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(["sales"]));

    let (status, body) = make_request(
        &app.router,
        "GET",
        "/api/v1/metastore/databases/sales/tables",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(["orders"]));

    let (status, body) = make_request(
        &app.router,
        "GET",
        "/api/v1/metastore/databases/sales/tables/orders",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["table_name"], "orders");

    let (status, _) = make_request(
        &app.router,
        "GET",
        "/api/v1/metastore/databases/sales/tables/missing",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_sync_endpoint_runs_mirror_pass() {
    let app = test_app(&[("sales", &["orders", "refunds"])]);
    // stale record the pass should reconcile away
    app.store
        .save(&mirrored_record("sales", "retired", 100))
        .await
        .unwrap();

    let (status, body) =
        make_request(&app.router, "POST", "/api/v1/metastore/sync", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tables_mirrored"], 2);
    assert_eq!(body["records_deleted"], 1);

    assert!(app.store.find_by_id("sales_orders_true").await.unwrap().is_some());
    assert!(app.store.find_by_id("sales_retired_true").await.unwrap().is_none());
}
