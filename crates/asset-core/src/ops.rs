//! CRUD operations over asset records.
//!
//! Dispatch is by [`AssetKind`]: each variant has a handler arm, so adding a
//! source type is an enum variant plus its arms, not runtime type
//! inspection. Origin protection lives here: user-facing mutations reject
//! records currently owned by the mirror.

use crate::error::{AssetError, ErrorCode, Result};
use crate::store::AssetStore;
use crate::{asset_id, AssetKind, AssetRecord, SchemaDescriptor, SourceOrigin};
use chrono::Utc;
use serde::Deserialize;

fn default_version() -> String {
    "1.2".to_string()
}

/// Payload for registering a user-supplied asset.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAsset {
    pub kind: AssetKind,
    pub database_name: String,
    pub table_name: String,
    pub location: String,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub schema: SchemaDescriptor,
    #[serde(default = "default_version")]
    pub version: String,
}

/// Partial update of a user-registered asset.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetUpdate {
    pub id: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub schema: Option<SchemaDescriptor>,
    #[serde(default)]
    pub version: Option<String>,
}

/// CRUD service over the asset store.
#[derive(Clone)]
pub struct AssetService {
    store: AssetStore,
}

impl AssetService {
    pub fn new(store: AssetStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &AssetStore {
        &self.store
    }

    /// Register a user-supplied asset. The id is derived, never taken from
    /// the request; a duplicate (db, table) registration is a conflict.
    pub async fn create(&self, req: NewAsset) -> Result<AssetRecord> {
        match req.kind {
            AssetKind::Hive => self.create_hive(req).await,
        }
    }

    pub async fn update(&self, req: AssetUpdate) -> Result<AssetRecord> {
        let record = self
            .store
            .find_by_id(&req.id)
            .await?
            .ok_or(AssetError::NotFound(ErrorCode::AssetNotFound))?;
        match record.kind {
            AssetKind::Hive => self.update_hive(record, req).await,
        }
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let record = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(AssetError::NotFound(ErrorCode::AssetNotFound))?;
        match record.kind {
            AssetKind::Hive => self.delete_hive(record).await,
        }
    }

    /// Paged listing, newest first.
    pub async fn list(
        &self,
        kind: Option<AssetKind>,
        page: usize,
        size: usize,
    ) -> Result<Vec<AssetRecord>> {
        self.store.list(kind, page, size).await
    }

    async fn create_hive(&self, req: NewAsset) -> Result<AssetRecord> {
        if req.database_name.trim().is_empty() || req.table_name.trim().is_empty() {
            return Err(AssetError::Validation(
                "database_name and table_name must be non-empty".to_string(),
            ));
        }

        let id = asset_id(&req.database_name, &req.table_name, SourceOrigin::UserRegistered);
        if self.store.find_by_id(&id).await?.is_some() {
            tracing::warn!(
                db = %req.database_name,
                table = %req.table_name,
                "user-registered asset already exists"
            );
            return Err(AssetError::Conflict(ErrorCode::AssetAlreadyExists));
        }

        let now = Utc::now();
        let record = AssetRecord {
            id,
            kind: AssetKind::Hive,
            version: req.version,
            database_name: req.database_name,
            table_name: req.table_name,
            location: req.location,
            owner: req.owner,
            schema: req.schema,
            origin: SourceOrigin::UserRegistered,
            sync_epoch: None,
            created_at: now,
            modified_at: now,
        };
        self.store.save(&record).await?;
        Ok(record)
    }

    async fn update_hive(&self, mut record: AssetRecord, req: AssetUpdate) -> Result<AssetRecord> {
        if record.origin == SourceOrigin::Mirrored {
            tracing::warn!(id = %record.id, "mirrored asset can not be updated");
            return Err(AssetError::Conflict(ErrorCode::MirroredAssetImmutable));
        }

        if let Some(location) = req.location {
            record.location = location;
        }
        if let Some(owner) = req.owner {
            record.owner = Some(owner);
        }
        if let Some(schema) = req.schema {
            record.schema = schema;
        }
        if let Some(version) = req.version {
            record.version = version;
        }
        record.modified_at = Utc::now();

        self.store.save(&record).await?;
        Ok(record)
    }

    async fn delete_hive(&self, record: AssetRecord) -> Result<()> {
        if record.origin == SourceOrigin::Mirrored {
            tracing::warn!(id = %record.id, "mirrored asset can not be deleted");
            return Err(AssetError::Conflict(ErrorCode::MirroredAssetImmutable));
        }
        self.store.delete(&record.id).await?;
        Ok(())
    }
}
