//! Meridian Asset Core
//!
//! Core types, error taxonomy, and SQLite-backed asset store for the
//! Meridian metadata backend. An *asset* is a (database, table) entry of the
//! data-quality catalog, either mirrored from the remote metastore or
//! registered by a user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod error;
pub mod ops;
pub mod store;

pub use error::{AssetError, ErrorCode, Result};
pub use ops::{AssetService, AssetUpdate, NewAsset};
pub use store::{init_asset_schema, AssetStore, MAX_PAGE_SIZE};

/// Kind of data asset. Selects the operation handler used for CRUD dispatch;
/// adding a source type means adding a variant and its handler arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Hive,
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetKind::Hive => write!(f, "hive"),
        }
    }
}

impl std::str::FromStr for AssetKind {
    type Err = AssetError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hive" => Ok(AssetKind::Hive),
            _ => Err(AssetError::Validation(format!(
                "Unknown asset kind: {}",
                s
            ))),
        }
    }
}

/// Where an asset record came from.
///
/// Mirrored records are owned by the mirror process and must never be
/// created, updated, or deleted through the user-facing CRUD surface; the
/// reverse holds for user-registered records and the mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceOrigin {
    /// Produced by a mirror pass against the remote metastore.
    Mirrored,
    /// Registered explicitly through the asset API.
    UserRegistered,
}

impl SourceOrigin {
    /// Whether this origin denotes a mirrored record. Also the literal id
    /// suffix (`"true"` / `"false"`) that keeps mirrored and user-registered
    /// records for the same table distinct.
    pub fn is_mirrored(&self) -> bool {
        matches!(self, SourceOrigin::Mirrored)
    }
}

impl std::fmt::Display for SourceOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceOrigin::Mirrored => write!(f, "mirrored"),
            SourceOrigin::UserRegistered => write!(f, "user_registered"),
        }
    }
}

impl std::str::FromStr for SourceOrigin {
    type Err = AssetError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "mirrored" => Ok(SourceOrigin::Mirrored),
            "user_registered" => Ok(SourceOrigin::UserRegistered),
            _ => Err(AssetError::Validation(format!(
                "Unknown source origin: {}",
                s
            ))),
        }
    }
}

/// Derive the identity of an asset record.
///
/// Ids are never client-supplied: `{db}_{table}_{is_mirrored}` guarantees at
/// most one record per (database, table) per origin and makes repeated
/// mirror passes naturally idempotent.
pub fn asset_id(database_name: &str, table_name: &str, origin: SourceOrigin) -> String {
    format!("{}_{}_{}", database_name, table_name, origin.is_mirrored())
}

/// One column or partition key of a table schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    /// Type name as the metastore reports it (e.g. "string", "bigint").
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Semi-structured table schema: partition keys plus regular columns.
///
/// Persisted as serialized JSON text and parsed on demand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    #[serde(default)]
    pub partition_keys: Vec<SchemaField>,
    #[serde(default)]
    pub columns: Vec<SchemaField>,
}

impl SchemaDescriptor {
    /// Serialized form stored in the `schema_json` column.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| AssetError::Validation(format!("Cannot serialize schema: {}", e)))
    }

    /// Parse the stored serialized form.
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map_err(|e| AssetError::Validation(format!("Cannot parse stored schema: {}", e)))
    }
}

/// A catalog entry for one (database, table) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    /// Derived identity, see [`asset_id`].
    pub id: String,
    pub kind: AssetKind,
    /// Format/schema revision tag carried from the source.
    pub version: String,
    pub database_name: String,
    pub table_name: String,
    /// Storage URI of the table data.
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    pub schema: SchemaDescriptor,
    pub origin: SourceOrigin,
    /// UTC millis of the mirror pass that last refreshed this record.
    /// `None` for user-registered records, which no pass ever touches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_epoch: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}
