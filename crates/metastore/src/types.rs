//! Wire types for the metastore gateway, and their conversion into local
//! asset records.

use chrono::{DateTime, Utc};
use meridian_asset_core::{
    asset_id, AssetKind, AssetRecord, SchemaDescriptor, SchemaField, SourceOrigin,
};
use serde::{Deserialize, Serialize};

/// Version tag stamped on mirrored records.
pub const MIRRORED_ASSET_VERSION: &str = "1.2";

/// One column or partition key as the gateway reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl From<FieldSchema> for SchemaField {
    fn from(field: FieldSchema) -> Self {
        SchemaField {
            name: field.name,
            field_type: field.field_type,
            comment: field.comment,
        }
    }
}

/// Physical storage layout of a remote table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageDescriptor {
    #[serde(default)]
    pub columns: Vec<FieldSchema>,
    #[serde(default)]
    pub partition_keys: Vec<FieldSchema>,
    /// Storage URI of the table data.
    #[serde(default)]
    pub location: String,
}

/// Full descriptor of one remote table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    pub db_name: String,
    pub table_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default)]
    pub sd: StorageDescriptor,
}

impl TableDescriptor {
    /// Convert into a mirrored asset record stamped with the given pass
    /// epoch. The id carries the mirrored suffix, so repeated passes over an
    /// unchanged catalog upsert the same rows.
    pub fn into_asset_record(self, epoch: i64, now: DateTime<Utc>) -> AssetRecord {
        let id = asset_id(&self.db_name, &self.table_name, SourceOrigin::Mirrored);
        AssetRecord {
            id,
            kind: AssetKind::Hive,
            version: MIRRORED_ASSET_VERSION.to_string(),
            database_name: self.db_name,
            table_name: self.table_name,
            location: self.sd.location,
            owner: self.owner,
            schema: SchemaDescriptor {
                partition_keys: self.sd.partition_keys.into_iter().map(Into::into).collect(),
                columns: self.sd.columns.into_iter().map(Into::into).collect(),
            },
            origin: SourceOrigin::Mirrored,
            sync_epoch: Some(epoch),
            created_at: now,
            modified_at: now,
        }
    }
}

/// Response wrapper for the database listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabasesResponse {
    pub databases: Vec<String>,
}

/// Response wrapper for the table-name listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TablesResponse {
    pub tables: Vec<String>,
}
