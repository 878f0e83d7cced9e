//! Error taxonomy for asset operations.
//!
//! Remote-lookup failures are absorbed by the metastore service layer and
//! never reach callers of this crate; everything else propagates as a typed
//! error, with stable numeric codes on the user-visible conflict/not-found
//! cases.

/// Stable error codes surfaced in API error bodies.
///
/// The numeric values are part of the public contract and must not change
/// between releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// 400-class: the record is currently mirrored and cannot be mutated.
    MirroredAssetImmutable,
    /// 404-class: no record with the given id.
    AssetNotFound,
    /// 409-class: a user-registered record for this (db, table) exists.
    AssetAlreadyExists,
}

impl ErrorCode {
    pub fn code(&self) -> u32 {
        match self {
            ErrorCode::MirroredAssetImmutable => 40011,
            ErrorCode::AssetNotFound => 40404,
            ErrorCode::AssetAlreadyExists => 40901,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ErrorCode::MirroredAssetImmutable => "Mirrored asset can not be updated or deleted",
            ErrorCode::AssetNotFound => "Asset does not exist",
            ErrorCode::AssetAlreadyExists => "Asset already exists",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors that can occur in asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// The metastore call failed; callers degrade to an empty result.
    #[error("metastore unavailable: {0}")]
    RemoteUnavailable(String),

    /// The durable store failed; an in-progress mirror pass aborts before
    /// its deletion sweep when it sees this.
    #[error("SQLite error: {0}")]
    Persistence(#[from] rusqlite::Error),

    #[error("{}", .0.message())]
    Conflict(ErrorCode),

    #[error("{}", .0.message())]
    NotFound(ErrorCode),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("{0}")]
    Other(String),
}

impl AssetError {
    /// Stable numeric code for API error bodies, where one applies.
    pub fn code(&self) -> Option<u32> {
        match self {
            AssetError::Conflict(code) | AssetError::NotFound(code) => Some(code.code()),
            _ => None,
        }
    }
}

/// Result type for asset operations.
pub type Result<T> = std::result::Result<T, AssetError>;
