//! HTTP mapping for asset errors.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use meridian_asset_core::{AssetError, ErrorCode};
use serde::Serialize;

/// JSON error body with the stable numeric code where one applies.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u32>,
    pub error: String,
}

/// API-level error carrying an HTTP status and the JSON body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: Option<u32>,
    message: String,
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            code: None,
            message: message.into(),
        }
    }
}

impl From<AssetError> for ApiError {
    fn from(err: AssetError) -> Self {
        let status = match &err {
            // an immutable-mirrored mutation is a bad request; a duplicate
            // registration is a conflict
            AssetError::Conflict(ErrorCode::MirroredAssetImmutable) => StatusCode::BAD_REQUEST,
            AssetError::Conflict(_) => StatusCode::CONFLICT,
            AssetError::NotFound(_) => StatusCode::NOT_FOUND,
            AssetError::Validation(_) => StatusCode::BAD_REQUEST,
            AssetError::Persistence(_) | AssetError::RemoteUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AssetError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            code: err.code(),
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                code: self.code,
                error: self.message,
            }),
        )
            .into_response()
    }
}
