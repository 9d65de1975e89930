use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entity::upload;
use crate::intake::StoredUpload;
use crate::utils::filename::decode_display_name;

/// Multipart body accepted by the upload endpoint.
#[derive(utoipa::ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    /// The file to store. Its filename must carry an allowed extension.
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    /// Opaque sender identifier. Required, not stored.
    pub sender: String,
    /// Opaque receiver identifier. Required, not stored.
    pub receiver: String,
}

/// Response DTO for a stored upload.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UploadResponse {
    /// Upload ID (UUIDv4).
    #[schema(example = "67e55044-10b1-426f-9247-bb680e5fe0c8")]
    pub id: String,
    /// Percent-encoded filename as recorded in the ledger.
    #[schema(example = "quarterly%20report.pdf")]
    pub name: String,
    /// Original filename.
    #[schema(example = "quarterly report.pdf")]
    pub filename: String,
    pub time: DateTime<Utc>,
}

/// Response DTO returned right after an upload.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UploadCreatedResponse {
    #[serde(flatten)]
    pub upload: UploadResponse,
    /// Stored size in bytes.
    #[schema(example = 142857)]
    pub size: u64,
}

impl From<upload::Model> for UploadResponse {
    fn from(model: upload::Model) -> Self {
        Self {
            id: model.id.to_string(),
            filename: decode_display_name(&model.name),
            name: model.name,
            time: model.time,
        }
    }
}

impl From<StoredUpload> for UploadCreatedResponse {
    fn from(stored: StoredUpload) -> Self {
        Self {
            upload: UploadResponse::from(stored.record),
            size: stored.size,
        }
    }
}
