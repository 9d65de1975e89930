use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::storage::StorageError;
use sea_orm::DbErr;
use serde::Serialize;

use crate::intake::{IntakeError, RejectionReason};
use crate::ledger::LedgerError;
use crate::retrieval::RetrievalError;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `NO_FILE_PART`,
    /// `NO_SENDER`, `NO_RECEIVER`, `NO_FILENAME_SELECTED`, `DISALLOWED_EXTENSION`,
    /// `PAYLOAD_TOO_LARGE`, `NOT_FOUND`, `INTERNAL_ERROR`.
    #[schema(example = "DISALLOWED_EXTENSION")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "File type is not allowed")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    Rejected(RejectionReason),
    PayloadTooLarge { limit: u64 },
    NotFound(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: msg,
                },
            ),
            AppError::Rejected(reason) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: reason.code(),
                    message: reason.to_string(),
                },
            ),
            AppError::PayloadTooLarge { limit } => (
                StatusCode::PAYLOAD_TOO_LARGE,
                ErrorBody {
                    code: "PAYLOAD_TOO_LARGE",
                    message: format!("File exceeds maximum size of {limit} bytes"),
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: msg,
                },
            ),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(_) => AppError::NotFound("File not found".into()),
            StorageError::InvalidId(_) => AppError::Validation("Invalid file ID".into()),
            StorageError::SizeLimitExceeded { limit, .. } => AppError::PayloadTooLarge { limit },
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotFound(_) => AppError::NotFound("File not found".into()),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<IntakeError> for AppError {
    fn from(err: IntakeError) -> Self {
        match err {
            IntakeError::Rejected(reason) => AppError::Rejected(reason),
            IntakeError::Ledger(e) => e.into(),
            IntakeError::Storage {
                source: StorageError::SizeLimitExceeded { limit, .. },
                ..
            } => AppError::PayloadTooLarge { limit },
            other @ IntakeError::Storage { .. } => AppError::Internal(other.to_string()),
        }
    }
}

impl From<RetrievalError> for AppError {
    fn from(err: RetrievalError) -> Self {
        match err {
            RetrievalError::Ledger(e) => e.into(),
            RetrievalError::Storage { source, .. } => source.into(),
        }
    }
}
