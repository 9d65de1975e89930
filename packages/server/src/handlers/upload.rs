use std::path::Path as FsPath;

use axum::body::Body;
use axum::extract::multipart::{Field, MultipartError, MultipartRejection};
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::storage::UploadId;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{AppError, ErrorBody};
use crate::intake::{self, FilePart, RejectionReason, StoredUpload, UploadRequest};
use crate::models::upload::{UploadCreatedResponse, UploadForm, UploadResponse};
use crate::retrieval;
use crate::state::AppState;
use crate::utils::filename::content_disposition_value;

/// Body limit for the upload route: the file cap plus room for the text
/// fields and multipart framing.
pub fn upload_body_limit(max_upload_size: u64) -> DefaultBodyLimit {
    let max = usize::try_from(max_upload_size).unwrap_or(usize::MAX);
    DefaultBodyLimit::max(max.saturating_add(64 * 1024))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Uploads",
    operation_id = "uploadFile",
    summary = "Upload a file",
    description = "Stores the `file` part and returns its identifier. The `sender` and `receiver` \
        fields must be present but are not stored. The filename extension must be on the \
        allow-list (case-sensitive).",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "File stored", body = UploadCreatedResponse),
        (status = 400, description = "Rejected (NO_FILE_PART, NO_SENDER, NO_RECEIVER, \
            NO_FILENAME_SELECTED, DISALLOWED_EXTENSION, VALIDATION_ERROR)", body = ErrorBody),
        (status = 413, description = "File too large (PAYLOAD_TOO_LARGE)", body = ErrorBody),
        (status = 500, description = "Storage failure (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart))]
pub async fn upload_file(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, AppError> {
    // Anything that is not a multipart body cannot carry a file part.
    let multipart = multipart.map_err(|rejection| {
        tracing::debug!(error = %rejection, "upload is not multipart");
        AppError::Rejected(RejectionReason::NoFilePart)
    })?;

    let temp_path = std::env::temp_dir().join(format!("filedrop-upload-{}", Uuid::new_v4()));

    let result = receive_upload(&state, multipart, &temp_path).await;

    // Best effort.
    let _ = tokio::fs::remove_file(&temp_path).await;

    let stored = result?;
    let location = format!("/api/v1/uploads/{}", stored.id);

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(UploadCreatedResponse::from(stored)),
    ))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Uploads",
    operation_id = "getFile",
    summary = "Get file metadata",
    params(("id" = String, Path, description = "Upload ID (UUID)")),
    responses(
        (status = 200, description = "File metadata", body = UploadResponse),
        (status = 400, description = "Malformed ID (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Unknown ID (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn show_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UploadResponse>, AppError> {
    let id = parse_upload_id(&id)?;
    let record = retrieval::fetch_record(&state.db, id).await?;
    Ok(Json(UploadResponse::from(record)))
}

#[utoipa::path(
    get,
    path = "/{id}/download",
    tag = "Uploads",
    operation_id = "downloadFile",
    summary = "Download a file",
    description = "Streams the stored bytes as an attachment named after the original filename.",
    params(("id" = String, Path, description = "Upload ID (UUID)")),
    responses(
        (status = 200, description = "File content"),
        (status = 400, description = "Malformed ID (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Unknown ID (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn download_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_upload_id(&id)?;
    let download = retrieval::open_download(&state.db, &*state.blob_store, id).await?;

    let content_type = mime_guess::from_path(&download.filename).first_or_octet_stream();
    let body = Body::from_stream(ReaderStream::new(download.content));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type.as_ref())
        .header(header::CONTENT_LENGTH, download.size.to_string())
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_value(&download.filename),
        )
        .header(header::CACHE_CONTROL, "private, max-age=3600")
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}

fn parse_upload_id(raw: &str) -> Result<UploadId, AppError> {
    UploadId::parse(raw).map_err(|_| AppError::Validation("Invalid file ID".into()))
}

/// Collect the multipart fields, spooling the file part to `temp_path`, and
/// hand the request to the intake.
async fn receive_upload(
    state: &AppState,
    mut multipart: Multipart,
    temp_path: &FsPath,
) -> Result<StoredUpload, AppError> {
    let max_size = state.config.storage.max_upload_size;

    let mut file_name: Option<String> = None;
    let mut sender: Option<String> = None;
    let mut receiver: Option<String> = None;
    let mut seen_part = false;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            // A body with no parts at all is an upload without a file.
            Err(e) if !seen_part && e.status() != StatusCode::PAYLOAD_TOO_LARGE => {
                tracing::debug!(error = %e, "multipart body has no parts");
                break;
            }
            Err(e) => return Err(multipart_error(e, max_size)),
        };
        seen_part = true;

        match field.name() {
            Some("file") if file_name.is_none() => {
                // A part without a filename is a plain form value, not a file.
                if let Some(name) = field.file_name().map(str::to_owned) {
                    spool_field(field, temp_path, max_size).await?;
                    file_name = Some(name);
                }
            }
            Some("sender") => sender = Some(read_text(field, max_size).await?),
            Some("receiver") => receiver = Some(read_text(field, max_size).await?),
            _ => {} // Ignore unknown fields.
        }
    }

    let file = match file_name {
        Some(filename) => {
            let content = tokio::fs::File::open(temp_path)
                .await
                .map_err(|e| AppError::Internal(format!("Failed to reopen temp file: {e}")))?;
            Some(FilePart {
                filename,
                content: Box::new(content),
            })
        }
        None => None,
    };

    let request = UploadRequest {
        file,
        sender,
        receiver,
    };

    Ok(intake::accept_upload(&state.db, &*state.blob_store, &state.policy, request).await?)
}

async fn read_text(field: Field<'_>, max_size: u64) -> Result<String, AppError> {
    field.text().await.map_err(|e| multipart_error(e, max_size))
}

/// Stream a multipart field into a temp file, enforcing the size cap.
async fn spool_field(
    mut field: Field<'_>,
    temp_path: &FsPath,
    max_size: u64,
) -> Result<u64, AppError> {
    let mut temp_file = tokio::fs::File::create(temp_path)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to create temp file: {e}")))?;

    let mut total_size: u64 = 0;

    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| multipart_error(e, max_size))?
    {
        total_size += chunk.len() as u64;
        if total_size > max_size {
            return Err(AppError::PayloadTooLarge { limit: max_size });
        }
        temp_file
            .write_all(&chunk)
            .await
            .map_err(|e| AppError::Internal(format!("Temp file write failed: {e}")))?;
    }

    temp_file
        .flush()
        .await
        .map_err(|e| AppError::Internal(format!("Temp file flush failed: {e}")))?;

    Ok(total_size)
}

fn multipart_error(err: MultipartError, max_size: u64) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge { limit: max_size }
    } else {
        AppError::Validation(format!("Multipart error: {err}"))
    }
}
