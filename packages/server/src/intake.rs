//! Upload intake: validate a request, then pair a ledger row with a blob.
//!
//! The ledger row is written before the blob. A blob failure therefore leaves
//! a detectable orphan row instead of bytes nobody can find.

use std::collections::HashSet;

use common::storage::{BlobStore, BoxReader, StorageError, UploadId};
use sea_orm::ConnectionTrait;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::entity::upload;
use crate::ledger::{self, LedgerError};
use crate::utils::filename::{encode_display_name, file_extension};

pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &[
    "txt", "doc", "docx", "hwp", "pdf", "png", "jpg", "jpeg", "gif", "wav", "wma", "mp3", "aiff",
    "mov", "avi", "wmv", "mp4", "zip",
];

/// Why an upload request was turned away. No side effects have occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RejectionReason {
    #[error("No file part")]
    NoFilePart,
    #[error("No sender")]
    NoSender,
    #[error("No receiver")]
    NoReceiver,
    #[error("No file selected")]
    NoFilenameSelected,
    #[error("File type is not allowed")]
    DisallowedExtension,
}

impl RejectionReason {
    /// Machine-readable code used in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoFilePart => "NO_FILE_PART",
            Self::NoSender => "NO_SENDER",
            Self::NoReceiver => "NO_RECEIVER",
            Self::NoFilenameSelected => "NO_FILENAME_SELECTED",
            Self::DisallowedExtension => "DISALLOWED_EXTENSION",
        }
    }
}

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("upload rejected: {0}")]
    Rejected(#[from] RejectionReason),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    /// The ledger row for `id` exists but its blob could not be written.
    #[error("blob write failed for upload {id}: {source}")]
    Storage {
        id: UploadId,
        #[source]
        source: StorageError,
    },
}

/// The file portion of an upload request.
pub struct FilePart {
    /// Filename as sent by the client. May be empty.
    pub filename: String,
    pub content: BoxReader,
}

/// Everything the intake needs from one request.
#[derive(Default)]
pub struct UploadRequest {
    pub file: Option<FilePart>,
    pub sender: Option<String>,
    pub receiver: Option<String>,
}

/// Extension allow-list. Matching is exact and case-sensitive.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    allowed_extensions: HashSet<String>,
}

impl UploadPolicy {
    pub fn new<I, S>(allowed_extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_extensions: allowed_extensions.into_iter().map(Into::into).collect(),
        }
    }

    pub fn allows(&self, filename: &str) -> bool {
        file_extension(filename).is_some_and(|ext| self.allowed_extensions.contains(ext))
    }
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_EXTENSIONS.iter().copied())
    }
}

/// Check a request in order, stopping at the first failure.
pub fn validate(
    request: UploadRequest,
    policy: &UploadPolicy,
) -> Result<FilePart, RejectionReason> {
    let file = request.file.ok_or(RejectionReason::NoFilePart)?;
    if request.sender.is_none() {
        return Err(RejectionReason::NoSender);
    }
    if request.receiver.is_none() {
        return Err(RejectionReason::NoReceiver);
    }
    if file.filename.is_empty() {
        return Err(RejectionReason::NoFilenameSelected);
    }
    if !policy.allows(&file.filename) {
        return Err(RejectionReason::DisallowedExtension);
    }
    Ok(file)
}

/// A completed upload.
#[derive(Debug, Clone)]
pub struct StoredUpload {
    pub id: UploadId,
    pub record: upload::Model,
    pub size: u64,
}

/// Validate `request`, record it in the ledger, then store its content.
///
/// The identifier is only returned once both the row and the blob exist.
pub async fn accept_upload<C: ConnectionTrait>(
    db: &C,
    blobs: &dyn BlobStore,
    policy: &UploadPolicy,
    request: UploadRequest,
) -> Result<StoredUpload, IntakeError> {
    debug!(
        has_file = request.file.is_some(),
        has_sender = request.sender.is_some(),
        has_receiver = request.receiver.is_some(),
        "upload received"
    );
    let file = validate(request, policy).inspect_err(|reason| {
        info!(reason = %reason, "upload rejected");
    })?;
    debug!(filename = %file.filename, "upload validated");

    let id = UploadId::generate();
    let name = encode_display_name(&file.filename);
    debug!(upload_id = %id, name = %name, "identifier assigned");

    let record = ledger::insert(db, id, &name).await?;
    debug!(upload_id = %id, "metadata persisted");

    let size = match blobs.put_stream(&id, file.content).await {
        Ok(size) => size,
        Err(source) => {
            error!(
                upload_id = %id,
                error = %source,
                "blob write failed after ledger insert; ledger row is orphaned"
            );
            return Err(IntakeError::Storage { id, source });
        }
    };

    info!(upload_id = %id, size, "upload complete");
    Ok(StoredUpload { id, record, size })
}
