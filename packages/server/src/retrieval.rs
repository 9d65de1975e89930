use common::storage::{BlobStore, BoxReader, StorageError, UploadId};
use sea_orm::ConnectionTrait;
use thiserror::Error;

use crate::entity::upload;
use crate::ledger::{self, LedgerError};
use crate::utils::filename::decode_display_name;

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    /// The ledger knows the upload but its blob could not be read.
    #[error("blob read failed for upload {id}: {source}")]
    Storage {
        id: UploadId,
        #[source]
        source: StorageError,
    },
}

/// An open download: metadata plus a reader over the blob.
pub struct Download {
    pub record: upload::Model,
    /// Decoded original filename, suggested to the client.
    pub filename: String,
    pub size: u64,
    pub content: BoxReader,
}

/// Look up the metadata for an upload.
pub async fn fetch_record<C: ConnectionTrait>(
    db: &C,
    id: UploadId,
) -> Result<upload::Model, LedgerError> {
    ledger::get(db, id).await
}

/// Open the blob for an upload that has a ledger row.
///
/// Identifiers without a row are reported as not found without touching the
/// blob store.
pub async fn open_download<C: ConnectionTrait>(
    db: &C,
    blobs: &dyn BlobStore,
    id: UploadId,
) -> Result<Download, RetrievalError> {
    let record = ledger::get(db, id).await?;

    let storage_err = |source: StorageError| {
        if source.is_not_found() {
            tracing::warn!(upload_id = %id, "ledger row has no blob; orphaned upload");
        }
        RetrievalError::Storage { id, source }
    };

    let size = blobs.size(&id).await.map_err(storage_err)?;
    let content = blobs.get_stream(&id).await.map_err(storage_err)?;

    Ok(Download {
        filename: decode_display_name(&record.name),
        record,
        size,
        content,
    })
}
