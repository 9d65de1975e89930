use std::sync::Arc;

use common::storage::{BlobStore, FilesystemBlobStore, StorageError};
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::intake::UploadPolicy;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub blob_store: Arc<dyn BlobStore>,
    pub policy: Arc<UploadPolicy>,
    pub config: AppConfig,
}

impl AppState {
    /// Open the configured upload directory and wire it to `db`.
    pub async fn new(config: AppConfig, db: DatabaseConnection) -> Result<Self, StorageError> {
        let blob_store = FilesystemBlobStore::new(
            config.storage.upload_dir.clone(),
            config.storage.max_upload_size,
        )
        .await?;
        let policy = UploadPolicy::new(config.intake.allowed_extensions.iter().cloned());

        Ok(Self {
            db,
            blob_store: Arc::new(blob_store),
            policy: Arc::new(policy),
            config,
        })
    }
}
