use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};

use super::error::StorageError;
use super::id::UploadId;
use super::traits::{BlobStore, BoxReader};

/// Filesystem-backed blob store.
///
/// Blobs live flat under the root directory, one file per upload, named by
/// the identifier's canonical text form: `{base_path}/{uuid}`. Partial writes
/// are staged in `{base_path}/.tmp` and linked into place.
pub struct FilesystemBlobStore {
    base_path: PathBuf,
    max_size: u64,
}

impl FilesystemBlobStore {
    /// Create a new filesystem blob store, creating the root if needed.
    pub async fn new(base_path: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self {
            base_path,
            max_size,
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Compute the filesystem path for a given upload.
    fn blob_path(&self, id: &UploadId) -> PathBuf {
        self.base_path.join(id.to_string())
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(UploadId::generate().to_string())
    }

    async fn write_temp(
        &self,
        temp_path: &Path,
        mut reader: BoxReader,
    ) -> Result<u64, StorageError> {
        let mut total_bytes: u64 = 0;
        let mut buf = vec![0u8; 64 * 1024]; // 64KB read buffer
        let mut temp_file = fs::File::create(temp_path).await?;

        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                break;
            }

            total_bytes += n as u64;
            if total_bytes > self.max_size {
                return Err(StorageError::SizeLimitExceeded {
                    actual: total_bytes,
                    limit: self.max_size,
                });
            }

            temp_file.write_all(&buf[..n]).await?;
        }

        temp_file.flush().await?;
        temp_file.sync_all().await?;
        Ok(total_bytes)
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn put_stream(&self, id: &UploadId, reader: BoxReader) -> Result<u64, StorageError> {
        if self.exists(id).await? {
            return Err(StorageError::AlreadyExists(id.to_string()));
        }

        let temp_path = self.temp_path();
        let total_bytes = match self.write_temp(&temp_path, reader).await {
            Ok(n) => n,
            Err(e) => {
                let _ = fs::remove_file(&temp_path).await;
                return Err(e);
            }
        };

        // Linking fails if the target exists, so a concurrent writer for the
        // same id can never be replaced.
        let linked = fs::hard_link(&temp_path, self.blob_path(id)).await;
        let _ = fs::remove_file(&temp_path).await;
        match linked {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(StorageError::AlreadyExists(id.to_string()));
            }
            Err(e) => return Err(e.into()),
        }

        tracing::debug!(upload_id = %id, bytes = total_bytes, "blob stored");
        Ok(total_bytes)
    }

    async fn get_stream(&self, id: &UploadId) -> Result<BoxReader, StorageError> {
        let blob_path = self.blob_path(id);
        match fs::File::open(&blob_path).await {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, id: &UploadId) -> Result<bool, StorageError> {
        let blob_path = self.blob_path(id);
        Ok(fs::try_exists(&blob_path).await?)
    }

    async fn size(&self, id: &UploadId) -> Result<u64, StorageError> {
        let blob_path = self.blob_path(id);
        match fs::metadata(&blob_path).await {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
