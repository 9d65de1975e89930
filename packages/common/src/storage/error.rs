use thiserror::Error;

/// Errors that can occur during blob storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No blob is stored under the requested identifier.
    #[error("blob not found: {0}")]
    NotFound(String),
    /// A blob already exists under the identifier being written.
    #[error("blob already exists: {0}")]
    AlreadyExists(String),
    /// An I/O error occurred.
    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The provided identifier is not a canonical upload identifier.
    #[error("invalid upload identifier: {0}")]
    InvalidId(String),
    /// The blob exceeds the configured size limit.
    #[error("blob exceeds size limit ({actual} > {limit} bytes)")]
    SizeLimitExceeded { actual: u64, limit: u64 },
}

impl StorageError {
    /// Whether this error describes a lookup miss rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
