//! Metadata ledger: the `upload` table, keyed by upload identifier.
//!
//! Every function takes the connection explicitly so callers decide whether it
//! runs on the shared pool or inside a transaction.

use chrono::Utc;
use common::storage::UploadId;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, EntityTrait, Set, SqlErr};
use thiserror::Error;

use crate::entity::upload;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("upload {0} not found")]
    NotFound(UploadId),
    /// A fresh identifier collided with an existing row.
    #[error("upload {0} already exists in the ledger")]
    DuplicateKey(UploadId),
    #[error(transparent)]
    Db(#[from] DbErr),
}

/// Insert a new row, stamping `time` with the current UTC time.
pub async fn insert<C: ConnectionTrait>(
    db: &C,
    id: UploadId,
    name: &str,
) -> Result<upload::Model, LedgerError> {
    let row = upload::ActiveModel {
        id: Set(id.into_uuid()),
        name: Set(name.to_owned()),
        time: Set(Utc::now()),
    };

    match row.insert(db).await {
        Ok(model) => Ok(model),
        Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            tracing::error!(upload_id = %id, "ledger integrity violation: duplicate upload id");
            Err(LedgerError::DuplicateKey(id))
        }
        Err(err) => Err(err.into()),
    }
}

/// Point lookup by identifier.
pub async fn get<C: ConnectionTrait>(db: &C, id: UploadId) -> Result<upload::Model, LedgerError> {
    upload::Entity::find_by_id(id.into_uuid())
        .one(db)
        .await?
        .ok_or(LedgerError::NotFound(id))
}
