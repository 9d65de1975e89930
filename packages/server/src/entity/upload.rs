use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "upload")]
pub struct Model {
    /// UUIDv4 primary key; also the blob's file name.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Percent-encoded original filename. Display only.
    pub name: String,

    /// Set once by the ledger at insert time.
    pub time: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
