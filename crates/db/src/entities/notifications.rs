//! `SeaORM` Entity for the notifications table.
//!
//! Every notification references the ledger entry that caused it; the
//! foreign key is RESTRICT on delete, which also protects the ledger's
//! append-only guarantee.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::NotificationChannel;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub transaction_log_id: Uuid,
    pub recipient_id: Uuid,
    pub channel: NotificationChannel,
    pub is_read: bool,
    /// Set when `is_read` flips true, cleared when it flips false.
    pub read_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::transaction_logs::Entity",
        from = "Column::TransactionLogId",
        to = "super::transaction_logs::Column::Id"
    )]
    TransactionLogs,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::RecipientId",
        to = "super::users::Column::Id"
    )]
    Users,
}

impl Related<super::transaction_logs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TransactionLogs.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
