//! `SeaORM` Entity for the topup_requests table.
//!
//! `requested_by` is NULL for auto-triggered top-ups; the system is the
//! requester.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::TopUpStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "topup_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub account_id: Uuid,
    pub requested_by: Option<Uuid>,
    pub decision_by: Option<Uuid>,
    pub status: TopUpStatus,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub amount: Decimal,
    pub request_reason: String,
    pub decision_reason: Option<String>,
    pub is_auto_triggered: bool,
    pub metadata: Json,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::petty_cash_accounts::Entity",
        from = "Column::AccountId",
        to = "super::petty_cash_accounts::Column::Id"
    )]
    PettyCashAccounts,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::RequestedBy",
        to = "super::users::Column::Id"
    )]
    Users,
}

impl Related<super::petty_cash_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PettyCashAccounts.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
