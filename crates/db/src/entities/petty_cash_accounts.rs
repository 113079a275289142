//! `SeaORM` Entity for the petty_cash_accounts table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "petty_cash_accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub account_type: String,
    pub phone_number: String,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub current_balance: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub minimum_threshold: Decimal,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::topup_requests::Entity")]
    TopupRequests,
}

impl Related<super::topup_requests::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TopupRequests.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
