//! `SeaORM` Entity for the expense_requests table.
//!
//! Decision and disbursement details (who/when/why) live in the JSON
//! `metadata` map rather than first-class columns.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{ExpenseStatus, ExpenseType};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "expense_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub employee_id: Uuid,
    pub expense_type: ExpenseType,
    pub status: ExpenseStatus,
    pub title: String,
    pub description: String,
    pub phone_number: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub amount: Decimal,
    /// Uploaded receipt URLs (JSON array of strings).
    pub receipt_urls: Json,
    /// Decision/disbursement audit fields and update diffs.
    pub metadata: Json,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::EmployeeId",
        to = "super::users::Column::Id"
    )]
    Users,
    #[sea_orm(has_one = "super::disbursement_reconciliations::Entity")]
    DisbursementReconciliations,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::disbursement_reconciliations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DisbursementReconciliations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
