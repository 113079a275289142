//! `SeaORM` Entity for the disbursement_reconciliations table.
//!
//! Exactly one reconciliation exists per disbursed disbursement-type
//! expense request (unique on `expense_request_id`).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::ReconciliationStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "disbursement_reconciliations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub expense_request_id: Uuid,
    pub submitted_by: Uuid,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTimeWithTimeZone>,
    pub status: ReconciliationStatus,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub total_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))", nullable)]
    pub reconciled_amount: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))", nullable)]
    pub surplus_returned: Option<Decimal>,
    /// Uploaded receipt URLs (JSON array of strings); NULL until submitted.
    pub receipt_urls: Option<Json>,
    pub comments: Option<String>,
    pub metadata: Json,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::expense_requests::Entity",
        from = "Column::ExpenseRequestId",
        to = "super::expense_requests::Column::Id"
    )]
    ExpenseRequests,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::SubmittedBy",
        to = "super::users::Column::Id"
    )]
    Users,
}

impl Related<super::expense_requests::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExpenseRequests.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
