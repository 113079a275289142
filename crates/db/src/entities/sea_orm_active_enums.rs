//! Postgres enum types shared by the entity definitions.
//!
//! Each workflow has its own status enum; there is no global status enum.
//! The `INACT` label marks soft-deleted rows across all three workflows.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Role of a user.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "user_role")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Regular employee; submits expense requests.
    #[sea_orm(string_value = "employee")]
    Employee,
    /// Finance officer; decides requests and reviews reconciliations.
    #[sea_orm(string_value = "finance_officer")]
    FinanceOfficer,
    /// Finance administrator; manages petty-cash accounts.
    #[sea_orm(string_value = "admin")]
    Admin,
}

/// Status of an expense request.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "expense_status")]
#[serde(rename_all = "lowercase")]
pub enum ExpenseStatus {
    /// Awaiting decision.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Approved, awaiting disbursement.
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Rejected (terminal).
    #[sea_orm(string_value = "rejected")]
    Rejected,
    /// Paid out.
    #[sea_orm(string_value = "disbursed")]
    Disbursed,
    /// Reconciled and closed (terminal).
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Soft-deleted.
    #[sea_orm(string_value = "INACT")]
    #[serde(rename = "INACT")]
    Inactive,
}

/// Kind of expense request.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "expense_type")]
#[serde(rename_all = "lowercase")]
pub enum ExpenseType {
    /// Employee already spent their own money.
    #[sea_orm(string_value = "reimbursement")]
    Reimbursement,
    /// Cash handed out first, reconciled afterwards.
    #[sea_orm(string_value = "disbursement")]
    Disbursement,
}

/// Status of a top-up request.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "topup_status")]
#[serde(rename_all = "lowercase")]
pub enum TopUpStatus {
    /// Awaiting decision.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Approved, awaiting disbursement into the account.
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Rejected (terminal).
    #[sea_orm(string_value = "rejected")]
    Rejected,
    /// Credited into the account (terminal).
    #[sea_orm(string_value = "complete")]
    Complete,
    /// Soft-deleted.
    #[sea_orm(string_value = "INACT")]
    #[serde(rename = "INACT")]
    Inactive,
}

/// Status of a disbursement reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "reconciliation_status")]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationStatus {
    /// Waiting for the employee to report actual spend.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Submitted, waiting for review.
    #[sea_orm(string_value = "under_review")]
    UnderReview,
    /// Accepted (terminal).
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Soft-deleted.
    #[sea_orm(string_value = "INACT")]
    #[serde(rename = "INACT")]
    Inactive,
}

/// Delivery channel of a notification.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "notification_channel")]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    /// Shown in the application inbox.
    #[sea_orm(string_value = "in_app")]
    InApp,
    /// Delivered by SMS.
    #[sea_orm(string_value = "sms")]
    Sms,
    /// Delivered by email.
    #[sea_orm(string_value = "email")]
    Email,
}
