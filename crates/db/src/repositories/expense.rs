//! Expense request repository.
//!
//! Drives the expense request lifecycle: submission, decision,
//! disbursement (which atomically creates the paired reconciliation for
//! disbursement-type requests), updates, and deactivation. Every mutation
//! locks the row, validates the transition through `imprest-core`, appends
//! the audit entry, and fans out notifications in one transaction.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde_json::json;
use uuid::Uuid;

use imprest_core::ledger::{EntityRef, EventCode};
use imprest_core::workflow::{
    Decision, ExpenseAction, ExpenseWorkflow, Outcome, WorkflowError,
};

use crate::entities::{
    disbursement_reconciliations, expense_requests,
    sea_orm_active_enums::{
        ExpenseStatus, ExpenseType, NotificationChannel, ReconciliationStatus,
    },
};
use crate::repositories::ledger::{LedgerRepository, LogInput, INACTIVE_STATUS};
use crate::repositories::merge_json;
use crate::repositories::notification::NotificationRepository;
use crate::repositories::user::UserRepository;

/// Error types for expense request operations.
#[derive(Debug, thiserror::Error)]
pub enum ExpenseError {
    /// Expense request not found or not active.
    #[error("Expense request not found: {0}")]
    NotFound(Uuid),

    /// Workflow rule violation.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// Audit log write failed.
    #[error(transparent)]
    Logging(#[from] crate::repositories::ledger::LedgerError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl ExpenseError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Workflow(e) => e.status_code(),
            Self::Logging(e) => e.status_code(),
            Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Workflow(e) => e.error_code(),
            Self::Logging(e) => e.error_code(),
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

/// Input for creating an expense request.
#[derive(Debug, Clone)]
pub struct CreateExpenseInput {
    /// The employee submitting the request.
    pub employee_id: Uuid,
    /// Reimbursement or disbursement.
    pub expense_type: ExpenseType,
    /// Requested amount.
    pub amount: Decimal,
    /// Short title.
    pub title: String,
    /// Detailed description.
    pub description: String,
    /// Payout phone number for disbursement-type requests.
    pub phone_number: Option<String>,
    /// Uploaded receipt URLs. Required for reimbursement requests.
    pub receipt_urls: Vec<String>,
}

/// Input for updating a pending expense request.
#[derive(Debug, Clone, Default)]
pub struct UpdateExpenseInput {
    /// Short title.
    pub title: Option<String>,
    /// Detailed description.
    pub description: Option<String>,
    /// Payout phone number.
    pub phone_number: Option<String>,
    /// Requested amount.
    pub amount: Option<Decimal>,
    /// Uploaded receipt URLs.
    pub receipt_urls: Option<Vec<String>>,
}

/// Repository for expense requests.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    db: DatabaseConnection,
}

impl ExpenseRepository {
    /// Creates a new expense repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Submits a new expense request.
    ///
    /// Reimbursement requests must carry at least one receipt; the status
    /// initializes to pending. Finance officers are notified.
    ///
    /// # Errors
    ///
    /// * `ExpenseError::Workflow` for a non-positive amount or a
    ///   reimbursement without receipt
    pub async fn create(
        &self,
        input: CreateExpenseInput,
        ip_address: Option<String>,
    ) -> Result<expense_requests::Model, ExpenseError> {
        let status = ExpenseWorkflow::create(
            expense_type_to_core(&input.expense_type),
            input.amount,
            input.receipt_urls.len(),
        )?;

        let txn = self.db.begin().await?;

        let now = Utc::now().into();
        let expense = expense_requests::ActiveModel {
            id: Set(Uuid::new_v4()),
            employee_id: Set(input.employee_id),
            expense_type: Set(input.expense_type.clone()),
            status: Set(expense_status_from_core(status)),
            title: Set(input.title),
            description: Set(input.description),
            phone_number: Set(input.phone_number),
            amount: Set(input.amount),
            receipt_urls: Set(json!(input.receipt_urls)),
            metadata: Set(json!({})),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let expense = expense.insert(&txn).await?;

        let log = LedgerRepository::append(
            &txn,
            LogInput::new(
                EventCode::ExpenseSubmitted,
                EntityRef::ExpenseRequest(expense.id),
                format!("Expense request \"{}\" submitted", expense.title),
            )
            .triggered_by(input.employee_id)
            .metadata(json!({
                "expense_id": expense.id.to_string(),
                "title": expense.title.clone(),
                "amount": expense.amount.to_string(),
                "expense_type": expense.expense_type.clone(),
                "employee_id": input.employee_id.to_string(),
                "receipt_urls": expense.receipt_urls.clone(),
                "action": "create",
            }))
            .ip_address(ip_address),
        )
        .await?;

        let officers = UserRepository::finance_officer_ids(&txn).await?;
        NotificationRepository::notify_many(&txn, &log, &officers, NotificationChannel::InApp)
            .await?;

        txn.commit().await?;
        Ok(expense)
    }

    /// Finds an active expense request by id.
    ///
    /// # Errors
    ///
    /// Returns `ExpenseError::NotFound` when missing or inactive.
    pub async fn get(&self, expense_id: Uuid) -> Result<expense_requests::Model, ExpenseError> {
        expense_requests::Entity::find_by_id(expense_id)
            .filter(expense_requests::Column::IsActive.eq(true))
            .one(&self.db)
            .await?
            .ok_or(ExpenseError::NotFound(expense_id))
    }

    /// All active expense requests, most recent first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_all(&self) -> Result<Vec<expense_requests::Model>, ExpenseError> {
        let rows = expense_requests::Entity::find()
            .filter(expense_requests::Column::IsActive.eq(true))
            .order_by_desc(expense_requests::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(rows)
    }

    /// The employee's own expense requests, most recent first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_for_employee(
        &self,
        employee_id: Uuid,
    ) -> Result<Vec<expense_requests::Model>, ExpenseError> {
        let rows = expense_requests::Entity::find()
            .filter(expense_requests::Column::EmployeeId.eq(employee_id))
            .filter(expense_requests::Column::IsActive.eq(true))
            .order_by_desc(expense_requests::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(rows)
    }

    /// Approves or rejects a pending expense request.
    ///
    /// Idempotent: repeating an identical decision returns the row
    /// unchanged and appends no second audit entry. Decision metadata
    /// (who/when/why) goes into the request's JSON metadata map.
    ///
    /// # Errors
    ///
    /// * `ExpenseError::NotFound` when missing or inactive
    /// * `ExpenseError::Workflow` for an illegal transition
    pub async fn decide(
        &self,
        expense_id: Uuid,
        decision: Decision,
        actor: Uuid,
        reason: Option<String>,
        ip_address: Option<String>,
    ) -> Result<expense_requests::Model, ExpenseError> {
        let txn = self.db.begin().await?;

        let expense = expense_requests::Entity::find_by_id(expense_id)
            .filter(expense_requests::Column::IsActive.eq(true))
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(ExpenseError::NotFound(expense_id))?;

        let current = expense_status_to_core(&expense.status);
        let outcome = ExpenseWorkflow::decide(current, decision, actor, reason.clone())?;

        let Outcome::Apply(action) = outcome else {
            txn.commit().await?;
            return Ok(expense);
        };

        let ExpenseAction::Decide {
            new_status,
            decided_at,
            ..
        } = &action
        else {
            unreachable!("decide returns a Decide action");
        };

        let metadata = merge_json(
            &expense.metadata,
            json!({
                "decision_by": actor.to_string(),
                "decision_at": decided_at.to_rfc3339(),
                "decision_reason": reason.clone(),
            }),
        );

        let employee_id = expense.employee_id;
        let title = expense.title.clone();
        let mut active: expense_requests::ActiveModel = expense.into();
        active.status = Set(expense_status_from_core(*new_status));
        active.metadata = Set(metadata);
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await?;

        let (event, verb) = match decision {
            Decision::Approve => (EventCode::ExpenseApproved, "approved"),
            Decision::Reject => (EventCode::ExpenseRejected, "rejected"),
        };

        let log = LedgerRepository::append(
            &txn,
            LogInput::new(
                event,
                EntityRef::ExpenseRequest(updated.id),
                format!("Expense request \"{title}\" {verb}"),
            )
            .triggered_by(actor)
            .metadata(json!({
                "expense_id": updated.id.to_string(),
                "title": title,
                "decision": verb,
                "decision_by": actor.to_string(),
                "decision_reason": reason,
            }))
            .ip_address(ip_address),
        )
        .await?;

        NotificationRepository::notify(&txn, &log, employee_id, NotificationChannel::InApp)
            .await?;

        txn.commit().await?;
        Ok(updated)
    }

    /// Pays out an approved expense request.
    ///
    /// For disbursement-type requests the paired reconciliation row is
    /// created in the same transaction as the status flip, so the two can
    /// never diverge. Idempotent when already disbursed (no second
    /// reconciliation is created).
    ///
    /// # Errors
    ///
    /// * `ExpenseError::NotFound` when missing or inactive
    /// * `ExpenseError::Workflow` if the request is not approved
    pub async fn disburse(
        &self,
        expense_id: Uuid,
        actor: Uuid,
        ip_address: Option<String>,
    ) -> Result<
        (
            expense_requests::Model,
            Option<disbursement_reconciliations::Model>,
        ),
        ExpenseError,
    > {
        let txn = self.db.begin().await?;

        let expense = expense_requests::Entity::find_by_id(expense_id)
            .filter(expense_requests::Column::IsActive.eq(true))
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(ExpenseError::NotFound(expense_id))?;

        let current = expense_status_to_core(&expense.status);
        let outcome = ExpenseWorkflow::disburse(
            current,
            expense_type_to_core(&expense.expense_type),
            actor,
        )?;

        let Outcome::Apply(action) = outcome else {
            txn.commit().await?;
            return Ok((expense, None));
        };

        let ExpenseAction::Disburse {
            new_status,
            disbursed_at,
            creates_reconciliation,
            ..
        } = &action
        else {
            unreachable!("disburse returns a Disburse action");
        };

        let metadata = merge_json(
            &expense.metadata,
            json!({
                "disbursed_by": actor.to_string(),
                "disbursed_at": disbursed_at.to_rfc3339(),
            }),
        );

        let employee_id = expense.employee_id;
        let title = expense.title.clone();
        let amount = expense.amount;
        let mut active: expense_requests::ActiveModel = expense.into();
        active.status = Set(expense_status_from_core(*new_status));
        active.metadata = Set(metadata);
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await?;

        let reconciliation = if *creates_reconciliation {
            let now = Utc::now().into();
            let row = disbursement_reconciliations::ActiveModel {
                id: Set(Uuid::new_v4()),
                expense_request_id: Set(updated.id),
                submitted_by: Set(employee_id),
                approved_by: Set(None),
                approved_at: Set(None),
                status: Set(ReconciliationStatus::Pending),
                total_amount: Set(amount),
                reconciled_amount: Set(None),
                surplus_returned: Set(None),
                receipt_urls: Set(None),
                comments: Set(None),
                metadata: Set(json!({})),
                is_active: Set(true),
                created_at: Set(now),
                updated_at: Set(now),
            };
            Some(row.insert(&txn).await?)
        } else {
            None
        };

        let log = LedgerRepository::append(
            &txn,
            LogInput::new(
                EventCode::ExpenseDisbursed,
                EntityRef::ExpenseRequest(updated.id),
                format!("Expense request \"{title}\" disbursed"),
            )
            .triggered_by(actor)
            .metadata(json!({
                "expense_id": updated.id.to_string(),
                "title": title,
                "amount": amount.to_string(),
                "disbursed_by": actor.to_string(),
                "reconciliation_id": reconciliation.as_ref().map(|r| r.id.to_string()),
            }))
            .ip_address(ip_address),
        )
        .await?;

        NotificationRepository::notify(&txn, &log, employee_id, NotificationChannel::InApp)
            .await?;

        txn.commit().await?;
        Ok((updated, reconciliation))
    }

    /// Updates a pending expense request, recording the old and new values.
    ///
    /// Decided requests are immutable through this path.
    ///
    /// # Errors
    ///
    /// * `ExpenseError::NotFound` when missing or inactive
    /// * `ExpenseError::Workflow` when no longer editable, for a
    ///   non-positive amount, or when a reimbursement would lose its receipt
    pub async fn update(
        &self,
        expense_id: Uuid,
        input: UpdateExpenseInput,
        actor: Uuid,
        ip_address: Option<String>,
    ) -> Result<expense_requests::Model, ExpenseError> {
        let txn = self.db.begin().await?;

        let expense = expense_requests::Entity::find_by_id(expense_id)
            .filter(expense_requests::Column::IsActive.eq(true))
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(ExpenseError::NotFound(expense_id))?;

        ExpenseWorkflow::ensure_editable(expense_status_to_core(&expense.status))?;

        if let Some(amount) = input.amount {
            if amount <= Decimal::ZERO {
                return Err(WorkflowError::NonPositiveAmount(amount).into());
            }
        }
        if let Some(receipt_urls) = &input.receipt_urls {
            if expense.expense_type == ExpenseType::Reimbursement && receipt_urls.is_empty() {
                return Err(WorkflowError::ReceiptRequired.into());
            }
        }

        let mut old_values = serde_json::Map::new();
        let mut new_values = serde_json::Map::new();
        let mut active: expense_requests::ActiveModel = expense.clone().into();

        if let Some(title) = input.title {
            old_values.insert("title".into(), json!(expense.title));
            new_values.insert("title".into(), json!(title));
            active.title = Set(title);
        }
        if let Some(description) = input.description {
            old_values.insert("description".into(), json!(expense.description));
            new_values.insert("description".into(), json!(description));
            active.description = Set(description);
        }
        if let Some(phone_number) = input.phone_number {
            old_values.insert("phone_number".into(), json!(expense.phone_number));
            new_values.insert("phone_number".into(), json!(phone_number));
            active.phone_number = Set(Some(phone_number));
        }
        if let Some(amount) = input.amount {
            old_values.insert("amount".into(), json!(expense.amount.to_string()));
            new_values.insert("amount".into(), json!(amount.to_string()));
            active.amount = Set(amount);
        }
        if let Some(receipt_urls) = input.receipt_urls {
            old_values.insert("receipt_urls".into(), expense.receipt_urls.clone());
            new_values.insert("receipt_urls".into(), json!(receipt_urls));
            active.receipt_urls = Set(json!(receipt_urls));
        }

        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await?;

        LedgerRepository::append(
            &txn,
            LogInput::new(
                EventCode::ExpenseUpdated,
                EntityRef::ExpenseRequest(updated.id),
                format!("Expense request \"{}\" updated", updated.title),
            )
            .triggered_by(actor)
            .metadata(json!({
                "expense_id": updated.id.to_string(),
                "title": updated.title,
                "updated_fields": old_values.keys().collect::<Vec<_>>(),
                "old_values": old_values,
                "new_values": new_values,
                "updated_by": actor.to_string(),
                "action": "update",
            }))
            .ip_address(ip_address),
        )
        .await?;

        txn.commit().await?;
        Ok(updated)
    }

    /// Soft-deletes an expense request from any state.
    ///
    /// # Errors
    ///
    /// Returns `ExpenseError::NotFound` when missing.
    pub async fn deactivate(
        &self,
        expense_id: Uuid,
        actor: Uuid,
        ip_address: Option<String>,
    ) -> Result<expense_requests::Model, ExpenseError> {
        let txn = self.db.begin().await?;

        let expense = expense_requests::Entity::find_by_id(expense_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(ExpenseError::NotFound(expense_id))?;

        let action = ExpenseWorkflow::deactivate();
        let title = expense.title.clone();
        let mut active: expense_requests::ActiveModel = expense.into();
        active.status = Set(expense_status_from_core(action.new_status()));
        active.is_active = Set(false);
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await?;

        LedgerRepository::append(
            &txn,
            LogInput::new(
                EventCode::ExpenseDeactivated,
                EntityRef::ExpenseRequest(updated.id),
                format!("Expense request \"{title}\" deactivated"),
            )
            .triggered_by(actor)
            .status_code(INACTIVE_STATUS)
            .metadata(json!({
                "expense_id": updated.id.to_string(),
                "title": title,
                "deactivated_by": actor.to_string(),
                "action": "deactivate",
            }))
            .ip_address(ip_address),
        )
        .await?;

        txn.commit().await?;
        Ok(updated)
    }
}

// ============================================================================
// Conversion helpers
// ============================================================================

/// Converts the database expense status to the core status.
pub(crate) fn expense_status_to_core(
    status: &ExpenseStatus,
) -> imprest_core::workflow::ExpenseStatus {
    match status {
        ExpenseStatus::Pending => imprest_core::workflow::ExpenseStatus::Pending,
        ExpenseStatus::Approved => imprest_core::workflow::ExpenseStatus::Approved,
        ExpenseStatus::Rejected => imprest_core::workflow::ExpenseStatus::Rejected,
        ExpenseStatus::Disbursed => imprest_core::workflow::ExpenseStatus::Disbursed,
        ExpenseStatus::Completed => imprest_core::workflow::ExpenseStatus::Completed,
        ExpenseStatus::Inactive => imprest_core::workflow::ExpenseStatus::Inactive,
    }
}

/// Converts the core expense status to the database status.
pub(crate) fn expense_status_from_core(
    status: imprest_core::workflow::ExpenseStatus,
) -> ExpenseStatus {
    match status {
        imprest_core::workflow::ExpenseStatus::Pending => ExpenseStatus::Pending,
        imprest_core::workflow::ExpenseStatus::Approved => ExpenseStatus::Approved,
        imprest_core::workflow::ExpenseStatus::Rejected => ExpenseStatus::Rejected,
        imprest_core::workflow::ExpenseStatus::Disbursed => ExpenseStatus::Disbursed,
        imprest_core::workflow::ExpenseStatus::Completed => ExpenseStatus::Completed,
        imprest_core::workflow::ExpenseStatus::Inactive => ExpenseStatus::Inactive,
    }
}

/// Converts the database expense type to the core type.
pub(crate) fn expense_type_to_core(
    expense_type: &ExpenseType,
) -> imprest_core::workflow::ExpenseType {
    match expense_type {
        ExpenseType::Reimbursement => imprest_core::workflow::ExpenseType::Reimbursement,
        ExpenseType::Disbursement => imprest_core::workflow::ExpenseType::Disbursement,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_conversion_round_trip() {
        for status in [
            ExpenseStatus::Pending,
            ExpenseStatus::Approved,
            ExpenseStatus::Rejected,
            ExpenseStatus::Disbursed,
            ExpenseStatus::Completed,
            ExpenseStatus::Inactive,
        ] {
            let core = expense_status_to_core(&status);
            assert_eq!(expense_status_from_core(core), status);
        }
    }

    #[test]
    fn test_type_conversion() {
        assert_eq!(
            expense_type_to_core(&ExpenseType::Reimbursement),
            imprest_core::workflow::ExpenseType::Reimbursement
        );
        assert_eq!(
            expense_type_to_core(&ExpenseType::Disbursement),
            imprest_core::workflow::ExpenseType::Disbursement
        );
    }
}
