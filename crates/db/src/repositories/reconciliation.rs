//! Disbursement reconciliation repository.
//!
//! The employee reports actual spend against disbursed cash; a finance
//! officer accepts the figures or returns them for correction. Accepting
//! cascades the parent expense request to completed in the same
//! transaction, so the two rows can never diverge.

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
    ExpenseWorkflow, Outcome, ReconciliationAction, ReconciliationWorkflow, ReviewDecision,
    WorkflowError,
};

use crate::entities::{
    disbursement_reconciliations, expense_requests,
    sea_orm_active_enums::{NotificationChannel, ReconciliationStatus},
};
use crate::repositories::expense::{expense_status_from_core, expense_status_to_core};
use crate::repositories::ledger::{LedgerRepository, LogInput};
use crate::repositories::notification::NotificationRepository;
use crate::repositories::user::UserRepository;

/// Error types for reconciliation operations.
#[derive(Debug, thiserror::Error)]
pub enum ReconciliationError {
    /// Reconciliation not found, not active, or not owned by the caller.
    #[error("Reconciliation not found: {0}")]
    NotFound(Uuid),

    /// The parent expense request is missing (data integrity failure).
    #[error("Expense request not found for reconciliation: {0}")]
    ExpenseNotFound(Uuid),

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

impl ReconciliationError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::ExpenseNotFound(_) => 500,
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
            Self::ExpenseNotFound(_) => "INTERNAL_ERROR",
            Self::Workflow(e) => e.error_code(),
            Self::Logging(e) => e.error_code(),
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

/// Input for submitting reconciliation figures.
#[derive(Debug, Clone)]
pub struct SubmitReceiptInput {
    /// Amount actually spent. Must not exceed the disbursed amount.
    pub reconciled_amount: Decimal,
    /// Cash returned if underspent.
    pub surplus_returned: Decimal,
    /// Uploaded receipt URLs; at least one is required.
    pub receipt_urls: Vec<String>,
    /// Notes from the employee.
    pub comments: Option<String>,
}

/// Repository for disbursement reconciliations.
#[derive(Debug, Clone)]
pub struct ReconciliationRepository {
    db: DatabaseConnection,
}

impl ReconciliationRepository {
    /// Creates a new reconciliation repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds an active reconciliation by id.
    ///
    /// # Errors
    ///
    /// Returns `ReconciliationError::NotFound` when missing or inactive.
    pub async fn get(
        &self,
        reconciliation_id: Uuid,
    ) -> Result<disbursement_reconciliations::Model, ReconciliationError> {
        disbursement_reconciliations::Entity::find_by_id(reconciliation_id)
            .filter(disbursement_reconciliations::Column::IsActive.eq(true))
            .one(&self.db)
            .await?
            .ok_or(ReconciliationError::NotFound(reconciliation_id))
    }

    /// All active reconciliations, most recent first. Finance officer view.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_all(
        &self,
    ) -> Result<Vec<disbursement_reconciliations::Model>, ReconciliationError> {
        let rows = disbursement_reconciliations::Entity::find()
            .filter(disbursement_reconciliations::Column::IsActive.eq(true))
            .order_by_desc(disbursement_reconciliations::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(rows)
    }

    /// The employee's own reconciliations regardless of status.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_for_submitter(
        &self,
        submitted_by: Uuid,
    ) -> Result<Vec<disbursement_reconciliations::Model>, ReconciliationError> {
        let rows = disbursement_reconciliations::Entity::find()
            .filter(disbursement_reconciliations::Column::SubmittedBy.eq(submitted_by))
            .filter(disbursement_reconciliations::Column::IsActive.eq(true))
            .order_by_desc(disbursement_reconciliations::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(rows)
    }

    /// The reconciliation paired with an expense request, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_by_expense(
        &self,
        expense_request_id: Uuid,
    ) -> Result<Option<disbursement_reconciliations::Model>, ReconciliationError> {
        let row = disbursement_reconciliations::Entity::find()
            .filter(
                disbursement_reconciliations::Column::ExpenseRequestId.eq(expense_request_id),
            )
            .filter(disbursement_reconciliations::Column::IsActive.eq(true))
            .one(&self.db)
            .await?;
        Ok(row)
    }

    /// Employee submits actual-spend figures and a receipt for review.
    ///
    /// Scoped to the reconciliation's owner: acting on someone else's
    /// reconciliation is a `NotFound`. The reported spend must not exceed
    /// the disbursed amount.
    ///
    /// # Errors
    ///
    /// * `ReconciliationError::NotFound` when out of scope
    /// * `ReconciliationError::Workflow` for an illegal transition or
    ///   invalid figures
    pub async fn submit_receipt(
        &self,
        reconciliation_id: Uuid,
        submitted_by: Uuid,
        input: SubmitReceiptInput,
        ip_address: Option<String>,
    ) -> Result<disbursement_reconciliations::Model, ReconciliationError> {
        let txn = self.db.begin().await?;

        let reconciliation = disbursement_reconciliations::Entity::find_by_id(reconciliation_id)
            .filter(disbursement_reconciliations::Column::IsActive.eq(true))
            .filter(disbursement_reconciliations::Column::SubmittedBy.eq(submitted_by))
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(ReconciliationError::NotFound(reconciliation_id))?;

        let action = ReconciliationWorkflow::submit_receipt(
            reconciliation_status_to_core(&reconciliation.status),
            input.reconciled_amount,
            input.surplus_returned,
            reconciliation.total_amount,
            input.receipt_urls.len(),
        )?;

        let total_amount = reconciliation.total_amount;
        let mut active: disbursement_reconciliations::ActiveModel = reconciliation.into();
        active.status = Set(reconciliation_status_from_core(action.new_status()));
        active.reconciled_amount = Set(Some(input.reconciled_amount));
        active.surplus_returned = Set(Some(input.surplus_returned));
        active.receipt_urls = Set(Some(json!(input.receipt_urls)));
        active.comments = Set(input.comments.clone());
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await?;

        let log = LedgerRepository::append(
            &txn,
            LogInput::new(
                EventCode::ReconciliationSubmitted,
                EntityRef::DisbursementReconciliation(updated.id),
                format!(
                    "Reconciliation submitted: {} of {} accounted for",
                    input.reconciled_amount, total_amount
                ),
            )
            .triggered_by(submitted_by)
            .metadata(json!({
                "reconciliation_id": updated.id.to_string(),
                "expense_request_id": updated.expense_request_id.to_string(),
                "total_amount": total_amount.to_string(),
                "reconciled_amount": input.reconciled_amount.to_string(),
                "surplus_returned": input.surplus_returned.to_string(),
                "comments": input.comments,
                "submitted_by": submitted_by.to_string(),
            }))
            .ip_address(ip_address),
        )
        .await?;

        let officers = UserRepository::finance_officer_ids(&txn).await?;
        NotificationRepository::notify_many(&txn, &log, &officers, NotificationChannel::InApp)
            .await?;

        txn.commit().await?;
        Ok(updated)
    }

    /// Finance officer reviews a submitted reconciliation.
    ///
    /// Accepting completes the reconciliation AND the parent expense
    /// request in the same transaction. Returning for correction moves the
    /// reconciliation back to pending and clears the reported figures and
    /// receipt so the employee must resubmit. Idempotent when already
    /// completed.
    ///
    /// # Errors
    ///
    /// * `ReconciliationError::NotFound` when missing or inactive
    /// * `ReconciliationError::Workflow` if not under review
    pub async fn review(
        &self,
        reconciliation_id: Uuid,
        decision: ReviewDecision,
        actor: Uuid,
        comments: Option<String>,
        ip_address: Option<String>,
    ) -> Result<disbursement_reconciliations::Model, ReconciliationError> {
        let txn = self.db.begin().await?;

        let reconciliation = disbursement_reconciliations::Entity::find_by_id(reconciliation_id)
            .filter(disbursement_reconciliations::Column::IsActive.eq(true))
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(ReconciliationError::NotFound(reconciliation_id))?;

        let outcome = ReconciliationWorkflow::review(
            reconciliation_status_to_core(&reconciliation.status),
            decision,
            actor,
        )?;

        let Outcome::Apply(action) = outcome else {
            txn.commit().await?;
            return Ok(reconciliation);
        };

        let submitted_by = reconciliation.submitted_by;
        let expense_request_id = reconciliation.expense_request_id;

        let updated = match action {
            ReconciliationAction::Complete {
                new_status,
                approved_by,
                approved_at,
            } => {
                let mut active: disbursement_reconciliations::ActiveModel =
                    reconciliation.into();
                active.status = Set(reconciliation_status_from_core(new_status));
                active.approved_by = Set(Some(approved_by));
                active.approved_at = Set(Some(approved_at.into()));
                if comments.is_some() {
                    active.comments = Set(comments.clone());
                }
                active.updated_at = Set(Utc::now().into());
                let updated = active.update(&txn).await?;

                // Cascade: the parent expense request completes in the same
                // transaction.
                let expense = expense_requests::Entity::find_by_id(expense_request_id)
                    .lock_exclusive()
                    .one(&txn)
                    .await?
                    .ok_or(ReconciliationError::ExpenseNotFound(expense_request_id))?;

                let expense_action =
                    ExpenseWorkflow::complete(expense_status_to_core(&expense.status))?;
                let expense_title = expense.title.clone();
                let mut expense_active: expense_requests::ActiveModel = expense.into();
                expense_active.status =
                    Set(expense_status_from_core(expense_action.new_status()));
                expense_active.updated_at = Set(Utc::now().into());
                let expense_updated = expense_active.update(&txn).await?;

                let log = LedgerRepository::append(
                    &txn,
                    LogInput::new(
                        EventCode::ReconciliationCompleted,
                        EntityRef::DisbursementReconciliation(updated.id),
                        "Reconciliation completed".to_string(),
                    )
                    .triggered_by(actor)
                    .metadata(json!({
                        "reconciliation_id": updated.id.to_string(),
                        "expense_request_id": expense_updated.id.to_string(),
                        "reconciled_amount": updated
                            .reconciled_amount
                            .map(|a| a.to_string()),
                        "surplus_returned": updated
                            .surplus_returned
                            .map(|a| a.to_string()),
                        "approved_by": actor.to_string(),
                        "comments": comments,
                    }))
                    .ip_address(ip_address.clone()),
                )
                .await?;

                LedgerRepository::append(
                    &txn,
                    LogInput::new(
                        EventCode::ExpenseCompleted,
                        EntityRef::ExpenseRequest(expense_updated.id),
                        format!("Expense request \"{expense_title}\" completed"),
                    )
                    .triggered_by(actor)
                    .metadata(json!({
                        "expense_id": expense_updated.id.to_string(),
                        "reconciliation_id": updated.id.to_string(),
                    }))
                    .ip_address(ip_address),
                )
                .await?;

                NotificationRepository::notify(
                    &txn,
                    &log,
                    submitted_by,
                    NotificationChannel::InApp,
                )
                .await?;

                updated
            }
            ReconciliationAction::ReturnForCorrection { new_status, .. } => {
                // Clear the reported figures and receipt; the employee must
                // resubmit from scratch.
                let mut active: disbursement_reconciliations::ActiveModel =
                    reconciliation.into();
                active.status = Set(reconciliation_status_from_core(new_status));
                active.reconciled_amount = Set(None);
                active.surplus_returned = Set(None);
                active.receipt_urls = Set(None);
                active.comments = Set(comments.clone());
                active.updated_at = Set(Utc::now().into());
                let updated = active.update(&txn).await?;

                let log = LedgerRepository::append(
                    &txn,
                    LogInput::new(
                        EventCode::ReconciliationReturned,
                        EntityRef::DisbursementReconciliation(updated.id),
                        "Reconciliation returned for correction".to_string(),
                    )
                    .triggered_by(actor)
                    .metadata(json!({
                        "reconciliation_id": updated.id.to_string(),
                        "expense_request_id": expense_request_id.to_string(),
                        "returned_by": actor.to_string(),
                        "comments": comments,
                    }))
                    .ip_address(ip_address),
                )
                .await?;

                NotificationRepository::notify(
                    &txn,
                    &log,
                    submitted_by,
                    NotificationChannel::InApp,
                )
                .await?;

                updated
            }
            ReconciliationAction::SubmitReceipt { .. } => {
                unreachable!("review never returns a SubmitReceipt action")
            }
        };

        txn.commit().await?;
        Ok(updated)
    }
}

// ============================================================================
// Conversion helpers
// ============================================================================

/// Converts the database reconciliation status to the core status.
pub(crate) fn reconciliation_status_to_core(
    status: &ReconciliationStatus,
) -> imprest_core::workflow::ReconciliationStatus {
    match status {
        ReconciliationStatus::Pending => imprest_core::workflow::ReconciliationStatus::Pending,
        ReconciliationStatus::UnderReview => {
            imprest_core::workflow::ReconciliationStatus::UnderReview
        }
        ReconciliationStatus::Completed => {
            imprest_core::workflow::ReconciliationStatus::Completed
        }
        ReconciliationStatus::Inactive => imprest_core::workflow::ReconciliationStatus::Inactive,
    }
}

/// Converts the core reconciliation status to the database status.
pub(crate) fn reconciliation_status_from_core(
    status: imprest_core::workflow::ReconciliationStatus,
) -> ReconciliationStatus {
    match status {
        imprest_core::workflow::ReconciliationStatus::Pending => ReconciliationStatus::Pending,
        imprest_core::workflow::ReconciliationStatus::UnderReview => {
            ReconciliationStatus::UnderReview
        }
        imprest_core::workflow::ReconciliationStatus::Completed => {
            ReconciliationStatus::Completed
        }
        imprest_core::workflow::ReconciliationStatus::Inactive => ReconciliationStatus::Inactive,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_conversion_round_trip() {
        for status in [
            ReconciliationStatus::Pending,
            ReconciliationStatus::UnderReview,
            ReconciliationStatus::Completed,
            ReconciliationStatus::Inactive,
        ] {
            let core = reconciliation_status_to_core(&status);
            assert_eq!(reconciliation_status_from_core(core), status);
        }
    }
}
