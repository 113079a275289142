//! Top-up request repository.
//!
//! Drives the top-up lifecycle. Disbursement credits the petty-cash
//! account under a row lock in the same transaction and then re-runs the
//! threshold check, so a too-small top-up immediately queues the next one.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde_json::json;
use uuid::Uuid;

use imprest_core::ledger::{EntityRef, EventCode};
use imprest_core::workflow::{Decision, Outcome, TopUpAction, TopUpWorkflow, WorkflowError};

use crate::entities::{
    petty_cash_accounts,
    sea_orm_active_enums::{NotificationChannel, TopUpStatus},
    topup_requests,
};
use crate::repositories::account::{PettyCashError, PettyCashRepository};
use crate::repositories::ledger::{LedgerRepository, LogInput, INACTIVE_STATUS};
use crate::repositories::merge_json;
use crate::repositories::notification::NotificationRepository;
use crate::repositories::user::UserRepository;

/// Error types for top-up request operations.
#[derive(Debug, thiserror::Error)]
pub enum TopUpError {
    /// Top-up request not found or not active.
    #[error("Top-up request not found: {0}")]
    NotFound(Uuid),

    /// Target petty-cash account not found or not active.
    #[error("Petty cash account not found: {0}")]
    AccountNotFound(Uuid),

    /// Workflow rule violation.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// Balance mutation or replenishment failure.
    #[error(transparent)]
    PettyCash(#[from] PettyCashError),

    /// Audit log write failed.
    #[error(transparent)]
    Logging(#[from] crate::repositories::ledger::LedgerError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl TopUpError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) | Self::AccountNotFound(_) => 404,
            Self::Workflow(e) => e.status_code(),
            Self::PettyCash(e) => e.status_code(),
            Self::Logging(e) => e.status_code(),
            Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) | Self::AccountNotFound(_) => "NOT_FOUND",
            Self::Workflow(e) => e.error_code(),
            Self::PettyCash(e) => e.error_code(),
            Self::Logging(e) => e.error_code(),
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

/// Input for updating a pending top-up request.
#[derive(Debug, Clone, Default)]
pub struct UpdateTopUpInput {
    /// Requested amount.
    pub amount: Option<Decimal>,
    /// Reason for the top-up.
    pub request_reason: Option<String>,
}

/// Repository for top-up requests.
#[derive(Debug, Clone)]
pub struct TopUpRepository {
    db: DatabaseConnection,
}

impl TopUpRepository {
    /// Creates a new top-up repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a user-initiated top-up request for an account.
    ///
    /// # Errors
    ///
    /// * `TopUpError::AccountNotFound` when the account is missing/inactive
    /// * `TopUpError::Workflow` for a non-positive amount
    pub async fn create(
        &self,
        account_id: Uuid,
        requested_by: Uuid,
        amount: Decimal,
        request_reason: String,
        ip_address: Option<String>,
    ) -> Result<topup_requests::Model, TopUpError> {
        let status = TopUpWorkflow::create(amount)?;

        let txn = self.db.begin().await?;

        let account = petty_cash_accounts::Entity::find_by_id(account_id)
            .filter(petty_cash_accounts::Column::IsActive.eq(true))
            .one(&txn)
            .await?
            .ok_or(TopUpError::AccountNotFound(account_id))?;

        let now = Utc::now().into();
        let topup = topup_requests::ActiveModel {
            id: Set(Uuid::new_v4()),
            account_id: Set(account.id),
            requested_by: Set(Some(requested_by)),
            decision_by: Set(None),
            status: Set(topup_status_from_core(status)),
            amount: Set(amount),
            request_reason: Set(request_reason),
            decision_reason: Set(None),
            is_auto_triggered: Set(false),
            metadata: Set(json!({})),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let topup = topup.insert(&txn).await?;

        let log = LedgerRepository::append(
            &txn,
            LogInput::new(
                EventCode::TopUpRequested,
                EntityRef::TopUpRequest(topup.id),
                format!(
                    "Top-up of {} requested for account \"{}\"",
                    topup.amount, account.name
                ),
            )
            .triggered_by(requested_by)
            .metadata(json!({
                "topup_id": topup.id.to_string(),
                "account_id": account.id.to_string(),
                "account_name": account.name.clone(),
                "amount": topup.amount.to_string(),
                "request_reason": topup.request_reason.clone(),
                "requested_by": requested_by.to_string(),
            }))
            .ip_address(ip_address),
        )
        .await?;

        let officers = UserRepository::finance_officer_ids(&txn).await?;
        NotificationRepository::notify_many(&txn, &log, &officers, NotificationChannel::InApp)
            .await?;

        txn.commit().await?;
        Ok(topup)
    }

    /// Finds an active top-up request by id.
    ///
    /// # Errors
    ///
    /// Returns `TopUpError::NotFound` when missing or inactive.
    pub async fn get(&self, topup_id: Uuid) -> Result<topup_requests::Model, TopUpError> {
        topup_requests::Entity::find_by_id(topup_id)
            .filter(topup_requests::Column::IsActive.eq(true))
            .one(&self.db)
            .await?
            .ok_or(TopUpError::NotFound(topup_id))
    }

    /// All active top-up requests, most recent first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_all(&self) -> Result<Vec<topup_requests::Model>, TopUpError> {
        let rows = topup_requests::Entity::find()
            .filter(topup_requests::Column::IsActive.eq(true))
            .order_by_desc(topup_requests::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(rows)
    }

    /// The requester's own top-up requests, most recent first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_for_requester(
        &self,
        requested_by: Uuid,
    ) -> Result<Vec<topup_requests::Model>, TopUpError> {
        let rows = topup_requests::Entity::find()
            .filter(topup_requests::Column::RequestedBy.eq(requested_by))
            .filter(topup_requests::Column::IsActive.eq(true))
            .order_by_desc(topup_requests::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(rows)
    }

    /// Pending top-up requests for one account, most recent first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_pending_for_account(
        &self,
        account_id: Uuid,
    ) -> Result<Vec<topup_requests::Model>, TopUpError> {
        let rows = topup_requests::Entity::find()
            .filter(topup_requests::Column::AccountId.eq(account_id))
            .filter(topup_requests::Column::Status.eq(TopUpStatus::Pending))
            .filter(topup_requests::Column::IsActive.eq(true))
            .order_by_desc(topup_requests::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(rows)
    }

    /// Approves or rejects a pending top-up request.
    ///
    /// Idempotent: repeating an identical decision returns the row
    /// unchanged and appends no second audit entry, making client retries
    /// safe.
    ///
    /// # Errors
    ///
    /// * `TopUpError::NotFound` when missing or inactive
    /// * `TopUpError::Workflow` for an illegal transition
    pub async fn decide(
        &self,
        topup_id: Uuid,
        decision: Decision,
        actor: Uuid,
        decision_reason: Option<String>,
        ip_address: Option<String>,
    ) -> Result<topup_requests::Model, TopUpError> {
        let txn = self.db.begin().await?;

        let topup = topup_requests::Entity::find_by_id(topup_id)
            .filter(topup_requests::Column::IsActive.eq(true))
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(TopUpError::NotFound(topup_id))?;

        let current = topup_status_to_core(&topup.status);
        let outcome = TopUpWorkflow::decide(current, decision, actor, decision_reason.clone())?;

        let Outcome::Apply(action) = outcome else {
            txn.commit().await?;
            return Ok(topup);
        };

        let requested_by = topup.requested_by;
        let amount = topup.amount;
        let mut active: topup_requests::ActiveModel = topup.into();
        active.status = Set(topup_status_from_core(action.new_status()));
        active.decision_by = Set(Some(actor));
        active.decision_reason = Set(decision_reason.clone());
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await?;

        let (event, verb) = match decision {
            Decision::Approve => (EventCode::TopUpApproved, "approved"),
            Decision::Reject => (EventCode::TopUpRejected, "rejected"),
        };

        let log = LedgerRepository::append(
            &txn,
            LogInput::new(
                event,
                EntityRef::TopUpRequest(updated.id),
                format!("Top-up request of {amount} {verb}"),
            )
            .triggered_by(actor)
            .metadata(json!({
                "topup_id": updated.id.to_string(),
                "amount": amount.to_string(),
                "decision": verb,
                "decision_by": actor.to_string(),
                "decision_reason": decision_reason,
            }))
            .ip_address(ip_address),
        )
        .await?;

        if let Some(recipient) = requested_by {
            NotificationRepository::notify(&txn, &log, recipient, NotificationChannel::InApp)
                .await?;
        }

        txn.commit().await?;
        Ok(updated)
    }

    /// Disburses an approved top-up into the petty-cash account.
    ///
    /// Credits the account under a row lock, flips the request to
    /// complete, and re-runs the below-threshold check, all in one
    /// transaction. Idempotent no-op when already complete — the balance
    /// is not credited twice.
    ///
    /// # Errors
    ///
    /// * `TopUpError::NotFound` when missing or inactive
    /// * `TopUpError::Workflow` if the request is not approved
    /// * `TopUpError::PettyCash` when the account is gone or the credit
    ///   violates balance rules
    pub async fn disburse(
        &self,
        topup_id: Uuid,
        actor: Uuid,
        ip_address: Option<String>,
    ) -> Result<topup_requests::Model, TopUpError> {
        let txn = self.db.begin().await?;

        let topup = topup_requests::Entity::find_by_id(topup_id)
            .filter(topup_requests::Column::IsActive.eq(true))
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(TopUpError::NotFound(topup_id))?;

        let current = topup_status_to_core(&topup.status);
        let outcome = TopUpWorkflow::disburse(current, actor)?;

        let Outcome::Apply(action) = outcome else {
            txn.commit().await?;
            return Ok(topup);
        };

        let TopUpAction::Disburse { disbursed_at, .. } = &action else {
            unreachable!("disburse returns a Disburse action");
        };

        let account = PettyCashRepository::apply_credit(&txn, topup.account_id, topup.amount)
            .await?;
        let balance_before = account.current_balance - topup.amount;

        let requested_by = topup.requested_by;
        let amount = topup.amount;
        let metadata = merge_json(
            &topup.metadata,
            json!({
                "disbursed_by": actor.to_string(),
                "disbursed_at": disbursed_at.to_rfc3339(),
                "balance_before": balance_before.to_string(),
                "balance_after": account.current_balance.to_string(),
            }),
        );

        let mut active: topup_requests::ActiveModel = topup.into();
        active.status = Set(topup_status_from_core(action.new_status()));
        active.metadata = Set(metadata);
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await?;

        let log = LedgerRepository::append(
            &txn,
            LogInput::new(
                EventCode::TopUpDisbursed,
                EntityRef::TopUpRequest(updated.id),
                format!(
                    "Top-up of {amount} disbursed into account \"{}\"",
                    account.name
                ),
            )
            .triggered_by(actor)
            .metadata(json!({
                "topup_id": updated.id.to_string(),
                "account_id": account.id.to_string(),
                "account_name": account.name.clone(),
                "amount": amount.to_string(),
                "balance_before": balance_before.to_string(),
                "balance_after": account.current_balance.to_string(),
                "disbursed_by": actor.to_string(),
            }))
            .ip_address(ip_address),
        )
        .await?;

        if let Some(recipient) = requested_by {
            NotificationRepository::notify(&txn, &log, recipient, NotificationChannel::InApp)
                .await?;
        }

        // The credited amount may still leave the balance below threshold;
        // queue the next replenishment right away if so.
        PettyCashRepository::auto_replenish(&txn, &account).await?;

        txn.commit().await?;
        Ok(updated)
    }

    /// Updates a pending top-up request, recording the old and new values.
    ///
    /// # Errors
    ///
    /// * `TopUpError::NotFound` when missing or inactive
    /// * `TopUpError::Workflow` when no longer editable or for a
    ///   non-positive amount
    pub async fn update(
        &self,
        topup_id: Uuid,
        input: UpdateTopUpInput,
        actor: Uuid,
        ip_address: Option<String>,
    ) -> Result<topup_requests::Model, TopUpError> {
        let txn = self.db.begin().await?;

        let topup = topup_requests::Entity::find_by_id(topup_id)
            .filter(topup_requests::Column::IsActive.eq(true))
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(TopUpError::NotFound(topup_id))?;

        TopUpWorkflow::ensure_editable(topup_status_to_core(&topup.status))?;

        if let Some(amount) = input.amount {
            if amount <= Decimal::ZERO {
                return Err(WorkflowError::NonPositiveAmount(amount).into());
            }
        }

        let mut old_values = serde_json::Map::new();
        let mut new_values = serde_json::Map::new();
        let mut active: topup_requests::ActiveModel = topup.clone().into();

        if let Some(amount) = input.amount {
            old_values.insert("amount".into(), json!(topup.amount.to_string()));
            new_values.insert("amount".into(), json!(amount.to_string()));
            active.amount = Set(amount);
        }
        if let Some(request_reason) = input.request_reason {
            old_values.insert("request_reason".into(), json!(topup.request_reason));
            new_values.insert("request_reason".into(), json!(request_reason));
            active.request_reason = Set(request_reason);
        }

        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await?;

        LedgerRepository::append(
            &txn,
            LogInput::new(
                EventCode::TopUpUpdated,
                EntityRef::TopUpRequest(updated.id),
                "Top-up request updated".to_string(),
            )
            .triggered_by(actor)
            .metadata(json!({
                "topup_id": updated.id.to_string(),
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

    /// Soft-deletes a top-up request from any state.
    ///
    /// # Errors
    ///
    /// Returns `TopUpError::NotFound` when missing.
    pub async fn deactivate(
        &self,
        topup_id: Uuid,
        actor: Uuid,
        ip_address: Option<String>,
    ) -> Result<topup_requests::Model, TopUpError> {
        let txn = self.db.begin().await?;

        let topup = topup_requests::Entity::find_by_id(topup_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(TopUpError::NotFound(topup_id))?;

        let action = TopUpWorkflow::deactivate();
        let mut active: topup_requests::ActiveModel = topup.into();
        active.status = Set(topup_status_from_core(action.new_status()));
        active.is_active = Set(false);
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await?;

        LedgerRepository::append(
            &txn,
            LogInput::new(
                EventCode::TopUpDeactivated,
                EntityRef::TopUpRequest(updated.id),
                "Top-up request deactivated".to_string(),
            )
            .triggered_by(actor)
            .status_code(INACTIVE_STATUS)
            .metadata(json!({
                "topup_id": updated.id.to_string(),
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

/// Converts the database top-up status to the core status.
pub(crate) fn topup_status_to_core(status: &TopUpStatus) -> imprest_core::workflow::TopUpStatus {
    match status {
        TopUpStatus::Pending => imprest_core::workflow::TopUpStatus::Pending,
        TopUpStatus::Approved => imprest_core::workflow::TopUpStatus::Approved,
        TopUpStatus::Rejected => imprest_core::workflow::TopUpStatus::Rejected,
        TopUpStatus::Complete => imprest_core::workflow::TopUpStatus::Complete,
        TopUpStatus::Inactive => imprest_core::workflow::TopUpStatus::Inactive,
    }
}

/// Converts the core top-up status to the database status.
pub(crate) fn topup_status_from_core(
    status: imprest_core::workflow::TopUpStatus,
) -> TopUpStatus {
    match status {
        imprest_core::workflow::TopUpStatus::Pending => TopUpStatus::Pending,
        imprest_core::workflow::TopUpStatus::Approved => TopUpStatus::Approved,
        imprest_core::workflow::TopUpStatus::Rejected => TopUpStatus::Rejected,
        imprest_core::workflow::TopUpStatus::Complete => TopUpStatus::Complete,
        imprest_core::workflow::TopUpStatus::Inactive => TopUpStatus::Inactive,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_conversion_round_trip() {
        for status in [
            TopUpStatus::Pending,
            TopUpStatus::Approved,
            TopUpStatus::Rejected,
            TopUpStatus::Complete,
            TopUpStatus::Inactive,
        ] {
            let core = topup_status_to_core(&status);
            assert_eq!(topup_status_from_core(core), status);
        }
    }
}
