//! Expense request state machine.
//!
//! An expense request moves from submission through a finance officer
//! decision to disbursement, and, for disbursement-type requests, on to
//! completion once its reconciliation is accepted.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::workflow::error::WorkflowError;
use crate::workflow::types::{Decision, ExpenseStatus, ExpenseType, Outcome};

/// Expense workflow action representing a state transition with audit data.
#[derive(Debug, Clone)]
pub enum ExpenseAction {
    /// Approve or reject a pending request.
    Decide {
        /// The new status after the decision.
        new_status: ExpenseStatus,
        /// The decision that was made.
        decision: Decision,
        /// The finance officer who decided.
        decided_by: Uuid,
        /// When the decision was made.
        decided_at: DateTime<Utc>,
        /// Optional reason from the decider.
        reason: Option<String>,
    },
    /// Pay out an approved request.
    Disburse {
        /// The new status after disbursement.
        new_status: ExpenseStatus,
        /// The finance officer who disbursed.
        disbursed_by: Uuid,
        /// When the disbursement happened.
        disbursed_at: DateTime<Utc>,
        /// True for disbursement-type requests, which get a paired
        /// reconciliation created in the same transaction.
        creates_reconciliation: bool,
    },
    /// Close a disbursed request after its reconciliation is accepted.
    Complete {
        /// The new status after completion.
        new_status: ExpenseStatus,
    },
    /// Soft-delete the request.
    Deactivate {
        /// The new status after deactivation.
        new_status: ExpenseStatus,
    },
}

impl ExpenseAction {
    /// Returns the new status resulting from this action.
    #[must_use]
    pub fn new_status(&self) -> ExpenseStatus {
        match self {
            Self::Decide { new_status, .. }
            | Self::Disburse { new_status, .. }
            | Self::Complete { new_status }
            | Self::Deactivate { new_status } => *new_status,
        }
    }
}

/// Stateless service validating expense request transitions.
pub struct ExpenseWorkflow;

impl ExpenseWorkflow {
    /// Validates a new expense request and returns its initial status.
    ///
    /// Reimbursement requests must carry a receipt at submission time;
    /// disbursement requests get their receipt later via reconciliation.
    ///
    /// # Errors
    ///
    /// * `WorkflowError::NonPositiveAmount` if `amount <= 0`
    /// * `WorkflowError::ReceiptRequired` for a reimbursement without receipt
    pub fn create(
        expense_type: ExpenseType,
        amount: Decimal,
        receipt_count: usize,
    ) -> Result<ExpenseStatus, WorkflowError> {
        if amount <= Decimal::ZERO {
            return Err(WorkflowError::NonPositiveAmount(amount));
        }
        if expense_type == ExpenseType::Reimbursement && receipt_count == 0 {
            return Err(WorkflowError::ReceiptRequired);
        }
        Ok(ExpenseStatus::Pending)
    }

    /// Approves or rejects a pending request.
    ///
    /// Idempotent on the target state: deciding a request that already
    /// carries the same terminal decision returns [`Outcome::Noop`] so a
    /// client retry is safe and appends no second audit entry.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::InvalidExpenseTransition` if the request is
    /// neither pending nor already in the requested decided state.
    pub fn decide(
        current_status: ExpenseStatus,
        decision: Decision,
        decided_by: Uuid,
        reason: Option<String>,
    ) -> Result<Outcome<ExpenseAction>, WorkflowError> {
        let target = match decision {
            Decision::Approve => ExpenseStatus::Approved,
            Decision::Reject => ExpenseStatus::Rejected,
        };

        if current_status == target {
            return Ok(Outcome::Noop);
        }

        match current_status {
            ExpenseStatus::Pending => Ok(Outcome::Apply(ExpenseAction::Decide {
                new_status: target,
                decision,
                decided_by,
                decided_at: Utc::now(),
                reason,
            })),
            _ => Err(WorkflowError::InvalidExpenseTransition {
                from: current_status,
                to: target,
            }),
        }
    }

    /// Pays out an approved request.
    ///
    /// Disbursement-type requests get a paired reconciliation; the returned
    /// action says so via `creates_reconciliation`. Idempotent when the
    /// request is already disbursed.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::InvalidExpenseTransition` if not approved.
    pub fn disburse(
        current_status: ExpenseStatus,
        expense_type: ExpenseType,
        disbursed_by: Uuid,
    ) -> Result<Outcome<ExpenseAction>, WorkflowError> {
        if current_status == ExpenseStatus::Disbursed {
            return Ok(Outcome::Noop);
        }

        match current_status {
            ExpenseStatus::Approved => Ok(Outcome::Apply(ExpenseAction::Disburse {
                new_status: ExpenseStatus::Disbursed,
                disbursed_by,
                disbursed_at: Utc::now(),
                creates_reconciliation: expense_type == ExpenseType::Disbursement,
            })),
            _ => Err(WorkflowError::InvalidExpenseTransition {
                from: current_status,
                to: ExpenseStatus::Disbursed,
            }),
        }
    }

    /// Closes a disbursed request once its reconciliation was accepted.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::InvalidExpenseTransition` if not disbursed.
    pub fn complete(current_status: ExpenseStatus) -> Result<ExpenseAction, WorkflowError> {
        match current_status {
            ExpenseStatus::Disbursed => Ok(ExpenseAction::Complete {
                new_status: ExpenseStatus::Completed,
            }),
            _ => Err(WorkflowError::InvalidExpenseTransition {
                from: current_status,
                to: ExpenseStatus::Completed,
            }),
        }
    }

    /// Checks that the request may still be edited.
    ///
    /// Only pending requests are editable; a decided request must not be
    /// silently rewritten underneath its decision.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::NotEditable` otherwise.
    pub fn ensure_editable(current_status: ExpenseStatus) -> Result<(), WorkflowError> {
        if current_status.is_editable() {
            Ok(())
        } else {
            Err(WorkflowError::NotEditable(
                current_status.as_str().to_string(),
            ))
        }
    }

    /// Soft-deletes the request from any state.
    #[must_use]
    pub fn deactivate() -> ExpenseAction {
        ExpenseAction::Deactivate {
            new_status: ExpenseStatus::Inactive,
        }
    }

    /// Check if a status transition is valid.
    ///
    /// Valid transitions:
    /// - Pending → Approved (approve)
    /// - Pending → Rejected (reject)
    /// - Approved → Disbursed (disburse)
    /// - Disbursed → Completed (reconciliation accepted)
    #[must_use]
    pub fn is_valid_transition(from: ExpenseStatus, to: ExpenseStatus) -> bool {
        matches!(
            (from, to),
            (
                ExpenseStatus::Pending,
                ExpenseStatus::Approved | ExpenseStatus::Rejected
            ) | (ExpenseStatus::Approved, ExpenseStatus::Disbursed)
                | (ExpenseStatus::Disbursed, ExpenseStatus::Completed)
        ) || to == ExpenseStatus::Inactive
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_create_reimbursement_requires_receipt() {
        let result = ExpenseWorkflow::create(ExpenseType::Reimbursement, dec!(1000), 0);
        assert!(matches!(result, Err(WorkflowError::ReceiptRequired)));
    }

    #[test]
    fn test_create_reimbursement_with_receipt() {
        let status = ExpenseWorkflow::create(ExpenseType::Reimbursement, dec!(1000), 1).unwrap();
        assert_eq!(status, ExpenseStatus::Pending);
    }

    #[test]
    fn test_create_disbursement_needs_no_receipt() {
        let status = ExpenseWorkflow::create(ExpenseType::Disbursement, dec!(2000), 0).unwrap();
        assert_eq!(status, ExpenseStatus::Pending);
    }

    #[test]
    fn test_create_rejects_non_positive_amount() {
        let result = ExpenseWorkflow::create(ExpenseType::Disbursement, dec!(0), 0);
        assert!(matches!(result, Err(WorkflowError::NonPositiveAmount(_))));
        let result = ExpenseWorkflow::create(ExpenseType::Disbursement, dec!(-5), 0);
        assert!(matches!(result, Err(WorkflowError::NonPositiveAmount(_))));
    }

    #[test]
    fn test_approve_from_pending() {
        let fo = Uuid::new_v4();
        let outcome =
            ExpenseWorkflow::decide(ExpenseStatus::Pending, Decision::Approve, fo, None).unwrap();
        match outcome {
            Outcome::Apply(action) => assert_eq!(action.new_status(), ExpenseStatus::Approved),
            Outcome::Noop => panic!("expected a transition"),
        }
    }

    #[test]
    fn test_reject_from_pending_keeps_reason() {
        let fo = Uuid::new_v4();
        let outcome = ExpenseWorkflow::decide(
            ExpenseStatus::Pending,
            Decision::Reject,
            fo,
            Some("missing cost breakdown".to_string()),
        )
        .unwrap();
        match outcome {
            Outcome::Apply(ExpenseAction::Decide {
                new_status, reason, ..
            }) => {
                assert_eq!(new_status, ExpenseStatus::Rejected);
                assert_eq!(reason.as_deref(), Some("missing cost breakdown"));
            }
            _ => panic!("expected a decide action"),
        }
    }

    #[test]
    fn test_decide_is_idempotent_on_same_decision() {
        let fo = Uuid::new_v4();
        let outcome =
            ExpenseWorkflow::decide(ExpenseStatus::Approved, Decision::Approve, fo, None).unwrap();
        assert!(outcome.is_noop());
    }

    #[test]
    fn test_decide_conflicting_decision_fails() {
        let fo = Uuid::new_v4();
        let result = ExpenseWorkflow::decide(ExpenseStatus::Rejected, Decision::Approve, fo, None);
        assert!(matches!(
            result,
            Err(WorkflowError::InvalidExpenseTransition { .. })
        ));
    }

    #[test]
    fn test_disburse_from_approved_disbursement_type() {
        let fo = Uuid::new_v4();
        let outcome =
            ExpenseWorkflow::disburse(ExpenseStatus::Approved, ExpenseType::Disbursement, fo)
                .unwrap();
        match outcome {
            Outcome::Apply(ExpenseAction::Disburse {
                creates_reconciliation,
                new_status,
                ..
            }) => {
                assert!(creates_reconciliation);
                assert_eq!(new_status, ExpenseStatus::Disbursed);
            }
            _ => panic!("expected a disburse action"),
        }
    }

    #[test]
    fn test_disburse_reimbursement_creates_no_reconciliation() {
        let fo = Uuid::new_v4();
        let outcome =
            ExpenseWorkflow::disburse(ExpenseStatus::Approved, ExpenseType::Reimbursement, fo)
                .unwrap();
        match outcome {
            Outcome::Apply(ExpenseAction::Disburse {
                creates_reconciliation,
                ..
            }) => assert!(!creates_reconciliation),
            _ => panic!("expected a disburse action"),
        }
    }

    #[test]
    fn test_disburse_from_pending_fails() {
        let fo = Uuid::new_v4();
        let result =
            ExpenseWorkflow::disburse(ExpenseStatus::Pending, ExpenseType::Disbursement, fo);
        assert!(matches!(
            result,
            Err(WorkflowError::InvalidExpenseTransition { .. })
        ));
    }

    #[test]
    fn test_disburse_is_idempotent_when_disbursed() {
        let fo = Uuid::new_v4();
        let outcome =
            ExpenseWorkflow::disburse(ExpenseStatus::Disbursed, ExpenseType::Disbursement, fo)
                .unwrap();
        assert!(outcome.is_noop());
    }

    #[test]
    fn test_complete_only_from_disbursed() {
        assert!(ExpenseWorkflow::complete(ExpenseStatus::Disbursed).is_ok());
        assert!(matches!(
            ExpenseWorkflow::complete(ExpenseStatus::Approved),
            Err(WorkflowError::InvalidExpenseTransition { .. })
        ));
    }

    #[test]
    fn test_ensure_editable() {
        assert!(ExpenseWorkflow::ensure_editable(ExpenseStatus::Pending).is_ok());
        assert!(matches!(
            ExpenseWorkflow::ensure_editable(ExpenseStatus::Approved),
            Err(WorkflowError::NotEditable(_))
        ));
    }

    #[test]
    fn test_no_path_skips_approved() {
        // Disbursed is reachable only from Approved.
        assert!(!ExpenseWorkflow::is_valid_transition(
            ExpenseStatus::Pending,
            ExpenseStatus::Disbursed
        ));
        assert!(ExpenseWorkflow::is_valid_transition(
            ExpenseStatus::Pending,
            ExpenseStatus::Approved
        ));
        assert!(ExpenseWorkflow::is_valid_transition(
            ExpenseStatus::Approved,
            ExpenseStatus::Disbursed
        ));
        assert!(!ExpenseWorkflow::is_valid_transition(
            ExpenseStatus::Rejected,
            ExpenseStatus::Disbursed
        ));
    }

    #[test]
    fn test_deactivate_reachable_from_any_state() {
        for from in [
            ExpenseStatus::Pending,
            ExpenseStatus::Approved,
            ExpenseStatus::Rejected,
            ExpenseStatus::Disbursed,
            ExpenseStatus::Completed,
        ] {
            assert!(ExpenseWorkflow::is_valid_transition(
                from,
                ExpenseStatus::Inactive
            ));
        }
    }
}
