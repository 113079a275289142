//! Disbursement reconciliation state machine.
//!
//! A reconciliation is attached 1:1 to a disbursed disbursement-type expense
//! request. The employee reports actual spend against the cash handed out;
//! a finance officer then accepts the figures or returns them for correction.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::workflow::error::WorkflowError;
use crate::workflow::types::{Outcome, ReconciliationStatus, ReviewDecision};

/// Reconciliation workflow action representing a state transition with audit data.
#[derive(Debug, Clone)]
pub enum ReconciliationAction {
    /// Employee reports actual spend and hands in the receipt.
    SubmitReceipt {
        /// The new status after submission.
        new_status: ReconciliationStatus,
        /// Amount actually spent.
        reconciled_amount: Decimal,
        /// Cash returned if underspent.
        surplus_returned: Decimal,
        /// When the figures were submitted.
        submitted_at: DateTime<Utc>,
    },
    /// Reviewer accepts the reconciliation; the parent expense completes.
    Complete {
        /// The new status after acceptance.
        new_status: ReconciliationStatus,
        /// The finance officer who accepted.
        approved_by: Uuid,
        /// When the reconciliation was accepted.
        approved_at: DateTime<Utc>,
    },
    /// Reviewer sends the reconciliation back to the employee.
    ///
    /// The submitted figures and receipt are cleared so the employee must
    /// resubmit. Unlike a rejected expense or top-up this is not terminal.
    ReturnForCorrection {
        /// The new status after the return (back to pending).
        new_status: ReconciliationStatus,
        /// The finance officer who returned it.
        returned_by: Uuid,
        /// When it was returned.
        returned_at: DateTime<Utc>,
    },
}

impl ReconciliationAction {
    /// Returns the new status resulting from this action.
    #[must_use]
    pub fn new_status(&self) -> ReconciliationStatus {
        match self {
            Self::SubmitReceipt { new_status, .. }
            | Self::Complete { new_status, .. }
            | Self::ReturnForCorrection { new_status, .. } => *new_status,
        }
    }
}

/// Stateless service validating reconciliation transitions.
pub struct ReconciliationWorkflow;

impl ReconciliationWorkflow {
    /// Submits actual-spend figures and a receipt for review.
    ///
    /// # Errors
    ///
    /// * `WorkflowError::InvalidReconciliationTransition` if not pending
    /// * `WorkflowError::ReconciliationReceiptRequired` without a receipt
    /// * `WorkflowError::NegativeReconciliationAmount` for negative figures
    /// * `WorkflowError::ReconciledAmountExceedsDisbursed` when the reported
    ///   spend exceeds the disbursed amount
    pub fn submit_receipt(
        current_status: ReconciliationStatus,
        reconciled_amount: Decimal,
        surplus_returned: Decimal,
        disbursed_amount: Decimal,
        receipt_count: usize,
    ) -> Result<ReconciliationAction, WorkflowError> {
        if current_status != ReconciliationStatus::Pending {
            return Err(WorkflowError::InvalidReconciliationTransition {
                from: current_status,
                to: ReconciliationStatus::UnderReview,
            });
        }
        if receipt_count == 0 {
            return Err(WorkflowError::ReconciliationReceiptRequired);
        }
        if reconciled_amount < Decimal::ZERO {
            return Err(WorkflowError::NegativeReconciliationAmount(
                reconciled_amount,
            ));
        }
        if surplus_returned < Decimal::ZERO {
            return Err(WorkflowError::NegativeReconciliationAmount(surplus_returned));
        }
        if reconciled_amount > disbursed_amount {
            return Err(WorkflowError::ReconciledAmountExceedsDisbursed {
                reconciled: reconciled_amount,
                disbursed: disbursed_amount,
            });
        }

        Ok(ReconciliationAction::SubmitReceipt {
            new_status: ReconciliationStatus::UnderReview,
            reconciled_amount,
            surplus_returned,
            submitted_at: Utc::now(),
        })
    }

    /// Reviews a submitted reconciliation.
    ///
    /// Accepting cascades: the caller must also complete the parent expense
    /// request in the same transaction. Returning for correction moves the
    /// reconciliation back to pending with its figures cleared. Idempotent
    /// when the reconciliation is already completed and completion is asked
    /// for again.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::InvalidReconciliationTransition` if the
    /// reconciliation is not under review.
    pub fn review(
        current_status: ReconciliationStatus,
        decision: ReviewDecision,
        reviewed_by: Uuid,
    ) -> Result<Outcome<ReconciliationAction>, WorkflowError> {
        if current_status == ReconciliationStatus::Completed
            && decision == ReviewDecision::Complete
        {
            return Ok(Outcome::Noop);
        }

        if current_status != ReconciliationStatus::UnderReview {
            let to = match decision {
                ReviewDecision::Complete => ReconciliationStatus::Completed,
                ReviewDecision::ReturnForCorrection => ReconciliationStatus::Pending,
            };
            return Err(WorkflowError::InvalidReconciliationTransition {
                from: current_status,
                to,
            });
        }

        let now = Utc::now();
        let action = match decision {
            ReviewDecision::Complete => ReconciliationAction::Complete {
                new_status: ReconciliationStatus::Completed,
                approved_by: reviewed_by,
                approved_at: now,
            },
            ReviewDecision::ReturnForCorrection => ReconciliationAction::ReturnForCorrection {
                new_status: ReconciliationStatus::Pending,
                returned_by: reviewed_by,
                returned_at: now,
            },
        };
        Ok(Outcome::Apply(action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_submit_receipt_from_pending() {
        let action = ReconciliationWorkflow::submit_receipt(
            ReconciliationStatus::Pending,
            dec!(1800),
            dec!(200),
            dec!(2000),
            1,
        )
        .unwrap();
        assert_eq!(action.new_status(), ReconciliationStatus::UnderReview);
    }

    #[test]
    fn test_submit_receipt_exceeding_disbursed_fails() {
        let result = ReconciliationWorkflow::submit_receipt(
            ReconciliationStatus::Pending,
            dec!(2500),
            dec!(0),
            dec!(2000),
            1,
        );
        assert!(matches!(
            result,
            Err(WorkflowError::ReconciledAmountExceedsDisbursed {
                reconciled,
                disbursed,
            }) if reconciled == dec!(2500) && disbursed == dec!(2000)
        ));
    }

    #[test]
    fn test_submit_receipt_requires_receipt() {
        let result = ReconciliationWorkflow::submit_receipt(
            ReconciliationStatus::Pending,
            dec!(1800),
            dec!(200),
            dec!(2000),
            0,
        );
        assert!(matches!(
            result,
            Err(WorkflowError::ReconciliationReceiptRequired)
        ));
    }

    #[test]
    fn test_submit_receipt_rejects_negative_figures() {
        let result = ReconciliationWorkflow::submit_receipt(
            ReconciliationStatus::Pending,
            dec!(-1),
            dec!(0),
            dec!(2000),
            1,
        );
        assert!(matches!(
            result,
            Err(WorkflowError::NegativeReconciliationAmount(_))
        ));
    }

    #[test]
    fn test_submit_receipt_only_from_pending() {
        let result = ReconciliationWorkflow::submit_receipt(
            ReconciliationStatus::UnderReview,
            dec!(1800),
            dec!(200),
            dec!(2000),
            1,
        );
        assert!(matches!(
            result,
            Err(WorkflowError::InvalidReconciliationTransition { .. })
        ));
    }

    #[test]
    fn test_review_complete_from_under_review() {
        let fo = Uuid::new_v4();
        let outcome = ReconciliationWorkflow::review(
            ReconciliationStatus::UnderReview,
            ReviewDecision::Complete,
            fo,
        )
        .unwrap();
        match outcome {
            Outcome::Apply(ReconciliationAction::Complete {
                new_status,
                approved_by,
                ..
            }) => {
                assert_eq!(new_status, ReconciliationStatus::Completed);
                assert_eq!(approved_by, fo);
            }
            _ => panic!("expected a complete action"),
        }
    }

    #[test]
    fn test_review_return_goes_back_to_pending() {
        let fo = Uuid::new_v4();
        let outcome = ReconciliationWorkflow::review(
            ReconciliationStatus::UnderReview,
            ReviewDecision::ReturnForCorrection,
            fo,
        )
        .unwrap();
        match outcome {
            Outcome::Apply(action) => {
                assert_eq!(action.new_status(), ReconciliationStatus::Pending);
            }
            Outcome::Noop => panic!("expected a transition"),
        }
    }

    #[test]
    fn test_review_complete_is_idempotent() {
        let fo = Uuid::new_v4();
        let outcome = ReconciliationWorkflow::review(
            ReconciliationStatus::Completed,
            ReviewDecision::Complete,
            fo,
        )
        .unwrap();
        assert!(outcome.is_noop());
    }

    #[test]
    fn test_review_only_from_under_review() {
        let fo = Uuid::new_v4();
        let result = ReconciliationWorkflow::review(
            ReconciliationStatus::Pending,
            ReviewDecision::Complete,
            fo,
        );
        assert!(matches!(
            result,
            Err(WorkflowError::InvalidReconciliationTransition { .. })
        ));
    }
}
