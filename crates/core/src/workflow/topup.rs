//! Top-up request state machine.
//!
//! A top-up request asks for the petty-cash account balance to be increased.
//! It is created either by a user or automatically by the system when the
//! balance drops below the account threshold.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::workflow::error::WorkflowError;
use crate::workflow::types::{Decision, Outcome, TopUpStatus};

/// Top-up workflow action representing a state transition with audit data.
#[derive(Debug, Clone)]
pub enum TopUpAction {
    /// Approve or reject a pending request.
    Decide {
        /// The new status after the decision.
        new_status: TopUpStatus,
        /// The decision that was made.
        decision: Decision,
        /// The finance officer who decided.
        decided_by: Uuid,
        /// When the decision was made.
        decided_at: DateTime<Utc>,
        /// Optional reason from the decider.
        reason: Option<String>,
    },
    /// Credit the petty-cash account with the approved amount.
    Disburse {
        /// The new status after disbursement.
        new_status: TopUpStatus,
        /// The finance officer who disbursed.
        disbursed_by: Uuid,
        /// When the disbursement happened.
        disbursed_at: DateTime<Utc>,
    },
    /// Soft-delete the request.
    Deactivate {
        /// The new status after deactivation.
        new_status: TopUpStatus,
    },
}

impl TopUpAction {
    /// Returns the new status resulting from this action.
    #[must_use]
    pub fn new_status(&self) -> TopUpStatus {
        match self {
            Self::Decide { new_status, .. }
            | Self::Disburse { new_status, .. }
            | Self::Deactivate { new_status } => *new_status,
        }
    }
}

/// Stateless service validating top-up request transitions.
pub struct TopUpWorkflow;

impl TopUpWorkflow {
    /// Validates a new top-up request and returns its initial status.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::NonPositiveAmount` if `amount <= 0`.
    pub fn create(amount: Decimal) -> Result<TopUpStatus, WorkflowError> {
        if amount <= Decimal::ZERO {
            return Err(WorkflowError::NonPositiveAmount(amount));
        }
        Ok(TopUpStatus::Pending)
    }

    /// Approves or rejects a pending request.
    ///
    /// Idempotent: deciding a request that already carries the same
    /// terminal decision returns [`Outcome::Noop`], so a client retry does
    /// not re-transition the request or append a second audit entry.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::InvalidTopUpTransition` if the request is
    /// neither pending nor already in the requested decided state.
    pub fn decide(
        current_status: TopUpStatus,
        decision: Decision,
        decided_by: Uuid,
        reason: Option<String>,
    ) -> Result<Outcome<TopUpAction>, WorkflowError> {
        let target = match decision {
            Decision::Approve => TopUpStatus::Approved,
            Decision::Reject => TopUpStatus::Rejected,
        };

        if current_status == target {
            return Ok(Outcome::Noop);
        }

        match current_status {
            TopUpStatus::Pending => Ok(Outcome::Apply(TopUpAction::Decide {
                new_status: target,
                decision,
                decided_by,
                decided_at: Utc::now(),
                reason,
            })),
            _ => Err(WorkflowError::InvalidTopUpTransition {
                from: current_status,
                to: target,
            }),
        }
    }

    /// Disburses an approved request into the petty-cash account.
    ///
    /// Idempotent no-op when the request is already complete: the repeat
    /// call must not credit the account a second time.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::InvalidTopUpTransition` if not approved.
    pub fn disburse(
        current_status: TopUpStatus,
        disbursed_by: Uuid,
    ) -> Result<Outcome<TopUpAction>, WorkflowError> {
        if current_status == TopUpStatus::Complete {
            return Ok(Outcome::Noop);
        }

        match current_status {
            TopUpStatus::Approved => Ok(Outcome::Apply(TopUpAction::Disburse {
                new_status: TopUpStatus::Complete,
                disbursed_by,
                disbursed_at: Utc::now(),
            })),
            _ => Err(WorkflowError::InvalidTopUpTransition {
                from: current_status,
                to: TopUpStatus::Complete,
            }),
        }
    }

    /// Checks that the request may still be edited (pending only).
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::NotEditable` otherwise.
    pub fn ensure_editable(current_status: TopUpStatus) -> Result<(), WorkflowError> {
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
    pub fn deactivate() -> TopUpAction {
        TopUpAction::Deactivate {
            new_status: TopUpStatus::Inactive,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_create_rejects_non_positive_amount() {
        assert!(matches!(
            TopUpWorkflow::create(dec!(0)),
            Err(WorkflowError::NonPositiveAmount(_))
        ));
        assert_eq!(TopUpWorkflow::create(dec!(400)).unwrap(), TopUpStatus::Pending);
    }

    #[test]
    fn test_approve_from_pending() {
        let fo = Uuid::new_v4();
        let outcome =
            TopUpWorkflow::decide(TopUpStatus::Pending, Decision::Approve, fo, None).unwrap();
        match outcome {
            Outcome::Apply(action) => assert_eq!(action.new_status(), TopUpStatus::Approved),
            Outcome::Noop => panic!("expected a transition"),
        }
    }

    #[test]
    fn test_decide_is_idempotent() {
        let fo = Uuid::new_v4();
        let outcome =
            TopUpWorkflow::decide(TopUpStatus::Approved, Decision::Approve, fo, None).unwrap();
        assert!(outcome.is_noop());

        let outcome =
            TopUpWorkflow::decide(TopUpStatus::Rejected, Decision::Reject, fo, None).unwrap();
        assert!(outcome.is_noop());
    }

    #[test]
    fn test_decide_conflicting_decision_fails() {
        let fo = Uuid::new_v4();
        let result = TopUpWorkflow::decide(TopUpStatus::Approved, Decision::Reject, fo, None);
        assert!(matches!(
            result,
            Err(WorkflowError::InvalidTopUpTransition { .. })
        ));
    }

    #[test]
    fn test_disburse_from_approved() {
        let fo = Uuid::new_v4();
        let outcome = TopUpWorkflow::disburse(TopUpStatus::Approved, fo).unwrap();
        match outcome {
            Outcome::Apply(action) => assert_eq!(action.new_status(), TopUpStatus::Complete),
            Outcome::Noop => panic!("expected a transition"),
        }
    }

    #[test]
    fn test_disburse_is_idempotent_when_complete() {
        let fo = Uuid::new_v4();
        let outcome = TopUpWorkflow::disburse(TopUpStatus::Complete, fo).unwrap();
        assert!(outcome.is_noop());
    }

    #[test]
    fn test_disburse_from_pending_fails() {
        let fo = Uuid::new_v4();
        let result = TopUpWorkflow::disburse(TopUpStatus::Pending, fo);
        assert!(matches!(
            result,
            Err(WorkflowError::InvalidTopUpTransition { .. })
        ));
    }

    #[test]
    fn test_ensure_editable_pending_only() {
        assert!(TopUpWorkflow::ensure_editable(TopUpStatus::Pending).is_ok());
        for status in [
            TopUpStatus::Approved,
            TopUpStatus::Rejected,
            TopUpStatus::Complete,
        ] {
            assert!(matches!(
                TopUpWorkflow::ensure_editable(status),
                Err(WorkflowError::NotEditable(_))
            ));
        }
    }
}
