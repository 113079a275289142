//! Error types for workflow transitions.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::workflow::types::{ExpenseStatus, ReconciliationStatus, TopUpStatus};

/// Errors that can occur while validating or executing a workflow transition.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Attempted an invalid expense status transition.
    #[error("Invalid expense transition from {from} to {to}")]
    InvalidExpenseTransition {
        /// The current status.
        from: ExpenseStatus,
        /// The attempted target status.
        to: ExpenseStatus,
    },

    /// Attempted an invalid top-up status transition.
    #[error("Invalid top-up transition from {from} to {to}")]
    InvalidTopUpTransition {
        /// The current status.
        from: TopUpStatus,
        /// The attempted target status.
        to: TopUpStatus,
    },

    /// Attempted an invalid reconciliation status transition.
    #[error("Invalid reconciliation transition from {from} to {to}")]
    InvalidReconciliationTransition {
        /// The current status.
        from: ReconciliationStatus,
        /// The attempted target status.
        to: ReconciliationStatus,
    },

    /// Amount must be strictly positive.
    #[error("Amount must be greater than zero, got {0}")]
    NonPositiveAmount(Decimal),

    /// A reimbursement request needs a receipt at submission time.
    #[error("Receipt is required for reimbursement requests")]
    ReceiptRequired,

    /// A reconciliation submission needs a receipt.
    #[error("Receipt is required to submit a reconciliation")]
    ReconciliationReceiptRequired,

    /// Reported spend exceeds what was handed out.
    #[error("Reconciled amount {reconciled} exceeds disbursed amount {disbursed}")]
    ReconciledAmountExceedsDisbursed {
        /// Amount the employee reports having spent.
        reconciled: Decimal,
        /// Amount that was disbursed.
        disbursed: Decimal,
    },

    /// Reconciled/surplus figures must not be negative.
    #[error("Reconciliation amounts must not be negative, got {0}")]
    NegativeReconciliationAmount(Decimal),

    /// The entity can no longer be edited.
    #[error("Cannot update a request in status {0}")]
    NotEditable(String),
}

impl WorkflowError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidExpenseTransition { .. }
            | Self::InvalidTopUpTransition { .. }
            | Self::InvalidReconciliationTransition { .. }
            | Self::NonPositiveAmount(_)
            | Self::ReceiptRequired
            | Self::ReconciliationReceiptRequired
            | Self::ReconciledAmountExceedsDisbursed { .. }
            | Self::NegativeReconciliationAmount(_)
            | Self::NotEditable(_) => 400,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidExpenseTransition { .. }
            | Self::InvalidTopUpTransition { .. }
            | Self::InvalidReconciliationTransition { .. } => "ILLEGAL_STATE_TRANSITION",
            Self::NonPositiveAmount(_) => "NON_POSITIVE_AMOUNT",
            Self::ReceiptRequired | Self::ReconciliationReceiptRequired => "RECEIPT_REQUIRED",
            Self::ReconciledAmountExceedsDisbursed { .. } => "RECONCILED_AMOUNT_EXCEEDS_DISBURSED",
            Self::NegativeReconciliationAmount(_) => "NEGATIVE_AMOUNT",
            Self::NotEditable(_) => "NOT_EDITABLE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_invalid_transition_error() {
        let err = WorkflowError::InvalidExpenseTransition {
            from: ExpenseStatus::Pending,
            to: ExpenseStatus::Disbursed,
        };
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), "ILLEGAL_STATE_TRANSITION");
        assert!(err.to_string().contains("pending"));
        assert!(err.to_string().contains("disbursed"));
    }

    #[test]
    fn test_receipt_required_error() {
        let err = WorkflowError::ReceiptRequired;
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), "RECEIPT_REQUIRED");
        assert_eq!(
            err.to_string(),
            "Receipt is required for reimbursement requests"
        );
    }

    #[test]
    fn test_exceeds_disbursed_error() {
        let err = WorkflowError::ReconciledAmountExceedsDisbursed {
            reconciled: dec!(2500),
            disbursed: dec!(2000),
        };
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), "RECONCILED_AMOUNT_EXCEEDS_DISBURSED");
    }

    #[test]
    fn test_non_positive_amount_error() {
        let err = WorkflowError::NonPositiveAmount(dec!(0));
        assert_eq!(err.error_code(), "NON_POSITIVE_AMOUNT");
    }
}
