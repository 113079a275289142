//! Workflow domain types for the expense, top-up, and reconciliation lifecycles.
//!
//! Each workflow defines its own legal status set and transition table;
//! there is no single global status enum.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of an expense request.
///
/// The valid transitions are:
/// - Pending → Approved (approve)
/// - Pending → Rejected (reject)
/// - Approved → Disbursed (disburse)
/// - Disbursed → Completed (reconciliation completes)
///
/// `Inactive` is orthogonal: any status can be deactivated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseStatus {
    /// Awaiting a finance officer decision.
    Pending,
    /// Approved and awaiting disbursement.
    Approved,
    /// Rejected (terminal).
    Rejected,
    /// Cash handed out; awaiting reconciliation for disbursement-type requests.
    Disbursed,
    /// Fully reconciled (terminal).
    Completed,
    /// Soft-deleted.
    #[serde(rename = "INACT")]
    Inactive,
}

impl ExpenseStatus {
    /// Returns the string code of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Disbursed => "disbursed",
            Self::Completed => "completed",
            Self::Inactive => "INACT",
        }
    }

    /// Parses a status from its string code.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "disbursed" => Some(Self::Disbursed),
            "completed" => Some(Self::Completed),
            "INACT" => Some(Self::Inactive),
            _ => None,
        }
    }

    /// Returns true if the request can still be edited by its owner.
    #[must_use]
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl fmt::Display for ExpenseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of expense request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseType {
    /// Employee already spent their own money; receipt required at submission.
    Reimbursement,
    /// Cash is handed out first and reconciled afterwards.
    Disbursement,
}

impl ExpenseType {
    /// Returns the string code of the type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reimbursement => "reimbursement",
            Self::Disbursement => "disbursement",
        }
    }

    /// Parses an expense type from its string code.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "reimbursement" => Some(Self::Reimbursement),
            "disbursement" => Some(Self::Disbursement),
            _ => None,
        }
    }
}

impl fmt::Display for ExpenseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status of a top-up request.
///
/// The valid transitions are:
/// - Pending → Approved (approve)
/// - Pending → Rejected (reject)
/// - Approved → Complete (disburse credits the account)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopUpStatus {
    /// Awaiting a finance officer decision.
    Pending,
    /// Approved and awaiting disbursement into the account.
    Approved,
    /// Rejected (terminal).
    Rejected,
    /// Disbursed into the petty-cash account (terminal).
    Complete,
    /// Soft-deleted.
    #[serde(rename = "INACT")]
    Inactive,
}

impl TopUpStatus {
    /// Returns the string code of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Complete => "complete",
            Self::Inactive => "INACT",
        }
    }

    /// Parses a status from its string code.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "complete" => Some(Self::Complete),
            "INACT" => Some(Self::Inactive),
            _ => None,
        }
    }

    /// Returns true if the request can still be edited by its requester.
    #[must_use]
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl fmt::Display for TopUpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status of a disbursement reconciliation.
///
/// The valid transitions are:
/// - Pending → UnderReview (employee submits receipt)
/// - UnderReview → Completed (reviewer accepts; parent expense completes)
/// - UnderReview → Pending (reviewer returns it for correction; submitted
///   figures and receipt are cleared)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationStatus {
    /// Waiting for the employee to report actual spend.
    Pending,
    /// Receipt submitted; waiting for finance officer review.
    UnderReview,
    /// Accepted (terminal).
    Completed,
    /// Soft-deleted.
    #[serde(rename = "INACT")]
    Inactive,
}

impl ReconciliationStatus {
    /// Returns the string code of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::UnderReview => "under_review",
            Self::Completed => "completed",
            Self::Inactive => "INACT",
        }
    }

    /// Parses a status from its string code.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "under_review" => Some(Self::UnderReview),
            "completed" => Some(Self::Completed),
            "INACT" => Some(Self::Inactive),
            _ => None,
        }
    }
}

impl fmt::Display for ReconciliationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Approve-or-reject decision on an expense or top-up request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// Approve the request.
    Approve,
    /// Reject the request.
    Reject,
}

impl Decision {
    /// Parses a decision from its string code.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "approve" | "approved" => Some(Self::Approve),
            "reject" | "rejected" => Some(Self::Reject),
            _ => None,
        }
    }
}

/// Reviewer decision on a submitted reconciliation.
///
/// `ReturnForCorrection` is deliberately not called "reject": unlike a
/// rejected expense or top-up it is not terminal, it sends the
/// reconciliation back to the employee for resubmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    /// Accept the reconciliation; the parent expense completes.
    Complete,
    /// Send the reconciliation back to the employee.
    ReturnForCorrection,
}

impl ReviewDecision {
    /// Parses a review decision from its string code.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "complete" | "completed" => Some(Self::Complete),
            "return_for_correction" | "returned_for_correction" => Some(Self::ReturnForCorrection),
            _ => None,
        }
    }
}

/// Result of validating a transition that is idempotent on its target state.
///
/// Decision-style operations return `Noop` when the entity is already in the
/// requested terminal state, so a client retry neither re-transitions the
/// entity nor appends a second audit entry.
#[derive(Debug, Clone)]
pub enum Outcome<A> {
    /// The transition is valid and must be persisted.
    Apply(A),
    /// The entity is already in the requested state; nothing to persist.
    Noop,
}

impl<A> Outcome<A> {
    /// Returns true for the `Noop` variant.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        matches!(self, Self::Noop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expense_status_round_trip() {
        for status in [
            ExpenseStatus::Pending,
            ExpenseStatus::Approved,
            ExpenseStatus::Rejected,
            ExpenseStatus::Disbursed,
            ExpenseStatus::Completed,
            ExpenseStatus::Inactive,
        ] {
            assert_eq!(ExpenseStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ExpenseStatus::parse("bogus"), None);
    }

    #[test]
    fn test_topup_status_round_trip() {
        for status in [
            TopUpStatus::Pending,
            TopUpStatus::Approved,
            TopUpStatus::Rejected,
            TopUpStatus::Complete,
            TopUpStatus::Inactive,
        ] {
            assert_eq!(TopUpStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_reconciliation_status_round_trip() {
        for status in [
            ReconciliationStatus::Pending,
            ReconciliationStatus::UnderReview,
            ReconciliationStatus::Completed,
            ReconciliationStatus::Inactive,
        ] {
            assert_eq!(ReconciliationStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_only_pending_is_editable() {
        assert!(ExpenseStatus::Pending.is_editable());
        assert!(!ExpenseStatus::Approved.is_editable());
        assert!(!ExpenseStatus::Disbursed.is_editable());
        assert!(TopUpStatus::Pending.is_editable());
        assert!(!TopUpStatus::Complete.is_editable());
    }

    #[test]
    fn test_decision_parse_accepts_both_forms() {
        assert_eq!(Decision::parse("approve"), Some(Decision::Approve));
        assert_eq!(Decision::parse("approved"), Some(Decision::Approve));
        assert_eq!(Decision::parse("rejected"), Some(Decision::Reject));
        assert_eq!(Decision::parse("maybe"), None);
    }

    #[test]
    fn test_inactive_code_matches_ledger_status_code() {
        assert_eq!(ExpenseStatus::Inactive.as_str(), "INACT");
        assert_eq!(TopUpStatus::Inactive.as_str(), "INACT");
        assert_eq!(ReconciliationStatus::Inactive.as_str(), "INACT");
    }
}
