//! Workflow state machines for the petty-cash approval lifecycle.
//!
//! Three related state machines live here:
//!
//! - [`ExpenseWorkflow`] - employee expense requests from submission through
//!   decision, disbursement, and completion
//! - [`TopUpWorkflow`] - petty-cash top-up requests, both user-initiated and
//!   auto-triggered by the balance threshold
//! - [`ReconciliationWorkflow`] - post-disbursement accounting of actual spend
//!
//! All services are stateless: they validate a transition against the current
//! status and return an action struct carrying the audit trail data, or a
//! [`WorkflowError`]. Persistence is the caller's concern.

pub mod error;
pub mod expense;
pub mod reconciliation;
pub mod topup;
pub mod types;

pub use error::WorkflowError;
pub use expense::{ExpenseAction, ExpenseWorkflow};
pub use reconciliation::{ReconciliationAction, ReconciliationWorkflow};
pub use topup::{TopUpAction, TopUpWorkflow};
pub use types::{
    Decision, ExpenseStatus, ExpenseType, Outcome, ReconciliationStatus, ReviewDecision,
    TopUpStatus,
};
