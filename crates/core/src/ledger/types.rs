//! Audit event codes, entity references, and notification channels.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Category an audit event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    /// Petty-cash account lifecycle events.
    PettyCash,
    /// Expense request workflow events.
    Expense,
    /// Top-up request workflow events.
    TopUp,
    /// Disbursement reconciliation workflow events.
    Reconciliation,
}

impl EventCategory {
    /// Returns the string code of the category.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PettyCash => "petty_cash",
            Self::Expense => "expense",
            Self::TopUp => "topup",
            Self::Reconciliation => "reconciliation",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Every audit event the system can record.
///
/// The codes double as the seed data for the `event_types` lookup table;
/// the ledger resolves a code against that table at write time and refuses
/// to log unknown codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCode {
    /// A petty-cash account was created.
    PettyCashAccountCreated,
    /// A petty-cash account's fields were updated.
    PettyCashAccountUpdated,
    /// A petty-cash account was soft-deleted.
    PettyCashAccountDeactivated,
    /// An employee submitted an expense request.
    ExpenseSubmitted,
    /// A finance officer approved an expense request.
    ExpenseApproved,
    /// A finance officer rejected an expense request.
    ExpenseRejected,
    /// An approved expense request was paid out.
    ExpenseDisbursed,
    /// An expense request's fields were updated.
    ExpenseUpdated,
    /// An expense request completed after reconciliation.
    ExpenseCompleted,
    /// An expense request was soft-deleted.
    ExpenseDeactivated,
    /// A user asked for a petty-cash top-up.
    TopUpRequested,
    /// The system auto-created a top-up below the balance threshold.
    TopUpAutoTriggered,
    /// A finance officer approved a top-up request.
    TopUpApproved,
    /// A finance officer rejected a top-up request.
    TopUpRejected,
    /// An approved top-up was credited into the account.
    TopUpDisbursed,
    /// A top-up request's fields were updated.
    TopUpUpdated,
    /// A top-up request was soft-deleted.
    TopUpDeactivated,
    /// An employee submitted reconciliation figures and a receipt.
    ReconciliationSubmitted,
    /// A reviewer accepted a reconciliation.
    ReconciliationCompleted,
    /// A reviewer returned a reconciliation for correction.
    ReconciliationReturned,
}

impl EventCode {
    /// Returns the string code stored in the ledger.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PettyCashAccountCreated => "petty_cash_account_created",
            Self::PettyCashAccountUpdated => "petty_cash_account_updated",
            Self::PettyCashAccountDeactivated => "petty_cash_account_deactivated",
            Self::ExpenseSubmitted => "expense_submitted",
            Self::ExpenseApproved => "expense_approved",
            Self::ExpenseRejected => "expense_rejected",
            Self::ExpenseDisbursed => "expense_disbursed",
            Self::ExpenseUpdated => "expense_updated",
            Self::ExpenseCompleted => "expense_completed",
            Self::ExpenseDeactivated => "expense_deactivated",
            Self::TopUpRequested => "topup_requested",
            Self::TopUpAutoTriggered => "topup_auto_triggered",
            Self::TopUpApproved => "topup_approved",
            Self::TopUpRejected => "topup_rejected",
            Self::TopUpDisbursed => "topup_disbursed",
            Self::TopUpUpdated => "topup_updated",
            Self::TopUpDeactivated => "topup_deactivated",
            Self::ReconciliationSubmitted => "reconciliation_submitted",
            Self::ReconciliationCompleted => "reconciliation_completed",
            Self::ReconciliationReturned => "reconciliation_returned_for_correction",
        }
    }

    /// Returns the human-readable name used for seed data.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::PettyCashAccountCreated => "Petty cash account created",
            Self::PettyCashAccountUpdated => "Petty cash account updated",
            Self::PettyCashAccountDeactivated => "Petty cash account deactivated",
            Self::ExpenseSubmitted => "Expense request submitted",
            Self::ExpenseApproved => "Expense request approved",
            Self::ExpenseRejected => "Expense request rejected",
            Self::ExpenseDisbursed => "Expense request disbursed",
            Self::ExpenseUpdated => "Expense request updated",
            Self::ExpenseCompleted => "Expense request completed",
            Self::ExpenseDeactivated => "Expense request deactivated",
            Self::TopUpRequested => "Top-up requested",
            Self::TopUpAutoTriggered => "Top-up auto-triggered",
            Self::TopUpApproved => "Top-up approved",
            Self::TopUpRejected => "Top-up rejected",
            Self::TopUpDisbursed => "Top-up disbursed",
            Self::TopUpUpdated => "Top-up updated",
            Self::TopUpDeactivated => "Top-up deactivated",
            Self::ReconciliationSubmitted => "Reconciliation submitted",
            Self::ReconciliationCompleted => "Reconciliation completed",
            Self::ReconciliationReturned => "Reconciliation returned for correction",
        }
    }

    /// Returns the category this event belongs to.
    #[must_use]
    pub fn category(&self) -> EventCategory {
        match self {
            Self::PettyCashAccountCreated
            | Self::PettyCashAccountUpdated
            | Self::PettyCashAccountDeactivated => EventCategory::PettyCash,
            Self::ExpenseSubmitted
            | Self::ExpenseApproved
            | Self::ExpenseRejected
            | Self::ExpenseDisbursed
            | Self::ExpenseUpdated
            | Self::ExpenseCompleted
            | Self::ExpenseDeactivated => EventCategory::Expense,
            Self::TopUpRequested
            | Self::TopUpAutoTriggered
            | Self::TopUpApproved
            | Self::TopUpRejected
            | Self::TopUpDisbursed
            | Self::TopUpUpdated
            | Self::TopUpDeactivated => EventCategory::TopUp,
            Self::ReconciliationSubmitted
            | Self::ReconciliationCompleted
            | Self::ReconciliationReturned => EventCategory::Reconciliation,
        }
    }

    /// All event codes, for seeding the `event_types` lookup table.
    #[must_use]
    pub fn all() -> &'static [Self] {
        &[
            Self::PettyCashAccountCreated,
            Self::PettyCashAccountUpdated,
            Self::PettyCashAccountDeactivated,
            Self::ExpenseSubmitted,
            Self::ExpenseApproved,
            Self::ExpenseRejected,
            Self::ExpenseDisbursed,
            Self::ExpenseUpdated,
            Self::ExpenseCompleted,
            Self::ExpenseDeactivated,
            Self::TopUpRequested,
            Self::TopUpAutoTriggered,
            Self::TopUpApproved,
            Self::TopUpRejected,
            Self::TopUpDisbursed,
            Self::TopUpUpdated,
            Self::TopUpDeactivated,
            Self::ReconciliationSubmitted,
            Self::ReconciliationCompleted,
            Self::ReconciliationReturned,
        ]
    }
}

impl fmt::Display for EventCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Typed reference to the entity an audit entry describes.
///
/// The ledger table stores this as an untyped `(entity_type, entity_id)`
/// string pair so it can describe any entity without a foreign key; call
/// sites use this enum instead of raw strings so the compiler keeps the
/// set of referenceable entities exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "entity_type", content = "entity_id")]
pub enum EntityRef {
    /// A user account.
    User(Uuid),
    /// A petty-cash account.
    PettyCashAccount(Uuid),
    /// An expense request.
    ExpenseRequest(Uuid),
    /// A top-up request.
    TopUpRequest(Uuid),
    /// A disbursement reconciliation.
    DisbursementReconciliation(Uuid),
}

impl EntityRef {
    /// Returns the entity type name stored in the ledger.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::User(_) => "User",
            Self::PettyCashAccount(_) => "PettyCashAccount",
            Self::ExpenseRequest(_) => "ExpenseRequest",
            Self::TopUpRequest(_) => "TopUpRequest",
            Self::DisbursementReconciliation(_) => "DisbursementReconciliation",
        }
    }

    /// Returns the referenced entity's id.
    #[must_use]
    pub fn id(&self) -> Uuid {
        match self {
            Self::User(id)
            | Self::PettyCashAccount(id)
            | Self::ExpenseRequest(id)
            | Self::TopUpRequest(id)
            | Self::DisbursementReconciliation(id) => *id,
        }
    }
}

/// Delivery channel of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Shown in the application inbox.
    #[default]
    InApp,
    /// Delivered by SMS (rendering is external).
    Sms,
    /// Delivered by email (rendering is external).
    Email,
}

impl Channel {
    /// Returns the string code of the channel.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InApp => "in_app",
            Self::Sms => "sms",
            Self::Email => "email",
        }
    }

    /// Parses a channel from its string code.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "in_app" => Some(Self::InApp),
            "sms" => Some(Self::Sms),
            "email" => Some(Self::Email),
            _ => None,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_codes_are_unique() {
        let codes: Vec<&str> = EventCode::all().iter().map(EventCode::as_str).collect();
        let mut deduped = codes.clone();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(codes.len(), deduped.len());
    }

    #[test]
    fn test_event_category_assignment() {
        assert_eq!(
            EventCode::ExpenseApproved.category(),
            EventCategory::Expense
        );
        assert_eq!(
            EventCode::TopUpAutoTriggered.category(),
            EventCategory::TopUp
        );
        assert_eq!(
            EventCode::ReconciliationReturned.category(),
            EventCategory::Reconciliation
        );
        assert_eq!(
            EventCode::PettyCashAccountCreated.category(),
            EventCategory::PettyCash
        );
    }

    #[test]
    fn test_entity_ref_parts() {
        let id = Uuid::new_v4();
        let entity = EntityRef::ExpenseRequest(id);
        assert_eq!(entity.type_name(), "ExpenseRequest");
        assert_eq!(entity.id(), id);
    }

    #[test]
    fn test_channel_round_trip() {
        for channel in [Channel::InApp, Channel::Sms, Channel::Email] {
            assert_eq!(Channel::parse(channel.as_str()), Some(channel));
        }
        assert_eq!(Channel::parse("pigeon"), None);
    }

    #[test]
    fn test_default_channel_is_in_app() {
        assert_eq!(Channel::default(), Channel::InApp);
    }
}
