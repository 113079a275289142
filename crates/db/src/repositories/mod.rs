//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations, hiding
//! the `SeaORM` implementation details from the rest of the application.
//! Workflow repositories run their mutation, audit append, and
//! notification fan-out in a single database transaction.

pub mod account;
pub mod expense;
pub mod ledger;
pub mod notification;
pub mod reconciliation;
pub mod topup;
pub mod user;

pub use account::{
    CreatePettyCashInput, PettyCashError, PettyCashRepository, UpdatePettyCashInput,
};
pub use expense::{CreateExpenseInput, ExpenseError, ExpenseRepository, UpdateExpenseInput};
pub use ledger::{LedgerError, LedgerRepository, LogInput, ACTIVE_STATUS, INACTIVE_STATUS};
pub use notification::{NotificationError, NotificationRepository};
pub use reconciliation::{ReconciliationError, ReconciliationRepository, SubmitReceiptInput};
pub use topup::{TopUpError, TopUpRepository, UpdateTopUpInput};
pub use user::UserRepository;

/// Merges a JSON object patch into an existing JSON object.
///
/// Non-object bases are replaced wholesale. Used to fold decision and
/// disbursement audit fields into an entity's metadata map.
pub(crate) fn merge_json(
    base: &serde_json::Value,
    patch: serde_json::Value,
) -> serde_json::Value {
    match (base, patch) {
        (serde_json::Value::Object(base_map), serde_json::Value::Object(patch_map)) => {
            let mut merged = base_map.clone();
            for (key, value) in patch_map {
                merged.insert(key, value);
            }
            serde_json::Value::Object(merged)
        }
        (_, patch) => patch,
    }
}

#[cfg(test)]
mod tests {
    use super::merge_json;
    use serde_json::json;

    #[test]
    fn test_merge_json_adds_and_overwrites() {
        let base = json!({ "a": 1, "b": "old" });
        let merged = merge_json(&base, json!({ "b": "new", "c": true }));
        assert_eq!(merged, json!({ "a": 1, "b": "new", "c": true }));
    }

    #[test]
    fn test_merge_json_replaces_non_object_base() {
        let base = json!(null);
        let merged = merge_json(&base, json!({ "a": 1 }));
        assert_eq!(merged, json!({ "a": 1 }));
    }
}
