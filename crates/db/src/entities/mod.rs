//! `SeaORM` entity definitions.

pub mod disbursement_reconciliations;
pub mod event_types;
pub mod expense_requests;
pub mod notifications;
pub mod petty_cash_accounts;
pub mod sea_orm_active_enums;
pub mod statuses;
pub mod topup_requests;
pub mod transaction_logs;
pub mod users;
