//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Repository abstractions for data access
//! - Database migrations
//!
//! The repositories own the transactional choreography of the workflow
//! engine: every state change locks its row, validates the transition
//! through `imprest-core`, appends the audit log entry, and fans out
//! notifications — all inside one database transaction.

pub mod entities;
pub mod migration;
pub mod repositories;

pub use repositories::{
    ExpenseRepository, LedgerRepository, NotificationRepository, PettyCashRepository,
    ReconciliationRepository, TopUpRepository, UserRepository,
};

use sea_orm::{Database, DatabaseConnection, DbErr};

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}
