//! Petty-cash account repository.
//!
//! Owns the single canonical balance. Balance mutations run under a row
//! lock; crossing below the minimum threshold auto-creates a system top-up
//! request unless one is already pending.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde_json::json;
use uuid::Uuid;

use imprest_core::account::{self, AccountError};
use imprest_core::ledger::{EntityRef, EventCode};

use crate::entities::{
    petty_cash_accounts,
    sea_orm_active_enums::{NotificationChannel, TopUpStatus},
    topup_requests,
};
use crate::repositories::ledger::{LedgerRepository, LogInput, INACTIVE_STATUS};
use crate::repositories::notification::NotificationRepository;
use crate::repositories::user::UserRepository;

/// Error types for petty-cash account operations.
#[derive(Debug, thiserror::Error)]
pub enum PettyCashError {
    /// Account not found or not active.
    #[error("Petty cash account not found: {0}")]
    AccountNotFound(Uuid),

    /// Only one account may be active at a time.
    #[error("An active petty cash account already exists")]
    ActiveAccountExists,

    /// Threshold must not be negative.
    #[error("Minimum threshold must not be negative, got {0}")]
    NegativeThreshold(Decimal),

    /// Balance arithmetic violation.
    #[error(transparent)]
    Balance(#[from] AccountError),

    /// Audit log write failed.
    #[error(transparent)]
    Logging(#[from] crate::repositories::ledger::LedgerError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl PettyCashError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::AccountNotFound(_) => 404,
            Self::ActiveAccountExists => 409,
            Self::NegativeThreshold(_) => 400,
            Self::Balance(e) => e.status_code(),
            Self::Logging(e) => e.status_code(),
            Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AccountNotFound(_) => "NOT_FOUND",
            Self::ActiveAccountExists => "ACTIVE_ACCOUNT_EXISTS",
            Self::NegativeThreshold(_) => "NEGATIVE_THRESHOLD",
            Self::Balance(e) => e.error_code(),
            Self::Logging(e) => e.error_code(),
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

/// Input for creating a petty-cash account.
#[derive(Debug, Clone)]
pub struct CreatePettyCashInput {
    /// Account name.
    pub name: String,
    /// Account description.
    pub description: Option<String>,
    /// Mobile-money phone number backing the account.
    pub phone_number: String,
    /// Balance level below which a top-up is auto-triggered.
    pub minimum_threshold: Decimal,
}

/// Input for updating a petty-cash account.
#[derive(Debug, Clone, Default)]
pub struct UpdatePettyCashInput {
    /// Account name.
    pub name: Option<String>,
    /// Account description.
    pub description: Option<String>,
    /// Mobile-money phone number.
    pub phone_number: Option<String>,
    /// Account type tag.
    pub account_type: Option<String>,
    /// Auto-replenishment threshold.
    pub minimum_threshold: Option<Decimal>,
}

/// Repository for petty-cash accounts.
#[derive(Debug, Clone)]
pub struct PettyCashRepository {
    db: DatabaseConnection,
}

impl PettyCashRepository {
    /// Creates a new petty-cash repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates the petty-cash account.
    ///
    /// # Errors
    ///
    /// * `PettyCashError::ActiveAccountExists` when an active account
    ///   already exists (single-active-account policy)
    /// * `PettyCashError::NegativeThreshold` for a negative threshold
    pub async fn create_account(
        &self,
        input: CreatePettyCashInput,
        actor: Uuid,
        ip_address: Option<String>,
    ) -> Result<petty_cash_accounts::Model, PettyCashError> {
        if input.minimum_threshold < Decimal::ZERO {
            return Err(PettyCashError::NegativeThreshold(input.minimum_threshold));
        }

        let txn = self.db.begin().await?;

        let existing = petty_cash_accounts::Entity::find()
            .filter(petty_cash_accounts::Column::IsActive.eq(true))
            .one(&txn)
            .await?;
        if existing.is_some() {
            return Err(PettyCashError::ActiveAccountExists);
        }

        let now = Utc::now().into();
        let account = petty_cash_accounts::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            description: Set(input.description),
            account_type: Set("mpesa".to_string()),
            phone_number: Set(input.phone_number),
            current_balance: Set(Decimal::ZERO),
            minimum_threshold: Set(input.minimum_threshold),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let account = account.insert(&txn).await?;

        LedgerRepository::append(
            &txn,
            LogInput::new(
                EventCode::PettyCashAccountCreated,
                EntityRef::PettyCashAccount(account.id),
                format!("Petty cash account \"{}\" created", account.name),
            )
            .triggered_by(actor)
            .metadata(json!({
                "account_id": account.id.to_string(),
                "account_name": account.name.clone(),
                "phone_number": account.phone_number.clone(),
                "minimum_threshold": account.minimum_threshold.to_string(),
                "created_by": actor.to_string(),
            }))
            .ip_address(ip_address),
        )
        .await?;

        txn.commit().await?;
        Ok(account)
    }

    /// Finds an active account by id.
    ///
    /// # Errors
    ///
    /// Returns `PettyCashError::AccountNotFound` when missing or inactive.
    pub async fn get(&self, account_id: Uuid) -> Result<petty_cash_accounts::Model, PettyCashError> {
        petty_cash_accounts::Entity::find_by_id(account_id)
            .filter(petty_cash_accounts::Column::IsActive.eq(true))
            .one(&self.db)
            .await?
            .ok_or(PettyCashError::AccountNotFound(account_id))
    }

    /// All active accounts, most recent first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_active(&self) -> Result<Vec<petty_cash_accounts::Model>, PettyCashError> {
        let accounts = petty_cash_accounts::Entity::find()
            .filter(petty_cash_accounts::Column::IsActive.eq(true))
            .order_by_desc(petty_cash_accounts::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(accounts)
    }

    /// Updates account fields, recording the old and new values.
    ///
    /// # Errors
    ///
    /// * `PettyCashError::AccountNotFound` when missing or inactive
    /// * `PettyCashError::NegativeThreshold` for a negative threshold
    pub async fn update_account(
        &self,
        account_id: Uuid,
        input: UpdatePettyCashInput,
        actor: Uuid,
        ip_address: Option<String>,
    ) -> Result<petty_cash_accounts::Model, PettyCashError> {
        if let Some(threshold) = input.minimum_threshold {
            if threshold < Decimal::ZERO {
                return Err(PettyCashError::NegativeThreshold(threshold));
            }
        }

        let txn = self.db.begin().await?;

        let account = petty_cash_accounts::Entity::find_by_id(account_id)
            .filter(petty_cash_accounts::Column::IsActive.eq(true))
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(PettyCashError::AccountNotFound(account_id))?;

        let mut old_values = serde_json::Map::new();
        let mut new_values = serde_json::Map::new();
        let mut active: petty_cash_accounts::ActiveModel = account.clone().into();

        if let Some(name) = input.name {
            old_values.insert("name".into(), json!(account.name));
            new_values.insert("name".into(), json!(name));
            active.name = Set(name);
        }
        if let Some(description) = input.description {
            old_values.insert("description".into(), json!(account.description));
            new_values.insert("description".into(), json!(description));
            active.description = Set(Some(description));
        }
        if let Some(phone_number) = input.phone_number {
            old_values.insert("phone_number".into(), json!(account.phone_number));
            new_values.insert("phone_number".into(), json!(phone_number));
            active.phone_number = Set(phone_number);
        }
        if let Some(account_type) = input.account_type {
            old_values.insert("account_type".into(), json!(account.account_type));
            new_values.insert("account_type".into(), json!(account_type));
            active.account_type = Set(account_type);
        }
        if let Some(minimum_threshold) = input.minimum_threshold {
            old_values.insert(
                "minimum_threshold".into(),
                json!(account.minimum_threshold.to_string()),
            );
            new_values.insert(
                "minimum_threshold".into(),
                json!(minimum_threshold.to_string()),
            );
            active.minimum_threshold = Set(minimum_threshold);
        }

        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await?;

        LedgerRepository::append(
            &txn,
            LogInput::new(
                EventCode::PettyCashAccountUpdated,
                EntityRef::PettyCashAccount(updated.id),
                format!("Petty cash account \"{}\" updated", updated.name),
            )
            .triggered_by(actor)
            .metadata(json!({
                "account_id": updated.id.to_string(),
                "account_name": updated.name.clone(),
                "changed_fields": old_values.keys().collect::<Vec<_>>(),
                "old_values": old_values,
                "new_values": new_values,
                "updated_by": actor.to_string(),
            }))
            .ip_address(ip_address),
        )
        .await?;

        txn.commit().await?;
        Ok(updated)
    }

    /// Soft-deletes the account. The balance does not have to be zero.
    ///
    /// # Errors
    ///
    /// Returns `PettyCashError::AccountNotFound` when missing.
    pub async fn deactivate_account(
        &self,
        account_id: Uuid,
        actor: Uuid,
        ip_address: Option<String>,
    ) -> Result<petty_cash_accounts::Model, PettyCashError> {
        let txn = self.db.begin().await?;

        let account = petty_cash_accounts::Entity::find_by_id(account_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(PettyCashError::AccountNotFound(account_id))?;

        let mut active: petty_cash_accounts::ActiveModel = account.into();
        active.is_active = Set(false);
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await?;

        LedgerRepository::append(
            &txn,
            LogInput::new(
                EventCode::PettyCashAccountDeactivated,
                EntityRef::PettyCashAccount(updated.id),
                format!("Petty cash account \"{}\" deactivated", updated.name),
            )
            .triggered_by(actor)
            .status_code(INACTIVE_STATUS)
            .metadata(json!({
                "account_id": updated.id.to_string(),
                "account_name": updated.name.clone(),
                "deactivated_by": actor.to_string(),
                "action": "deactivate",
            }))
            .ip_address(ip_address),
        )
        .await?;

        txn.commit().await?;
        Ok(updated)
    }

    /// Runs the below-threshold check and auto-creates a top-up if needed.
    ///
    /// # Errors
    ///
    /// Returns `PettyCashError::AccountNotFound` when missing or inactive.
    pub async fn check_and_trigger_topup(
        &self,
        account_id: Uuid,
    ) -> Result<Option<topup_requests::Model>, PettyCashError> {
        let txn = self.db.begin().await?;

        let account = petty_cash_accounts::Entity::find_by_id(account_id)
            .filter(petty_cash_accounts::Column::IsActive.eq(true))
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(PettyCashError::AccountNotFound(account_id))?;

        let triggered = Self::auto_replenish(&txn, &account).await?;

        txn.commit().await?;
        Ok(triggered)
    }

    /// Credits the account under a row lock, on the given connection.
    ///
    /// Called by the top-up workflow inside its disbursement transaction.
    pub(crate) async fn apply_credit<C: ConnectionTrait>(
        conn: &C,
        account_id: Uuid,
        amount: Decimal,
    ) -> Result<petty_cash_accounts::Model, PettyCashError> {
        let account = petty_cash_accounts::Entity::find_by_id(account_id)
            .filter(petty_cash_accounts::Column::IsActive.eq(true))
            .lock_exclusive()
            .one(conn)
            .await?
            .ok_or(PettyCashError::AccountNotFound(account_id))?;

        let new_balance = account::credit(account.current_balance, amount)?;

        let mut active: petty_cash_accounts::ActiveModel = account.into();
        active.current_balance = Set(new_balance);
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(conn).await?;
        Ok(updated)
    }

    /// Auto-creates a system top-up when the balance is below threshold.
    ///
    /// Silent no-op when the balance meets the threshold or a pending
    /// top-up already exists for the account — repeated checks must not
    /// spam duplicate requests.
    pub(crate) async fn auto_replenish<C: ConnectionTrait>(
        conn: &C,
        account: &petty_cash_accounts::Model,
    ) -> Result<Option<topup_requests::Model>, PettyCashError> {
        let Some(amount) =
            account::replenishment_amount(account.current_balance, account.minimum_threshold)
        else {
            return Ok(None);
        };

        let pending = topup_requests::Entity::find()
            .filter(topup_requests::Column::AccountId.eq(account.id))
            .filter(topup_requests::Column::Status.eq(TopUpStatus::Pending))
            .filter(topup_requests::Column::IsActive.eq(true))
            .one(conn)
            .await?;
        if pending.is_some() {
            return Ok(None);
        }

        let now = Utc::now().into();
        let topup = topup_requests::ActiveModel {
            id: Set(Uuid::new_v4()),
            account_id: Set(account.id),
            requested_by: Set(None),
            decision_by: Set(None),
            status: Set(TopUpStatus::Pending),
            amount: Set(amount),
            request_reason: Set("Automatic replenishment below minimum threshold".to_string()),
            decision_reason: Set(None),
            is_auto_triggered: Set(true),
            metadata: Set(json!({})),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let topup = topup.insert(conn).await?;

        let log = LedgerRepository::append(
            conn,
            LogInput::new(
                EventCode::TopUpAutoTriggered,
                EntityRef::TopUpRequest(topup.id),
                format!(
                    "Top-up of {} auto-triggered for account \"{}\"",
                    topup.amount, account.name
                ),
            )
            .metadata(json!({
                "topup_id": topup.id.to_string(),
                "account_id": account.id.to_string(),
                "account_name": account.name.clone(),
                "current_balance": account.current_balance.to_string(),
                "minimum_threshold": account.minimum_threshold.to_string(),
                "amount": topup.amount.to_string(),
                "is_auto_triggered": true,
            })),
        )
        .await?;

        let officers = UserRepository::finance_officer_ids(conn).await?;
        NotificationRepository::notify_many(conn, &log, &officers, NotificationChannel::InApp)
            .await?;

        Ok(Some(topup))
    }
}
