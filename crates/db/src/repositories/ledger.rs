//! Append-only audit ledger.
//!
//! Every state-changing operation appends one entry here, inside the same
//! database transaction as the mutation it describes. A failed append
//! aborts the whole operation: audit completeness is an invariant, not a
//! best effort.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use imprest_core::ledger::{EntityRef, EventCode};

use crate::entities::{event_types, statuses, transaction_logs};

/// Status code recorded on ordinary (active) ledger entries.
pub const ACTIVE_STATUS: &str = "ACT";

/// Status code recorded when an entity is deactivated.
pub const INACTIVE_STATUS: &str = "INACT";

/// Error types for ledger operations.
///
/// All variants surface as `LOGGING_ERROR` to callers: they mean the
/// business operation could not be audited, which is distinct from the
/// operation itself being invalid.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The event code has no row in the event_types lookup.
    #[error("Unknown event code '{0}'")]
    UnknownEventCode(String),

    /// The status code has no row in the statuses lookup.
    #[error("Unknown status code '{0}'")]
    UnknownStatusCode(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl LedgerError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        500
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        "LOGGING_ERROR"
    }
}

/// Input for appending a ledger entry.
#[derive(Debug, Clone)]
pub struct LogInput {
    /// The event being recorded.
    pub event: EventCode,
    /// Who triggered it; `None` means the system.
    pub triggered_by: Option<Uuid>,
    /// The entity the entry describes.
    pub entity: EntityRef,
    /// Status code resolved against the statuses lookup.
    pub status_code: String,
    /// Human-readable event message.
    pub message: String,
    /// Structured context payload (actor, old/new values, derived fields).
    pub metadata: serde_json::Value,
    /// Request IP, when the event came from an HTTP call.
    pub ip_address: Option<String>,
}

impl LogInput {
    /// Creates an input with the default `ACT` status and empty metadata.
    #[must_use]
    pub fn new(event: EventCode, entity: EntityRef, message: impl Into<String>) -> Self {
        Self {
            event,
            triggered_by: None,
            entity,
            status_code: ACTIVE_STATUS.to_string(),
            message: message.into(),
            metadata: serde_json::json!({}),
            ip_address: None,
        }
    }

    /// Sets the triggering user.
    #[must_use]
    pub fn triggered_by(mut self, user_id: Uuid) -> Self {
        self.triggered_by = Some(user_id);
        self
    }

    /// Overrides the status code.
    #[must_use]
    pub fn status_code(mut self, code: &str) -> Self {
        self.status_code = code.to_string();
        self
    }

    /// Sets the structured metadata payload.
    #[must_use]
    pub fn metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Sets the request IP address.
    #[must_use]
    pub fn ip_address(mut self, ip: Option<String>) -> Self {
        self.ip_address = ip;
        self
    }
}

/// Repository for the append-only transaction log.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    db: DatabaseConnection,
}

impl LedgerRepository {
    /// Creates a new ledger repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Appends a ledger entry on the given connection.
    ///
    /// Takes any connection so workflow repositories can append inside
    /// their own transactions. Resolution of the event and status codes
    /// happens here; both must pre-exist in their lookup tables.
    ///
    /// # Errors
    ///
    /// * `LedgerError::UnknownEventCode` / `UnknownStatusCode` when a
    ///   lookup row is missing
    /// * `LedgerError::Database` on storage failure
    pub async fn append<C: ConnectionTrait>(
        conn: &C,
        input: LogInput,
    ) -> Result<transaction_logs::Model, LedgerError> {
        let event_type = event_types::Entity::find()
            .filter(event_types::Column::Code.eq(input.event.as_str()))
            .one(conn)
            .await?
            .ok_or_else(|| LedgerError::UnknownEventCode(input.event.as_str().to_string()))?;

        let status = statuses::Entity::find()
            .filter(statuses::Column::Code.eq(input.status_code.as_str()))
            .one(conn)
            .await?
            .ok_or_else(|| LedgerError::UnknownStatusCode(input.status_code.clone()))?;

        let entry = transaction_logs::ActiveModel {
            id: Set(Uuid::new_v4()),
            event_type_id: Set(event_type.id),
            status_id: Set(status.id),
            triggered_by: Set(input.triggered_by),
            event_message: Set(input.message),
            metadata: Set(Some(input.metadata)),
            entity_type: Set(input.entity.type_name().to_string()),
            entity_id: Set(input.entity.id().to_string()),
            ip_address: Set(input.ip_address),
            created_at: Set(Utc::now().into()),
        };

        Ok(entry.insert(conn).await?)
    }

    /// Appends a ledger entry using the repository's own connection.
    ///
    /// # Errors
    ///
    /// See [`Self::append`].
    pub async fn log(&self, input: LogInput) -> Result<transaction_logs::Model, LedgerError> {
        Self::append(&self.db, input).await
    }

    /// All entries describing one entity, most recent first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn logs_for_entity(
        &self,
        entity: EntityRef,
    ) -> Result<Vec<transaction_logs::Model>, LedgerError> {
        let logs = transaction_logs::Entity::find()
            .filter(transaction_logs::Column::EntityType.eq(entity.type_name()))
            .filter(transaction_logs::Column::EntityId.eq(entity.id().to_string()))
            .order_by_desc(transaction_logs::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(logs)
    }

    /// All entries for one event code, most recent first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn logs_by_event(
        &self,
        event: EventCode,
    ) -> Result<Vec<transaction_logs::Model>, LedgerError> {
        let event_type = event_types::Entity::find()
            .filter(event_types::Column::Code.eq(event.as_str()))
            .one(&self.db)
            .await?
            .ok_or_else(|| LedgerError::UnknownEventCode(event.as_str().to_string()))?;

        let logs = transaction_logs::Entity::find()
            .filter(transaction_logs::Column::EventTypeId.eq(event_type.id))
            .order_by_desc(transaction_logs::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(logs)
    }

    /// Everything a specific user has triggered, most recent first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn logs_by_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<transaction_logs::Model>, LedgerError> {
        let logs = transaction_logs::Entity::find()
            .filter(transaction_logs::Column::TriggeredBy.eq(user_id))
            .order_by_desc(transaction_logs::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(logs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imprest_core::ledger::EventCode;

    #[test]
    fn test_log_input_defaults() {
        let entity = EntityRef::ExpenseRequest(Uuid::new_v4());
        let input = LogInput::new(EventCode::ExpenseSubmitted, entity, "submitted");
        assert_eq!(input.status_code, ACTIVE_STATUS);
        assert!(input.triggered_by.is_none());
        assert!(input.ip_address.is_none());
        assert_eq!(input.metadata, serde_json::json!({}));
    }

    #[test]
    fn test_log_input_builder() {
        let actor = Uuid::new_v4();
        let entity = EntityRef::TopUpRequest(Uuid::new_v4());
        let input = LogInput::new(EventCode::TopUpDeactivated, entity, "deactivated")
            .triggered_by(actor)
            .status_code(INACTIVE_STATUS)
            .ip_address(Some("10.0.0.1".to_string()));
        assert_eq!(input.triggered_by, Some(actor));
        assert_eq!(input.status_code, "INACT");
        assert_eq!(input.ip_address.as_deref(), Some("10.0.0.1"));
    }

    #[test]
    fn test_ledger_error_surfaces_as_logging_error() {
        let err = LedgerError::UnknownEventCode("nope".to_string());
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.error_code(), "LOGGING_ERROR");
        let err = LedgerError::UnknownStatusCode("nope".to_string());
        assert_eq!(err.error_code(), "LOGGING_ERROR");
    }
}
