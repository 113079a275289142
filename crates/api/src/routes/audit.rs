//! Audit trail routes.
//!
//! Read-only projections over the append-only transaction log.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::middleware::Actor;
use crate::routes::error_response;
use crate::AppState;
use imprest_core::ledger::EntityRef;
use imprest_db::entities::transaction_logs;
use imprest_db::repositories::LedgerRepository;

/// Creates the audit routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/audit/{entity_type}/{entity_id}", get(entity_logs))
        .route("/audit/mine", get(my_logs))
}

/// Response for a ledger entry.
#[derive(Debug, Serialize)]
pub struct LogResponse {
    /// Ledger entry ID.
    pub id: Uuid,
    /// Who triggered the event; `null` means the system.
    pub triggered_by: Option<Uuid>,
    /// Human-readable event message.
    pub message: String,
    /// The described entity's type name.
    pub entity_type: String,
    /// The described entity's id.
    pub entity_id: String,
    /// Structured context payload.
    pub metadata: Option<serde_json::Value>,
    /// Created at timestamp.
    pub created_at: String,
}

impl From<transaction_logs::Model> for LogResponse {
    fn from(log: transaction_logs::Model) -> Self {
        Self {
            id: log.id,
            triggered_by: log.triggered_by,
            message: log.event_message,
            entity_type: log.entity_type,
            entity_id: log.entity_id,
            metadata: log.metadata,
            created_at: log.created_at.to_rfc3339(),
        }
    }
}

/// Parses a URL entity segment into a typed entity reference.
fn parse_entity(entity_type: &str, entity_id: Uuid) -> Option<EntityRef> {
    match entity_type {
        "users" => Some(EntityRef::User(entity_id)),
        "accounts" => Some(EntityRef::PettyCashAccount(entity_id)),
        "expenses" => Some(EntityRef::ExpenseRequest(entity_id)),
        "topups" => Some(EntityRef::TopUpRequest(entity_id)),
        "reconciliations" => Some(EntityRef::DisbursementReconciliation(entity_id)),
        _ => None,
    }
}

/// GET `/audit/{entity_type}/{entity_id}` - An entity's audit trail.
async fn entity_logs(
    State(state): State<AppState>,
    actor: Actor,
    Path((entity_type, entity_id)): Path<(String, Uuid)>,
) -> impl IntoResponse {
    if let Err(response) = actor.require_officer() {
        return response;
    }

    let Some(entity) = parse_entity(&entity_type, entity_id) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "VALIDATION_ERROR",
                "message": "Unknown entity type"
            })),
        )
            .into_response();
    };

    let repo = LedgerRepository::new((*state.db).clone());

    match repo.logs_for_entity(entity).await {
        Ok(logs) => {
            let items: Vec<LogResponse> = logs.into_iter().map(LogResponse::from).collect();
            (StatusCode::OK, Json(json!({ "logs": items }))).into_response()
        }
        Err(e) => error_response(e.status_code(), e.error_code(), &e),
    }
}

/// GET `/audit/mine` - Everything the caller has triggered.
async fn my_logs(State(state): State<AppState>, actor: Actor) -> impl IntoResponse {
    let repo = LedgerRepository::new((*state.db).clone());

    match repo.logs_by_user(actor.user_id).await {
        Ok(logs) => {
            let items: Vec<LogResponse> = logs.into_iter().map(LogResponse::from).collect();
            (StatusCode::OK, Json(json!({ "logs": items }))).into_response()
        }
        Err(e) => error_response(e.status_code(), e.error_code(), &e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_entity_segments() {
        let id = Uuid::new_v4();
        assert!(matches!(
            parse_entity("expenses", id),
            Some(EntityRef::ExpenseRequest(parsed)) if parsed == id
        ));
        assert!(matches!(
            parse_entity("accounts", id),
            Some(EntityRef::PettyCashAccount(_))
        ));
        assert!(parse_entity("budgets", id).is_none());
    }
}
