//! Disbursement reconciliation routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::middleware::Actor;
use crate::routes::{app_error, error_response};
use crate::AppState;
use imprest_core::workflow::ReviewDecision;
use imprest_shared::AppError;
use imprest_db::entities::{
    disbursement_reconciliations, sea_orm_active_enums::ReconciliationStatus,
};
use imprest_db::repositories::{ReconciliationRepository, SubmitReceiptInput};

/// Creates the reconciliation routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reconciliations", get(list_reconciliations))
        .route("/reconciliations/mine", get(list_my_reconciliations))
        .route("/reconciliations/{reconciliation_id}", get(get_reconciliation))
        .route(
            "/expenses/{expense_id}/reconciliation",
            get(get_by_expense),
        )
        .route(
            "/reconciliations/{reconciliation_id}/submit",
            post(submit_receipt),
        )
        .route(
            "/reconciliations/{reconciliation_id}/review",
            post(review_reconciliation),
        )
}

/// Request body for submitting reconciliation figures.
#[derive(Debug, Deserialize)]
pub struct SubmitReceiptRequest {
    /// Amount actually spent.
    pub reconciled_amount: Decimal,
    /// Cash returned if underspent.
    pub surplus_returned: Decimal,
    /// Uploaded receipt URLs; at least one is required.
    #[serde(default)]
    pub receipt_urls: Vec<String>,
    /// Notes from the employee.
    pub comments: Option<String>,
}

/// Request body for reviewing a reconciliation.
#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    /// "complete" or "return_for_correction".
    pub decision: String,
    /// Feedback. Useful on a return so the employee knows what to fix.
    pub comments: Option<String>,
}

/// Response for a reconciliation.
#[derive(Debug, Serialize)]
pub struct ReconciliationResponse {
    /// Reconciliation ID.
    pub id: Uuid,
    /// The paired expense request.
    pub expense_request_id: Uuid,
    /// The employee accountable for the cash.
    pub submitted_by: Uuid,
    /// The accepting finance officer.
    pub approved_by: Option<Uuid>,
    /// When the reconciliation was accepted.
    pub approved_at: Option<String>,
    /// Current status.
    pub status: ReconciliationStatus,
    /// Amount that was disbursed.
    pub total_amount: String,
    /// Amount actually spent.
    pub reconciled_amount: Option<String>,
    /// Cash returned if underspent.
    pub surplus_returned: Option<String>,
    /// Uploaded receipt URLs.
    pub receipt_urls: Option<serde_json::Value>,
    /// Comments.
    pub comments: Option<String>,
    /// Created at timestamp.
    pub created_at: String,
    /// Updated at timestamp.
    pub updated_at: String,
}

impl From<disbursement_reconciliations::Model> for ReconciliationResponse {
    fn from(row: disbursement_reconciliations::Model) -> Self {
        Self {
            id: row.id,
            expense_request_id: row.expense_request_id,
            submitted_by: row.submitted_by,
            approved_by: row.approved_by,
            approved_at: row.approved_at.map(|t| t.to_rfc3339()),
            status: row.status,
            total_amount: row.total_amount.to_string(),
            reconciled_amount: row.reconciled_amount.map(|a| a.to_string()),
            surplus_returned: row.surplus_returned.map(|a| a.to_string()),
            receipt_urls: row.receipt_urls,
            comments: row.comments,
            created_at: row.created_at.to_rfc3339(),
            updated_at: row.updated_at.to_rfc3339(),
        }
    }
}

/// GET `/reconciliations` - List all reconciliations. Finance officer view.
async fn list_reconciliations(State(state): State<AppState>, actor: Actor) -> impl IntoResponse {
    if let Err(response) = actor.require_officer() {
        return response;
    }

    let repo = ReconciliationRepository::new((*state.db).clone());

    match repo.list_all().await {
        Ok(rows) => {
            let items: Vec<ReconciliationResponse> =
                rows.into_iter().map(ReconciliationResponse::from).collect();
            (StatusCode::OK, Json(json!({ "reconciliations": items }))).into_response()
        }
        Err(e) => error_response(e.status_code(), e.error_code(), &e),
    }
}

/// GET `/reconciliations/mine` - The caller's reconciliation history.
async fn list_my_reconciliations(
    State(state): State<AppState>,
    actor: Actor,
) -> impl IntoResponse {
    let repo = ReconciliationRepository::new((*state.db).clone());

    match repo.list_for_submitter(actor.user_id).await {
        Ok(rows) => {
            let items: Vec<ReconciliationResponse> =
                rows.into_iter().map(ReconciliationResponse::from).collect();
            (StatusCode::OK, Json(json!({ "reconciliations": items }))).into_response()
        }
        Err(e) => error_response(e.status_code(), e.error_code(), &e),
    }
}

/// GET `/reconciliations/{reconciliation_id}` - Fetch one reconciliation.
async fn get_reconciliation(
    State(state): State<AppState>,
    _actor: Actor,
    Path(reconciliation_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = ReconciliationRepository::new((*state.db).clone());

    match repo.get(reconciliation_id).await {
        Ok(row) => (
            StatusCode::OK,
            Json(json!({ "reconciliation": ReconciliationResponse::from(row) })),
        )
            .into_response(),
        Err(e) => error_response(e.status_code(), e.error_code(), &e),
    }
}

/// GET `/expenses/{expense_id}/reconciliation` - The paired reconciliation.
async fn get_by_expense(
    State(state): State<AppState>,
    _actor: Actor,
    Path(expense_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = ReconciliationRepository::new((*state.db).clone());

    match repo.get_by_expense(expense_id).await {
        Ok(Some(row)) => (
            StatusCode::OK,
            Json(json!({ "reconciliation": ReconciliationResponse::from(row) })),
        )
            .into_response(),
        Ok(None) => app_error(&AppError::NotFound(
            "No reconciliation exists for this expense request".to_string(),
        )),
        Err(e) => error_response(e.status_code(), e.error_code(), &e),
    }
}

/// POST `/reconciliations/{reconciliation_id}/submit` - Report actual spend.
async fn submit_receipt(
    State(state): State<AppState>,
    actor: Actor,
    Path(reconciliation_id): Path<Uuid>,
    Json(body): Json<SubmitReceiptRequest>,
) -> impl IntoResponse {
    let repo = ReconciliationRepository::new((*state.db).clone());
    let input = SubmitReceiptInput {
        reconciled_amount: body.reconciled_amount,
        surplus_returned: body.surplus_returned,
        receipt_urls: body.receipt_urls,
        comments: body.comments,
    };

    match repo
        .submit_receipt(reconciliation_id, actor.user_id, input, actor.ip_address)
        .await
    {
        Ok(row) => (
            StatusCode::OK,
            Json(json!({ "reconciliation": ReconciliationResponse::from(row) })),
        )
            .into_response(),
        Err(e) => error_response(e.status_code(), e.error_code(), &e),
    }
}

/// POST `/reconciliations/{reconciliation_id}/review` - Accept or return.
async fn review_reconciliation(
    State(state): State<AppState>,
    actor: Actor,
    Path(reconciliation_id): Path<Uuid>,
    Json(body): Json<ReviewRequest>,
) -> impl IntoResponse {
    if let Err(response) = actor.require_officer() {
        return response;
    }

    let Some(decision) = ReviewDecision::parse(&body.decision) else {
        return app_error(&AppError::Validation(
            "Decision must be 'complete' or 'return_for_correction'".to_string(),
        ));
    };

    let repo = ReconciliationRepository::new((*state.db).clone());

    match repo
        .review(
            reconciliation_id,
            decision,
            actor.user_id,
            body.comments,
            actor.ip_address,
        )
        .await
    {
        Ok(row) => (
            StatusCode::OK,
            Json(json!({ "reconciliation": ReconciliationResponse::from(row) })),
        )
            .into_response(),
        Err(e) => error_response(e.status_code(), e.error_code(), &e),
    }
}
