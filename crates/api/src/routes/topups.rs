//! Top-up request routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, patch, post},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::middleware::Actor;
use crate::routes::{app_error, error_response};
use crate::AppState;
use imprest_core::workflow::Decision;
use imprest_shared::AppError;
use imprest_db::entities::{sea_orm_active_enums::TopUpStatus, topup_requests};
use imprest_db::repositories::{TopUpRepository, UpdateTopUpInput};

/// Creates the top-up request routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/accounts/{account_id}/topups", post(create_topup))
        .route("/topups", get(list_topups))
        .route("/topups/mine", get(list_my_topups))
        .route("/topups/{topup_id}", get(get_topup))
        .route("/topups/{topup_id}", patch(update_topup))
        .route("/topups/{topup_id}", delete(deactivate_topup))
        .route("/topups/{topup_id}/decide", post(decide_topup))
        .route("/topups/{topup_id}/disburse", post(disburse_topup))
}

/// Request body for creating a top-up request.
#[derive(Debug, Deserialize)]
pub struct CreateTopUpRequest {
    /// Requested amount.
    pub amount: Decimal,
    /// Reason for the top-up.
    pub request_reason: String,
}

/// Request body for deciding a top-up request.
#[derive(Debug, Deserialize)]
pub struct DecideTopUpRequest {
    /// "approve" or "reject".
    pub decision: String,
    /// Optional reason for the decision.
    pub decision_reason: Option<String>,
}

/// Request body for updating a pending top-up request.
#[derive(Debug, Deserialize, Default)]
pub struct UpdateTopUpRequest {
    /// Requested amount.
    pub amount: Option<Decimal>,
    /// Reason for the top-up.
    pub request_reason: Option<String>,
}

/// Response for a top-up request.
#[derive(Debug, Serialize)]
pub struct TopUpResponse {
    /// Top-up request ID.
    pub id: Uuid,
    /// Target petty-cash account.
    pub account_id: Uuid,
    /// Requesting user; `null` for auto-triggered top-ups.
    pub requested_by: Option<Uuid>,
    /// Deciding finance officer.
    pub decision_by: Option<Uuid>,
    /// Current status.
    pub status: TopUpStatus,
    /// Requested amount.
    pub amount: String,
    /// Reason for the top-up.
    pub request_reason: String,
    /// Reason for the decision.
    pub decision_reason: Option<String>,
    /// True when the system created this request.
    pub is_auto_triggered: bool,
    /// Created at timestamp.
    pub created_at: String,
    /// Updated at timestamp.
    pub updated_at: String,
}

impl From<topup_requests::Model> for TopUpResponse {
    fn from(topup: topup_requests::Model) -> Self {
        Self {
            id: topup.id,
            account_id: topup.account_id,
            requested_by: topup.requested_by,
            decision_by: topup.decision_by,
            status: topup.status,
            amount: topup.amount.to_string(),
            request_reason: topup.request_reason,
            decision_reason: topup.decision_reason,
            is_auto_triggered: topup.is_auto_triggered,
            created_at: topup.created_at.to_rfc3339(),
            updated_at: topup.updated_at.to_rfc3339(),
        }
    }
}

/// POST `/accounts/{account_id}/topups` - Request a top-up.
async fn create_topup(
    State(state): State<AppState>,
    actor: Actor,
    Path(account_id): Path<Uuid>,
    Json(body): Json<CreateTopUpRequest>,
) -> impl IntoResponse {
    let repo = TopUpRepository::new((*state.db).clone());

    match repo
        .create(
            account_id,
            actor.user_id,
            body.amount,
            body.request_reason,
            actor.ip_address,
        )
        .await
    {
        Ok(topup) => (
            StatusCode::CREATED,
            Json(json!({ "topup": TopUpResponse::from(topup) })),
        )
            .into_response(),
        Err(e) => error_response(e.status_code(), e.error_code(), &e),
    }
}

/// GET `/topups` - List all top-up requests. Finance officer view.
async fn list_topups(State(state): State<AppState>, actor: Actor) -> impl IntoResponse {
    if let Err(response) = actor.require_officer() {
        return response;
    }

    let repo = TopUpRepository::new((*state.db).clone());

    match repo.list_all().await {
        Ok(topups) => {
            let items: Vec<TopUpResponse> = topups.into_iter().map(TopUpResponse::from).collect();
            (StatusCode::OK, Json(json!({ "topups": items }))).into_response()
        }
        Err(e) => error_response(e.status_code(), e.error_code(), &e),
    }
}

/// GET `/topups/mine` - List the caller's own top-up requests.
async fn list_my_topups(State(state): State<AppState>, actor: Actor) -> impl IntoResponse {
    let repo = TopUpRepository::new((*state.db).clone());

    match repo.list_for_requester(actor.user_id).await {
        Ok(topups) => {
            let items: Vec<TopUpResponse> = topups.into_iter().map(TopUpResponse::from).collect();
            (StatusCode::OK, Json(json!({ "topups": items }))).into_response()
        }
        Err(e) => error_response(e.status_code(), e.error_code(), &e),
    }
}

/// GET `/topups/{topup_id}` - Fetch one top-up request.
async fn get_topup(
    State(state): State<AppState>,
    _actor: Actor,
    Path(topup_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = TopUpRepository::new((*state.db).clone());

    match repo.get(topup_id).await {
        Ok(topup) => (
            StatusCode::OK,
            Json(json!({ "topup": TopUpResponse::from(topup) })),
        )
            .into_response(),
        Err(e) => error_response(e.status_code(), e.error_code(), &e),
    }
}

/// POST `/topups/{topup_id}/decide` - Approve or reject.
async fn decide_topup(
    State(state): State<AppState>,
    actor: Actor,
    Path(topup_id): Path<Uuid>,
    Json(body): Json<DecideTopUpRequest>,
) -> impl IntoResponse {
    if let Err(response) = actor.require_officer() {
        return response;
    }

    let Some(decision) = Decision::parse(&body.decision) else {
        return app_error(&AppError::Validation(
            "Decision must be 'approve' or 'reject'".to_string(),
        ));
    };

    let repo = TopUpRepository::new((*state.db).clone());

    match repo
        .decide(
            topup_id,
            decision,
            actor.user_id,
            body.decision_reason,
            actor.ip_address,
        )
        .await
    {
        Ok(topup) => (
            StatusCode::OK,
            Json(json!({ "topup": TopUpResponse::from(topup) })),
        )
            .into_response(),
        Err(e) => error_response(e.status_code(), e.error_code(), &e),
    }
}

/// POST `/topups/{topup_id}/disburse` - Credit the account.
async fn disburse_topup(
    State(state): State<AppState>,
    actor: Actor,
    Path(topup_id): Path<Uuid>,
) -> impl IntoResponse {
    if let Err(response) = actor.require_officer() {
        return response;
    }

    let repo = TopUpRepository::new((*state.db).clone());

    match repo
        .disburse(topup_id, actor.user_id, actor.ip_address)
        .await
    {
        Ok(topup) => (
            StatusCode::OK,
            Json(json!({ "topup": TopUpResponse::from(topup) })),
        )
            .into_response(),
        Err(e) => error_response(e.status_code(), e.error_code(), &e),
    }
}

/// PATCH `/topups/{topup_id}` - Update a pending request.
async fn update_topup(
    State(state): State<AppState>,
    actor: Actor,
    Path(topup_id): Path<Uuid>,
    Json(body): Json<UpdateTopUpRequest>,
) -> impl IntoResponse {
    let repo = TopUpRepository::new((*state.db).clone());
    let input = UpdateTopUpInput {
        amount: body.amount,
        request_reason: body.request_reason,
    };

    match repo
        .update(topup_id, input, actor.user_id, actor.ip_address)
        .await
    {
        Ok(topup) => (
            StatusCode::OK,
            Json(json!({ "topup": TopUpResponse::from(topup) })),
        )
            .into_response(),
        Err(e) => error_response(e.status_code(), e.error_code(), &e),
    }
}

/// DELETE `/topups/{topup_id}` - Soft-delete a request.
async fn deactivate_topup(
    State(state): State<AppState>,
    actor: Actor,
    Path(topup_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = TopUpRepository::new((*state.db).clone());

    match repo
        .deactivate(topup_id, actor.user_id, actor.ip_address)
        .await
    {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({ "message": "Top-up request deactivated successfully" })),
        )
            .into_response(),
        Err(e) => error_response(e.status_code(), e.error_code(), &e),
    }
}
