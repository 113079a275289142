//! Expense request routes.

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
use imprest_db::entities::{
    expense_requests,
    sea_orm_active_enums::{ExpenseStatus, ExpenseType},
};
use imprest_db::repositories::{CreateExpenseInput, ExpenseRepository, UpdateExpenseInput};

/// Creates the expense request routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/expenses", post(create_expense))
        .route("/expenses", get(list_expenses))
        .route("/expenses/mine", get(list_my_expenses))
        .route("/expenses/{expense_id}", get(get_expense))
        .route("/expenses/{expense_id}", patch(update_expense))
        .route("/expenses/{expense_id}", delete(deactivate_expense))
        .route("/expenses/{expense_id}/decide", post(decide_expense))
        .route("/expenses/{expense_id}/disburse", post(disburse_expense))
}

/// Request body for creating an expense request.
#[derive(Debug, Deserialize)]
pub struct CreateExpenseRequest {
    /// Expense type: "reimbursement" or "disbursement".
    pub expense_type: ExpenseType,
    /// Requested amount.
    pub amount: Decimal,
    /// Short title.
    pub title: String,
    /// Detailed description.
    pub description: String,
    /// Payout phone number for disbursement-type requests.
    pub phone_number: Option<String>,
    /// Uploaded receipt URLs. Required for reimbursement requests.
    #[serde(default)]
    pub receipt_urls: Vec<String>,
}

/// Request body for deciding an expense request.
#[derive(Debug, Deserialize)]
pub struct DecideExpenseRequest {
    /// "approve" or "reject".
    pub decision: String,
    /// Optional reason for the decision.
    pub reason: Option<String>,
}

/// Request body for updating a pending expense request.
#[derive(Debug, Deserialize, Default)]
pub struct UpdateExpenseRequest {
    /// Short title.
    pub title: Option<String>,
    /// Detailed description.
    pub description: Option<String>,
    /// Payout phone number.
    pub phone_number: Option<String>,
    /// Requested amount.
    pub amount: Option<Decimal>,
    /// Uploaded receipt URLs.
    pub receipt_urls: Option<Vec<String>>,
}

/// Response for an expense request.
#[derive(Debug, Serialize)]
pub struct ExpenseResponse {
    /// Expense request ID.
    pub id: Uuid,
    /// The submitting employee.
    pub employee_id: Uuid,
    /// Expense type.
    pub expense_type: ExpenseType,
    /// Current status.
    pub status: ExpenseStatus,
    /// Short title.
    pub title: String,
    /// Detailed description.
    pub description: String,
    /// Payout phone number.
    pub phone_number: Option<String>,
    /// Requested amount.
    pub amount: String,
    /// Uploaded receipt URLs.
    pub receipt_urls: serde_json::Value,
    /// Decision/disbursement audit fields.
    pub metadata: serde_json::Value,
    /// Created at timestamp.
    pub created_at: String,
    /// Updated at timestamp.
    pub updated_at: String,
}

impl From<expense_requests::Model> for ExpenseResponse {
    fn from(expense: expense_requests::Model) -> Self {
        Self {
            id: expense.id,
            employee_id: expense.employee_id,
            expense_type: expense.expense_type,
            status: expense.status,
            title: expense.title,
            description: expense.description,
            phone_number: expense.phone_number,
            amount: expense.amount.to_string(),
            receipt_urls: expense.receipt_urls,
            metadata: expense.metadata,
            created_at: expense.created_at.to_rfc3339(),
            updated_at: expense.updated_at.to_rfc3339(),
        }
    }
}

/// POST `/expenses` - Submit a new expense request.
async fn create_expense(
    State(state): State<AppState>,
    actor: Actor,
    Json(body): Json<CreateExpenseRequest>,
) -> impl IntoResponse {
    let repo = ExpenseRepository::new((*state.db).clone());
    let input = CreateExpenseInput {
        employee_id: actor.user_id,
        expense_type: body.expense_type,
        amount: body.amount,
        title: body.title,
        description: body.description,
        phone_number: body.phone_number,
        receipt_urls: body.receipt_urls,
    };

    match repo.create(input, actor.ip_address).await {
        Ok(expense) => (
            StatusCode::CREATED,
            Json(json!({ "expense": ExpenseResponse::from(expense) })),
        )
            .into_response(),
        Err(e) => error_response(e.status_code(), e.error_code(), &e),
    }
}

/// GET `/expenses` - List all expense requests. Finance officer view.
async fn list_expenses(State(state): State<AppState>, actor: Actor) -> impl IntoResponse {
    if let Err(response) = actor.require_officer() {
        return response;
    }

    let repo = ExpenseRepository::new((*state.db).clone());

    match repo.list_all().await {
        Ok(expenses) => {
            let items: Vec<ExpenseResponse> =
                expenses.into_iter().map(ExpenseResponse::from).collect();
            (StatusCode::OK, Json(json!({ "expenses": items }))).into_response()
        }
        Err(e) => error_response(e.status_code(), e.error_code(), &e),
    }
}

/// GET `/expenses/mine` - List the caller's own expense requests.
async fn list_my_expenses(State(state): State<AppState>, actor: Actor) -> impl IntoResponse {
    let repo = ExpenseRepository::new((*state.db).clone());

    match repo.list_for_employee(actor.user_id).await {
        Ok(expenses) => {
            let items: Vec<ExpenseResponse> =
                expenses.into_iter().map(ExpenseResponse::from).collect();
            (StatusCode::OK, Json(json!({ "expenses": items }))).into_response()
        }
        Err(e) => error_response(e.status_code(), e.error_code(), &e),
    }
}

/// GET `/expenses/{expense_id}` - Fetch one expense request.
async fn get_expense(
    State(state): State<AppState>,
    _actor: Actor,
    Path(expense_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = ExpenseRepository::new((*state.db).clone());

    match repo.get(expense_id).await {
        Ok(expense) => (
            StatusCode::OK,
            Json(json!({ "expense": ExpenseResponse::from(expense) })),
        )
            .into_response(),
        Err(e) => error_response(e.status_code(), e.error_code(), &e),
    }
}

/// POST `/expenses/{expense_id}/decide` - Approve or reject.
async fn decide_expense(
    State(state): State<AppState>,
    actor: Actor,
    Path(expense_id): Path<Uuid>,
    Json(body): Json<DecideExpenseRequest>,
) -> impl IntoResponse {
    if let Err(response) = actor.require_officer() {
        return response;
    }

    let Some(decision) = Decision::parse(&body.decision) else {
        return app_error(&AppError::Validation(
            "Decision must be 'approve' or 'reject'".to_string(),
        ));
    };

    let repo = ExpenseRepository::new((*state.db).clone());

    match repo
        .decide(expense_id, decision, actor.user_id, body.reason, actor.ip_address)
        .await
    {
        Ok(expense) => (
            StatusCode::OK,
            Json(json!({ "expense": ExpenseResponse::from(expense) })),
        )
            .into_response(),
        Err(e) => error_response(e.status_code(), e.error_code(), &e),
    }
}

/// POST `/expenses/{expense_id}/disburse` - Pay out an approved request.
async fn disburse_expense(
    State(state): State<AppState>,
    actor: Actor,
    Path(expense_id): Path<Uuid>,
) -> impl IntoResponse {
    if let Err(response) = actor.require_officer() {
        return response;
    }

    let repo = ExpenseRepository::new((*state.db).clone());

    match repo
        .disburse(expense_id, actor.user_id, actor.ip_address)
        .await
    {
        Ok((expense, reconciliation)) => (
            StatusCode::OK,
            Json(json!({
                "expense": ExpenseResponse::from(expense),
                "reconciliation_id": reconciliation.map(|r| r.id),
            })),
        )
            .into_response(),
        Err(e) => error_response(e.status_code(), e.error_code(), &e),
    }
}

/// PATCH `/expenses/{expense_id}` - Update a pending request.
async fn update_expense(
    State(state): State<AppState>,
    actor: Actor,
    Path(expense_id): Path<Uuid>,
    Json(body): Json<UpdateExpenseRequest>,
) -> impl IntoResponse {
    let repo = ExpenseRepository::new((*state.db).clone());
    let input = UpdateExpenseInput {
        title: body.title,
        description: body.description,
        phone_number: body.phone_number,
        amount: body.amount,
        receipt_urls: body.receipt_urls,
    };

    match repo
        .update(expense_id, input, actor.user_id, actor.ip_address)
        .await
    {
        Ok(expense) => (
            StatusCode::OK,
            Json(json!({ "expense": ExpenseResponse::from(expense) })),
        )
            .into_response(),
        Err(e) => error_response(e.status_code(), e.error_code(), &e),
    }
}

/// DELETE `/expenses/{expense_id}` - Soft-delete a request.
async fn deactivate_expense(
    State(state): State<AppState>,
    actor: Actor,
    Path(expense_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = ExpenseRepository::new((*state.db).clone());

    match repo
        .deactivate(expense_id, actor.user_id, actor.ip_address)
        .await
    {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({ "message": "Expense request deactivated successfully" })),
        )
            .into_response(),
        Err(e) => error_response(e.status_code(), e.error_code(), &e),
    }
}
