//! Petty-cash account routes.

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
use crate::routes::error_response;
use crate::AppState;
use imprest_db::entities::petty_cash_accounts;
use imprest_db::repositories::{
    CreatePettyCashInput, PettyCashRepository, UpdatePettyCashInput,
};

/// Creates the petty-cash account routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/accounts", post(create_account))
        .route("/accounts", get(list_accounts))
        .route("/accounts/{account_id}", get(get_account))
        .route("/accounts/{account_id}", patch(update_account))
        .route("/accounts/{account_id}", delete(deactivate_account))
        .route("/accounts/{account_id}/check-topup", post(check_topup))
}

/// Request body for creating an account.
#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    /// Account name.
    pub name: String,
    /// Account description.
    pub description: Option<String>,
    /// Mobile-money phone number backing the account.
    pub phone_number: String,
    /// Balance level below which a top-up is auto-triggered.
    pub minimum_threshold: Decimal,
}

/// Request body for updating an account.
#[derive(Debug, Deserialize, Default)]
pub struct UpdateAccountRequest {
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

/// Response for a petty-cash account.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    /// Account ID.
    pub id: Uuid,
    /// Account name.
    pub name: String,
    /// Account description.
    pub description: Option<String>,
    /// Account type tag.
    pub account_type: String,
    /// Mobile-money phone number.
    pub phone_number: String,
    /// Current balance.
    pub current_balance: String,
    /// Auto-replenishment threshold.
    pub minimum_threshold: String,
    /// Whether the account is active.
    pub is_active: bool,
    /// Created at timestamp.
    pub created_at: String,
    /// Updated at timestamp.
    pub updated_at: String,
}

impl From<petty_cash_accounts::Model> for AccountResponse {
    fn from(account: petty_cash_accounts::Model) -> Self {
        Self {
            id: account.id,
            name: account.name,
            description: account.description,
            account_type: account.account_type,
            phone_number: account.phone_number,
            current_balance: account.current_balance.to_string(),
            minimum_threshold: account.minimum_threshold.to_string(),
            is_active: account.is_active,
            created_at: account.created_at.to_rfc3339(),
            updated_at: account.updated_at.to_rfc3339(),
        }
    }
}

/// POST `/accounts` - Create the petty-cash account.
async fn create_account(
    State(state): State<AppState>,
    actor: Actor,
    Json(body): Json<CreateAccountRequest>,
) -> impl IntoResponse {
    if let Err(response) = actor.require_admin() {
        return response;
    }

    let repo = PettyCashRepository::new((*state.db).clone());
    let input = CreatePettyCashInput {
        name: body.name,
        description: body.description,
        phone_number: body.phone_number,
        minimum_threshold: body.minimum_threshold,
    };

    match repo
        .create_account(input, actor.user_id, actor.ip_address)
        .await
    {
        Ok(account) => (
            StatusCode::CREATED,
            Json(json!({ "account": AccountResponse::from(account) })),
        )
            .into_response(),
        Err(e) => error_response(e.status_code(), e.error_code(), &e),
    }
}

/// GET `/accounts` - List active accounts.
async fn list_accounts(State(state): State<AppState>, _actor: Actor) -> impl IntoResponse {
    let repo = PettyCashRepository::new((*state.db).clone());

    match repo.list_active().await {
        Ok(accounts) => {
            let items: Vec<AccountResponse> =
                accounts.into_iter().map(AccountResponse::from).collect();
            (StatusCode::OK, Json(json!({ "accounts": items }))).into_response()
        }
        Err(e) => error_response(e.status_code(), e.error_code(), &e),
    }
}

/// GET `/accounts/{account_id}` - Fetch one account.
async fn get_account(
    State(state): State<AppState>,
    _actor: Actor,
    Path(account_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = PettyCashRepository::new((*state.db).clone());

    match repo.get(account_id).await {
        Ok(account) => (
            StatusCode::OK,
            Json(json!({ "account": AccountResponse::from(account) })),
        )
            .into_response(),
        Err(e) => error_response(e.status_code(), e.error_code(), &e),
    }
}

/// PATCH `/accounts/{account_id}` - Update account fields.
async fn update_account(
    State(state): State<AppState>,
    actor: Actor,
    Path(account_id): Path<Uuid>,
    Json(body): Json<UpdateAccountRequest>,
) -> impl IntoResponse {
    if let Err(response) = actor.require_admin() {
        return response;
    }

    let repo = PettyCashRepository::new((*state.db).clone());
    let input = UpdatePettyCashInput {
        name: body.name,
        description: body.description,
        phone_number: body.phone_number,
        account_type: body.account_type,
        minimum_threshold: body.minimum_threshold,
    };

    match repo
        .update_account(account_id, input, actor.user_id, actor.ip_address)
        .await
    {
        Ok(account) => (
            StatusCode::OK,
            Json(json!({ "account": AccountResponse::from(account) })),
        )
            .into_response(),
        Err(e) => error_response(e.status_code(), e.error_code(), &e),
    }
}

/// DELETE `/accounts/{account_id}` - Soft-delete the account.
async fn deactivate_account(
    State(state): State<AppState>,
    actor: Actor,
    Path(account_id): Path<Uuid>,
) -> impl IntoResponse {
    if let Err(response) = actor.require_admin() {
        return response;
    }

    let repo = PettyCashRepository::new((*state.db).clone());

    match repo
        .deactivate_account(account_id, actor.user_id, actor.ip_address)
        .await
    {
        Ok(account) => (
            StatusCode::OK,
            Json(json!({
                "message": format!("{} deactivated successfully", account.name)
            })),
        )
            .into_response(),
        Err(e) => error_response(e.status_code(), e.error_code(), &e),
    }
}

/// POST `/accounts/{account_id}/check-topup` - Run the threshold check.
async fn check_topup(
    State(state): State<AppState>,
    actor: Actor,
    Path(account_id): Path<Uuid>,
) -> impl IntoResponse {
    if let Err(response) = actor.require_officer() {
        return response;
    }

    let repo = PettyCashRepository::new((*state.db).clone());

    match repo.check_and_trigger_topup(account_id).await {
        Ok(Some(topup)) => (
            StatusCode::CREATED,
            Json(json!({
                "triggered": true,
                "topup_id": topup.id,
                "amount": topup.amount.to_string(),
            })),
        )
            .into_response(),
        Ok(None) => (StatusCode::OK, Json(json!({ "triggered": false }))).into_response(),
        Err(e) => error_response(e.status_code(), e.error_code(), &e),
    }
}
