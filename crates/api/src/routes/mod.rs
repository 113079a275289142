//! API route definitions.

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use crate::AppState;
use imprest_shared::AppError;

pub mod accounts;
pub mod audit;
pub mod expenses;
pub mod health;
pub mod notifications;
pub mod reconciliations;
pub mod topups;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(accounts::routes())
        .merge(expenses::routes())
        .merge(topups::routes())
        .merge(reconciliations::routes())
        .merge(notifications::routes())
        .merge(audit::routes())
}

/// Maps a repository error onto the JSON error envelope.
///
/// Server-side failures are logged and replaced with a generic message so
/// no internals leak to the caller.
pub(crate) fn error_response(
    status: u16,
    code: &'static str,
    err: &dyn std::fmt::Display,
) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let message = if status.is_server_error() {
        error!(error = %err, code, "request failed");
        "An internal error occurred".to_string()
    } else {
        err.to_string()
    };
    (status, Json(json!({ "error": code, "message": message }))).into_response()
}

/// Maps an application error onto the JSON error envelope.
pub(crate) fn app_error(err: &AppError) -> Response {
    error_response(err.status_code(), err.error_code(), err)
}
