//! Notification inbox routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::middleware::Actor;
use crate::routes::error_response;
use crate::AppState;
use imprest_db::entities::{notifications, sea_orm_active_enums::NotificationChannel};
use imprest_db::repositories::NotificationRepository;
use imprest_shared::types::{PageRequest, PageResponse};

/// Creates the notification routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/unread-count", get(unread_count))
        .route("/notifications/{notification_id}/read", post(mark_read))
        .route("/notifications/read-all", post(mark_all_read))
}

/// Response for a notification.
#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    /// Notification ID.
    pub id: Uuid,
    /// The ledger entry that caused it.
    pub transaction_log_id: Uuid,
    /// Delivery channel.
    pub channel: NotificationChannel,
    /// Whether the notification was read.
    pub is_read: bool,
    /// When it was read.
    pub read_at: Option<String>,
    /// Created at timestamp.
    pub created_at: String,
}

impl From<notifications::Model> for NotificationResponse {
    fn from(row: notifications::Model) -> Self {
        Self {
            id: row.id,
            transaction_log_id: row.transaction_log_id,
            channel: row.channel,
            is_read: row.is_read,
            read_at: row.read_at.map(|t| t.to_rfc3339()),
            created_at: row.created_at.to_rfc3339(),
        }
    }
}

/// GET `/notifications` - A page of the caller's inbox, most recent first.
async fn list_notifications(
    State(state): State<AppState>,
    actor: Actor,
    Query(page): Query<PageRequest>,
) -> impl IntoResponse {
    let repo = NotificationRepository::new((*state.db).clone());

    match repo.list_for_recipient(actor.user_id, &page).await {
        Ok((rows, total)) => {
            let items: Vec<NotificationResponse> =
                rows.into_iter().map(NotificationResponse::from).collect();
            let body = PageResponse::new(items, page.page, page.per_page, total);
            (StatusCode::OK, Json(json!({ "notifications": body }))).into_response()
        }
        Err(e) => error_response(e.status_code(), e.error_code(), &e),
    }
}

/// GET `/notifications/unread-count` - Badge counter.
async fn unread_count(State(state): State<AppState>, actor: Actor) -> impl IntoResponse {
    let repo = NotificationRepository::new((*state.db).clone());

    match repo.unread_count(actor.user_id).await {
        Ok(count) => (StatusCode::OK, Json(json!({ "unread_count": count }))).into_response(),
        Err(e) => error_response(e.status_code(), e.error_code(), &e),
    }
}

/// POST `/notifications/{notification_id}/read` - Mark one as read.
async fn mark_read(
    State(state): State<AppState>,
    actor: Actor,
    Path(notification_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = NotificationRepository::new((*state.db).clone());

    match repo.mark_read(notification_id, actor.user_id).await {
        Ok(row) => (
            StatusCode::OK,
            Json(json!({ "notification": NotificationResponse::from(row) })),
        )
            .into_response(),
        Err(e) => error_response(e.status_code(), e.error_code(), &e),
    }
}

/// POST `/notifications/read-all` - Mark all unread as read.
async fn mark_all_read(State(state): State<AppState>, actor: Actor) -> impl IntoResponse {
    let repo = NotificationRepository::new((*state.db).clone());

    match repo.mark_all_read(actor.user_id).await {
        Ok(count) => (StatusCode::OK, Json(json!({ "updated_count": count }))).into_response(),
        Err(e) => error_response(e.status_code(), e.error_code(), &e),
    }
}
