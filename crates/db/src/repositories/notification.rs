//! Notification fan-out and inbox management.
//!
//! Notifications are created synchronously alongside the ledger entry that
//! caused them, in the same transaction. Delivery rendering (email/SMS) is
//! external; this repository only records rows with a channel tag.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use imprest_shared::types::PageRequest;

use crate::entities::{notifications, sea_orm_active_enums::NotificationChannel, transaction_logs};

/// Error types for notification operations.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    /// The notification does not exist, belongs to someone else, or is
    /// already read. All three look the same to the caller on purpose.
    #[error("Notification not found: {0}")]
    NotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl NotificationError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

/// Repository for user notifications.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    db: DatabaseConnection,
}

impl NotificationRepository {
    /// Creates a new notification repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates one notification for a ledger entry on the given connection.
    ///
    /// Takes any connection so workflow repositories can fan out inside
    /// their own transactions.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn notify<C: ConnectionTrait>(
        conn: &C,
        log: &transaction_logs::Model,
        recipient_id: Uuid,
        channel: NotificationChannel,
    ) -> Result<notifications::Model, DbErr> {
        let row = notifications::ActiveModel {
            id: Set(Uuid::new_v4()),
            transaction_log_id: Set(log.id),
            recipient_id: Set(recipient_id),
            channel: Set(channel),
            is_read: Set(false),
            read_at: Set(None),
            created_at: Set(Utc::now().into()),
        };
        row.insert(conn).await
    }

    /// Creates notifications for several recipients at once.
    ///
    /// # Errors
    ///
    /// Returns an error if any insert fails.
    pub async fn notify_many<C: ConnectionTrait>(
        conn: &C,
        log: &transaction_logs::Model,
        recipient_ids: &[Uuid],
        channel: NotificationChannel,
    ) -> Result<Vec<notifications::Model>, DbErr> {
        let mut created = Vec::with_capacity(recipient_ids.len());
        for recipient_id in recipient_ids {
            created.push(Self::notify(conn, log, *recipient_id, channel.clone()).await?);
        }
        Ok(created)
    }

    /// A page of the recipient's notifications, most recent first.
    ///
    /// Returns the page rows and the total row count for the recipient.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_for_recipient(
        &self,
        recipient_id: Uuid,
        page: &PageRequest,
    ) -> Result<(Vec<notifications::Model>, u64), NotificationError> {
        let filter = notifications::Entity::find()
            .filter(notifications::Column::RecipientId.eq(recipient_id));

        let total = filter.clone().count(&self.db).await?;
        let rows = filter
            .order_by_desc(notifications::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;
        Ok((rows, total))
    }

    /// Number of unread notifications for the recipient.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn unread_count(&self, recipient_id: Uuid) -> Result<u64, NotificationError> {
        let count = notifications::Entity::find()
            .filter(notifications::Column::RecipientId.eq(recipient_id))
            .filter(notifications::Column::IsRead.eq(false))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    /// Marks one unread notification as read, scoped to its recipient.
    ///
    /// Acting on another user's notification, or on one that is already
    /// read, is a `NotFound` — only unread rows owned by `auth_user_id`
    /// are visible to this operation.
    ///
    /// # Errors
    ///
    /// * `NotificationError::NotFound` when out of scope or already read
    /// * `NotificationError::Database` on storage failure
    pub async fn mark_read(
        &self,
        notification_id: Uuid,
        auth_user_id: Uuid,
    ) -> Result<notifications::Model, NotificationError> {
        let txn = self.db.begin().await?;

        let row = notifications::Entity::find_by_id(notification_id)
            .filter(notifications::Column::RecipientId.eq(auth_user_id))
            .filter(notifications::Column::IsRead.eq(false))
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(NotificationError::NotFound(notification_id))?;

        let mut active: notifications::ActiveModel = row.into();
        active.is_read = Set(true);
        active.read_at = Set(Some(Utc::now().into()));
        let updated = active.update(&txn).await?;

        txn.commit().await?;
        Ok(updated)
    }

    /// Marks all the recipient's unread notifications as read.
    ///
    /// Returns how many rows were affected; zero when nothing was unread.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn mark_all_read(&self, auth_user_id: Uuid) -> Result<u64, NotificationError> {
        use sea_orm::sea_query::Expr;

        let result = notifications::Entity::update_many()
            .col_expr(notifications::Column::IsRead, Expr::value(true))
            .col_expr(
                notifications::Column::ReadAt,
                Expr::value(Utc::now()),
            )
            .filter(notifications::Column::RecipientId.eq(auth_user_id))
            .filter(notifications::Column::IsRead.eq(false))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error_shape() {
        let id = Uuid::new_v4();
        let err = NotificationError::NotFound(id);
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.error_code(), "NOT_FOUND");
        assert!(err.to_string().contains(&id.to_string()));
    }
}
