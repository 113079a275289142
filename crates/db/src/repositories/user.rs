//! User lookups for actor resolution and notification fan-out.

use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QuerySelect,
};
use uuid::Uuid;

use crate::entities::{sea_orm_active_enums::UserRole, users};

/// Repository for user records.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds an active user by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_by_id(&self, user_id: Uuid) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(user_id)
            .filter(users::Column::IsActive.eq(true))
            .one(&self.db)
            .await
    }

    /// All active finance officers.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_finance_officers(&self) -> Result<Vec<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::Role.eq(UserRole::FinanceOfficer))
            .filter(users::Column::IsActive.eq(true))
            .all(&self.db)
            .await
    }

    /// Ids of all active finance officers, on any connection.
    ///
    /// Used by workflow repositories to fan out notifications inside
    /// their own transactions.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn finance_officer_ids<C: ConnectionTrait>(conn: &C) -> Result<Vec<Uuid>, DbErr> {
        let ids: Vec<Uuid> = users::Entity::find()
            .select_only()
            .column(users::Column::Id)
            .filter(users::Column::Role.eq(UserRole::FinanceOfficer))
            .filter(users::Column::IsActive.eq(true))
            .into_tuple()
            .all(conn)
            .await?;
        Ok(ids)
    }
}
