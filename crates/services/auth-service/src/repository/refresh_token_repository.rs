//! Refresh token persistence.
//!
//! [`RefreshTokenStore::revoke`] is the only mutation a stored token ever
//! sees, and it is a single conditional write: it flips `revoked` and sets
//! the successor link only when the row is still active. Two requests racing
//! on the same token therefore see exactly one `1` between them.

use async_trait::async_trait;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};
use uuid::Uuid;

use super::entities::refresh_token::{self, ActiveModel, Entity as RefreshTokenEntity};
use common::{AppError, AppResult};
use domain::RefreshToken;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Durable refresh token records.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Persist a new record
    async fn save(&self, record: RefreshToken) -> AppResult<RefreshToken>;

    /// Find a record by value, ignoring revoked ones
    async fn find_active_by_value(&self, token: &str) -> AppResult<Option<RefreshToken>>;

    /// Revoke `token` if it is still active, linking its successor.
    ///
    /// Returns the number of rows changed: 1 if this call revoked it,
    /// 0 if it was already revoked or does not exist.
    async fn revoke(&self, token: &str, replacement: Option<String>) -> AppResult<u64>;

    /// Remove every record owned by a user
    async fn delete_all_for_user(&self, user_id: Uuid) -> AppResult<u64>;

    /// All records owned by a user, oldest first
    async fn find_all_for_user(&self, user_id: Uuid) -> AppResult<Vec<RefreshToken>>;
}

/// SeaORM-backed refresh token store.
pub struct RefreshTokenTable {
    db: DatabaseConnection,
}

impl RefreshTokenTable {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RefreshTokenStore for RefreshTokenTable {
    async fn save(&self, record: RefreshToken) -> AppResult<RefreshToken> {
        let model = ActiveModel::from(record)
            .insert(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(RefreshToken::from(model))
    }

    async fn find_active_by_value(&self, token: &str) -> AppResult<Option<RefreshToken>> {
        let result = RefreshTokenEntity::find()
            .filter(refresh_token::Column::Token.eq(token))
            .filter(refresh_token::Column::Revoked.eq(false))
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(RefreshToken::from))
    }

    async fn revoke(&self, token: &str, replacement: Option<String>) -> AppResult<u64> {
        // UPDATE refresh_tokens SET revoked = true, replaced_by_token = $2
        // WHERE token = $1 AND revoked = false
        let result = RefreshTokenEntity::update_many()
            .col_expr(refresh_token::Column::Revoked, Expr::value(true))
            .col_expr(refresh_token::Column::ReplacedByToken, Expr::value(replacement))
            .filter(refresh_token::Column::Token.eq(token))
            .filter(refresh_token::Column::Revoked.eq(false))
            .exec(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.rows_affected)
    }

    async fn delete_all_for_user(&self, user_id: Uuid) -> AppResult<u64> {
        let result = RefreshTokenEntity::delete_many()
            .filter(refresh_token::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.rows_affected)
    }

    async fn find_all_for_user(&self, user_id: Uuid) -> AppResult<Vec<RefreshToken>> {
        let models = RefreshTokenEntity::find()
            .filter(refresh_token::Column::UserId.eq(user_id))
            .order_by_asc(refresh_token::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(models.into_iter().map(RefreshToken::from).collect())
    }
}
