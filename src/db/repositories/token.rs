use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tracing::error;

use crate::domain::ServiceResponse;
use crate::entities::user_tokens;

pub struct TokenRepository {
    conn: DatabaseConnection,
}

impl TokenRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(
        &self,
        user_id: &str,
        token: &str,
        expires_at: &str,
    ) -> ServiceResponse<user_tokens::Model> {
        let active = user_tokens::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            user_id: Set(user_id.to_string()),
            token: Set(token.to_string()),
            expires_at: Set(expires_at.to_string()),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
        };

        match active.insert(&self.conn).await {
            Ok(model) => ServiceResponse::created(model),
            Err(err) => {
                error!("failed to insert refresh token: {err}");
                ServiceResponse::internal("failed to persist session token")
            }
        }
    }

    pub async fn get_by_value(&self, token: &str) -> ServiceResponse<user_tokens::Model> {
        let result = user_tokens::Entity::find()
            .filter(user_tokens::Column::Token.eq(token))
            .one(&self.conn)
            .await;

        match result {
            Ok(Some(model)) => ServiceResponse::ok(model),
            Ok(None) => ServiceResponse::not_found("refresh token not found"),
            Err(err) => {
                error!("failed to query refresh token: {err}");
                ServiceResponse::internal("failed to query session token")
            }
        }
    }

    /// Delete by opaque value. Two concurrent rotations race here; the
    /// loser observes zero rows affected and gets `NotFound`.
    pub async fn delete_by_value(&self, token: &str) -> ServiceResponse<()> {
        let result = user_tokens::Entity::delete_many()
            .filter(user_tokens::Column::Token.eq(token))
            .exec(&self.conn)
            .await;

        match result {
            Ok(res) if res.rows_affected > 0 => ServiceResponse::no_content(),
            Ok(_) => ServiceResponse::not_found("refresh token not found"),
            Err(err) => {
                error!("failed to delete refresh token: {err}");
                ServiceResponse::internal("failed to delete session token")
            }
        }
    }

    pub async fn count_for_user(&self, user_id: &str) -> ServiceResponse<u64> {
        use sea_orm::PaginatorTrait;

        match user_tokens::Entity::find()
            .filter(user_tokens::Column::UserId.eq(user_id))
            .count(&self.conn)
            .await
        {
            Ok(count) => ServiceResponse::ok(count),
            Err(err) => {
                error!("failed to count tokens for user: {err}");
                ServiceResponse::internal("failed to count session tokens")
            }
        }
    }
}
