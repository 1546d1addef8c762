use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tracing::error;

use crate::domain::ServiceResponse;
use crate::entities::user_deletions;

pub struct DeletionRepository {
    conn: DatabaseConnection,
}

impl DeletionRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(
        &self,
        user_id: &str,
        login: &str,
        reason: Option<String>,
    ) -> ServiceResponse<user_deletions::Model> {
        let active = user_deletions::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            user_id: Set(user_id.to_string()),
            login: Set(login.to_string()),
            reason: Set(reason),
            deleted_at: Set(chrono::Utc::now().to_rfc3339()),
        };

        match active.insert(&self.conn).await {
            Ok(model) => ServiceResponse::created(model),
            Err(err) => {
                error!("failed to insert deletion tombstone: {err}");
                ServiceResponse::internal("failed to persist deletion record")
            }
        }
    }

    pub async fn get_by_user(&self, user_id: &str) -> ServiceResponse<user_deletions::Model> {
        let result = user_deletions::Entity::find()
            .filter(user_deletions::Column::UserId.eq(user_id))
            .one(&self.conn)
            .await;

        match result {
            Ok(Some(model)) => ServiceResponse::ok(model),
            Ok(None) => ServiceResponse::not_found("no deletion record"),
            Err(err) => {
                error!("failed to query deletion tombstone: {err}");
                ServiceResponse::internal("failed to query deletion record")
            }
        }
    }
}
