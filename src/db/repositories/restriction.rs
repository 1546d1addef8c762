use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::error;

use crate::domain::ServiceResponse;
use crate::entities::user_restrictions;

pub struct RestrictionRepository {
    conn: DatabaseConnection,
}

impl RestrictionRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(
        &self,
        user_id: &str,
        reason: &str,
        issued_by: &str,
        expires_at: Option<String>,
    ) -> ServiceResponse<user_restrictions::Model> {
        let active = user_restrictions::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            user_id: Set(user_id.to_string()),
            reason: Set(reason.to_string()),
            issued_by: Set(issued_by.to_string()),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            expires_at: Set(expires_at),
            is_active: Set(true),
        };

        match active.insert(&self.conn).await {
            Ok(model) => ServiceResponse::created(model),
            Err(err) => {
                error!("failed to insert restriction: {err}");
                ServiceResponse::internal("failed to persist restriction")
            }
        }
    }

    /// The current ban for a user. Nothing stops several active rows from
    /// existing, so the most recently created one wins.
    pub async fn active_for_user(&self, user_id: &str) -> ServiceResponse<user_restrictions::Model> {
        let result = user_restrictions::Entity::find()
            .filter(user_restrictions::Column::UserId.eq(user_id))
            .filter(user_restrictions::Column::IsActive.eq(true))
            .order_by_desc(user_restrictions::Column::CreatedAt)
            .one(&self.conn)
            .await;

        match result {
            Ok(Some(model)) => ServiceResponse::ok(model),
            Ok(None) => ServiceResponse::not_found("no active restriction"),
            Err(err) => {
                error!("failed to query active restriction: {err}");
                ServiceResponse::internal("failed to query restriction")
            }
        }
    }

    pub async fn deactivate(&self, id: &str) -> ServiceResponse<()> {
        let model = match user_restrictions::Entity::find_by_id(id).one(&self.conn).await {
            Ok(Some(model)) => model,
            Ok(None) => return ServiceResponse::not_found(format!("restriction {id} not found")),
            Err(err) => {
                error!("failed to load restriction: {err}");
                return ServiceResponse::internal("failed to load restriction");
            }
        };

        let mut active: user_restrictions::ActiveModel = model.into();
        active.is_active = Set(false);

        match active.update(&self.conn).await {
            Ok(_) => ServiceResponse::no_content(),
            Err(err) => {
                error!("failed to deactivate restriction: {err}");
                ServiceResponse::internal("failed to update restriction")
            }
        }
    }
}
