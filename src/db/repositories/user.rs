use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tracing::error;

use crate::domain::{Role, ServiceResponse};
use crate::entities::users;

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Persist a new identity row. A uniqueness violation on the login
    /// column maps to `Conflict`, everything else to `InternalError`.
    pub async fn create(
        &self,
        login: &str,
        password_hash: &str,
        password_salt: &str,
        role: Role,
    ) -> ServiceResponse<users::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = users::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            login: Set(login.to_string()),
            password_hash: Set(password_hash.to_string()),
            password_salt: Set(password_salt.to_string()),
            role: Set(role.to_string()),
            created_at: Set(now),
            last_login_at: Set(None),
            is_email_confirmed: Set(false),
            is_blocked: Set(false),
            is_deleted: Set(false),
        };

        match active.insert(&self.conn).await {
            Ok(model) => ServiceResponse::created(model),
            Err(err) => {
                if matches!(
                    err.sql_err(),
                    Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
                ) {
                    ServiceResponse::conflict(format!("login '{login}' is already taken"))
                } else {
                    error!("failed to insert user: {err}");
                    ServiceResponse::internal("failed to persist user")
                }
            }
        }
    }

    pub async fn get_by_id(&self, id: &str) -> ServiceResponse<users::Model> {
        match users::Entity::find_by_id(id).one(&self.conn).await {
            Ok(Some(model)) => ServiceResponse::ok(model),
            Ok(None) => ServiceResponse::not_found(format!("user {id} not found")),
            Err(err) => {
                error!("failed to query user by id: {err}");
                ServiceResponse::internal("failed to query user")
            }
        }
    }

    pub async fn get_by_login(&self, login: &str) -> ServiceResponse<users::Model> {
        let result = users::Entity::find()
            .filter(users::Column::Login.eq(login))
            .one(&self.conn)
            .await;

        match result {
            Ok(Some(model)) => ServiceResponse::ok(model),
            Ok(None) => ServiceResponse::not_found(format!("login '{login}' not found")),
            Err(err) => {
                error!("failed to query user by login: {err}");
                ServiceResponse::internal("failed to query user")
            }
        }
    }

    pub async fn touch_last_login(&self, id: &str) -> ServiceResponse<()> {
        let model = match users::Entity::find_by_id(id).one(&self.conn).await {
            Ok(Some(model)) => model,
            Ok(None) => return ServiceResponse::not_found(format!("user {id} not found")),
            Err(err) => {
                error!("failed to load user for last-login update: {err}");
                return ServiceResponse::internal("failed to load user");
            }
        };

        let mut active: users::ActiveModel = model.into();
        active.last_login_at = Set(Some(chrono::Utc::now().to_rfc3339()));

        match active.update(&self.conn).await {
            Ok(_) => ServiceResponse::no_content(),
            Err(err) => {
                error!("failed to update last-login: {err}");
                ServiceResponse::internal("failed to update user")
            }
        }
    }

    pub async fn set_blocked(&self, id: &str, blocked: bool) -> ServiceResponse<()> {
        let model = match users::Entity::find_by_id(id).one(&self.conn).await {
            Ok(Some(model)) => model,
            Ok(None) => return ServiceResponse::not_found(format!("user {id} not found")),
            Err(err) => {
                error!("failed to load user for block update: {err}");
                return ServiceResponse::internal("failed to load user");
            }
        };

        let mut active: users::ActiveModel = model.into();
        active.is_blocked = Set(blocked);

        match active.update(&self.conn).await {
            Ok(_) => ServiceResponse::no_content(),
            Err(err) => {
                error!("failed to update blocked flag: {err}");
                ServiceResponse::internal("failed to update user")
            }
        }
    }

    pub async fn mark_deleted(&self, id: &str) -> ServiceResponse<()> {
        let model = match users::Entity::find_by_id(id).one(&self.conn).await {
            Ok(Some(model)) => model,
            Ok(None) => return ServiceResponse::not_found(format!("user {id} not found")),
            Err(err) => {
                error!("failed to load user for deletion flag: {err}");
                return ServiceResponse::internal("failed to load user");
            }
        };

        let mut active: users::ActiveModel = model.into();
        active.is_deleted = Set(true);

        match active.update(&self.conn).await {
            Ok(_) => ServiceResponse::no_content(),
            Err(err) => {
                error!("failed to mark user deleted: {err}");
                ServiceResponse::internal("failed to update user")
            }
        }
    }

    /// Hard delete. Only the registration saga's compensation path uses
    /// this; everywhere else deletion is the soft flag plus a tombstone.
    pub async fn delete(&self, id: &str) -> ServiceResponse<()> {
        match users::Entity::delete_by_id(id).exec(&self.conn).await {
            Ok(res) if res.rows_affected > 0 => ServiceResponse::no_content(),
            Ok(_) => ServiceResponse::not_found(format!("user {id} not found")),
            Err(err) => {
                error!("failed to delete user: {err}");
                ServiceResponse::internal("failed to delete user")
            }
        }
    }

    pub async fn count_by_login(&self, login: &str) -> ServiceResponse<u64> {
        use sea_orm::PaginatorTrait;

        match users::Entity::find()
            .filter(users::Column::Login.eq(login))
            .count(&self.conn)
            .await
        {
            Ok(count) => ServiceResponse::ok(count),
            Err(err) => {
                error!("failed to count users by login: {err}");
                ServiceResponse::internal("failed to count users")
            }
        }
    }
}

/// Hash a password with a fresh random salt. Returns `(salt, digest)`.
/// CPU-intensive; callers on the async runtime must wrap this in
/// `spawn_blocking`.
pub fn hash_password(
    password: &str,
    memory_cost_kib: u32,
    time_cost: u32,
    parallelism: u32,
) -> anyhow::Result<(String, String)> {
    let salt = SaltString::generate(&mut OsRng);

    let params = Params::new(memory_cost_kib, time_cost, parallelism, None)
        .map_err(|e| anyhow::anyhow!("invalid argon2 parameters: {e}"))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let digest = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?;

    Ok((salt.to_string(), digest.to_string()))
}

/// Verify a password against a stored PHC digest.
pub fn verify_password(password: &str, digest: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(digest)
        .map_err(|e| anyhow::anyhow!("invalid password hash format: {e}"))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimal argon2 cost, these tests only care about correctness.
    fn hash(password: &str) -> (String, String) {
        hash_password(password, 1024, 1, 1).unwrap()
    }

    #[test]
    fn hash_then_verify() {
        let (salt, digest) = hash("secret1");
        assert!(!salt.is_empty());
        assert!(verify_password("secret1", &digest).unwrap());
        assert!(!verify_password("wrong", &digest).unwrap());
    }

    #[test]
    fn fresh_salt_per_hash() {
        let (salt_a, _) = hash("secret1");
        let (salt_b, _) = hash("secret1");
        assert_ne!(salt_a, salt_b);
    }
}
