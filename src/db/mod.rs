use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::domain::{Role, ServiceResponse};
use crate::entities::{user_deletions, user_restrictions, user_tokens, users};

pub mod migrator;
pub mod repositories;

pub use repositories::user::{hash_password, verify_password};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn token_repo(&self) -> repositories::token::TokenRepository {
        repositories::token::TokenRepository::new(self.conn.clone())
    }

    fn restriction_repo(&self) -> repositories::restriction::RestrictionRepository {
        repositories::restriction::RestrictionRepository::new(self.conn.clone())
    }

    fn deletion_repo(&self) -> repositories::deletion::DeletionRepository {
        repositories::deletion::DeletionRepository::new(self.conn.clone())
    }

    // ========== Users ==========

    pub async fn create_user(
        &self,
        login: &str,
        password_hash: &str,
        password_salt: &str,
        role: Role,
    ) -> ServiceResponse<users::Model> {
        self.user_repo()
            .create(login, password_hash, password_salt, role)
            .await
    }

    pub async fn get_user_by_id(&self, id: &str) -> ServiceResponse<users::Model> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_login(&self, login: &str) -> ServiceResponse<users::Model> {
        self.user_repo().get_by_login(login).await
    }

    pub async fn touch_user_last_login(&self, id: &str) -> ServiceResponse<()> {
        self.user_repo().touch_last_login(id).await
    }

    pub async fn set_user_blocked(&self, id: &str, blocked: bool) -> ServiceResponse<()> {
        self.user_repo().set_blocked(id, blocked).await
    }

    pub async fn mark_user_deleted(&self, id: &str) -> ServiceResponse<()> {
        self.user_repo().mark_deleted(id).await
    }

    pub async fn delete_user(&self, id: &str) -> ServiceResponse<()> {
        self.user_repo().delete(id).await
    }

    pub async fn count_users_by_login(&self, login: &str) -> ServiceResponse<u64> {
        self.user_repo().count_by_login(login).await
    }

    // ========== Session tokens ==========

    pub async fn insert_token(
        &self,
        user_id: &str,
        token: &str,
        expires_at: &str,
    ) -> ServiceResponse<user_tokens::Model> {
        self.token_repo().insert(user_id, token, expires_at).await
    }

    pub async fn get_token_by_value(&self, token: &str) -> ServiceResponse<user_tokens::Model> {
        self.token_repo().get_by_value(token).await
    }

    pub async fn delete_token_by_value(&self, token: &str) -> ServiceResponse<()> {
        self.token_repo().delete_by_value(token).await
    }

    pub async fn count_tokens_for_user(&self, user_id: &str) -> ServiceResponse<u64> {
        self.token_repo().count_for_user(user_id).await
    }

    // ========== Restrictions ==========

    pub async fn create_restriction(
        &self,
        user_id: &str,
        reason: &str,
        issued_by: &str,
        expires_at: Option<String>,
    ) -> ServiceResponse<user_restrictions::Model> {
        self.restriction_repo()
            .create(user_id, reason, issued_by, expires_at)
            .await
    }

    pub async fn active_restriction_for_user(
        &self,
        user_id: &str,
    ) -> ServiceResponse<user_restrictions::Model> {
        self.restriction_repo().active_for_user(user_id).await
    }

    pub async fn deactivate_restriction(&self, id: &str) -> ServiceResponse<()> {
        self.restriction_repo().deactivate(id).await
    }

    // ========== Deletion tombstones ==========

    pub async fn create_deletion(
        &self,
        user_id: &str,
        login: &str,
        reason: Option<String>,
    ) -> ServiceResponse<user_deletions::Model> {
        self.deletion_repo().create(user_id, login, reason).await
    }

    pub async fn get_deletion_by_user(&self, user_id: &str) -> ServiceResponse<user_deletions::Model> {
        self.deletion_repo().get_by_user(user_id).await
    }
}
