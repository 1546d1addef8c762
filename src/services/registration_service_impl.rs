//! `SeaORM` implementation of the `RegistrationService` trait.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::clients::{NotificationClient, ProfileClient};
use crate::config::SecurityConfig;
use crate::db::{Store, hash_password};
use crate::domain::{Role, StatusCode};
use crate::services::registration_service::{
    RegistrationError, RegistrationOutcome, RegistrationService,
};
use crate::services::session_service::SessionService;

pub struct SeaOrmRegistrationService {
    store: Store,
    profile: ProfileClient,
    notification: NotificationClient,
    sessions: Arc<dyn SessionService>,
    argon2_memory_cost_kib: u32,
    argon2_time_cost: u32,
    argon2_parallelism: u32,
}

impl SeaOrmRegistrationService {
    #[must_use]
    pub fn new(
        store: Store,
        profile: ProfileClient,
        notification: NotificationClient,
        sessions: Arc<dyn SessionService>,
        security: &SecurityConfig,
    ) -> Self {
        Self {
            store,
            profile,
            notification,
            sessions,
            argon2_memory_cost_kib: security.argon2_memory_cost_kib,
            argon2_time_cost: security.argon2_time_cost,
            argon2_parallelism: security.argon2_parallelism,
        }
    }

    /// Undo the local insert after a failed profile propagation. The only
    /// hard-delete path for a user row.
    async fn compensate(&self, user_id: &str) {
        let deleted = self.store.delete_user(user_id).await;
        if deleted.success {
            info!(%user_id, "rolled back user after profile failure");
        } else {
            error!(
                %user_id,
                "compensation failed, orphaned user row: {}",
                deleted.message()
            );
        }
    }
}

#[async_trait]
impl RegistrationService for SeaOrmRegistrationService {
    async fn register(
        &self,
        login: &str,
        password: &str,
    ) -> Result<RegistrationOutcome, RegistrationError> {
        let existing = self.store.get_user_by_login(login).await;
        if existing.success {
            return Err(RegistrationError::rejected(
                StatusCode::Conflict,
                format!("login '{login}' is already taken"),
            ));
        }
        if existing.status != StatusCode::NotFound {
            return Err(RegistrationError::rejected(
                existing.status,
                existing.message().to_string(),
            ));
        }

        let password = password.to_string();
        let (memory, time, lanes) = (
            self.argon2_memory_cost_kib,
            self.argon2_time_cost,
            self.argon2_parallelism,
        );
        let (salt, digest) =
            tokio::task::spawn_blocking(move || hash_password(&password, memory, time, lanes))
                .await
                .map_err(|err| RegistrationError::Internal(format!("hashing task failed: {err}")))?
                .map_err(|err| RegistrationError::Internal(err.to_string()))?;

        let created = self.store.create_user(login, &digest, &salt, Role::User).await;
        let Some(user) = created.data else {
            // Two concurrent registrations can both pass the existence check;
            // the loser surfaces the store's Conflict here.
            return Err(RegistrationError::rejected(
                created.status,
                created.message().to_string(),
            ));
        };

        let profile = self.profile.create_profile(&user.id, &user.login).await;
        if !profile.success {
            warn!(
                user_id = %user.id,
                "profile propagation failed, rolling back: {}",
                profile.message()
            );
            self.compensate(&user.id).await;
            return Err(RegistrationError::rejected(
                profile.status,
                profile.message().to_string(),
            ));
        }

        let notice = self.notification.send_registration(&user.id, &user.login).await;
        let notification_sent = notice.success;
        if !notification_sent {
            warn!(
                user_id = %user.id,
                "registration notification failed: {}",
                notice.message()
            );
        }

        let session = self
            .sessions
            .create_session(&user)
            .await
            .map_err(|err| RegistrationError::Internal(err.to_string()))?;

        let message = if notification_sent {
            "Account created".to_string()
        } else {
            "Account created, but the welcome notification could not be sent".to_string()
        };

        Ok(RegistrationOutcome {
            user_id: user.id,
            session,
            notification_sent,
            message,
        })
    }
}
