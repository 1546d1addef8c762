//! `SeaORM` implementation of the `SessionService` trait.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{EncodingKey, Header};
use rand::RngCore;
use tracing::{error, warn};

use crate::config::SecurityConfig;
use crate::db::Store;
use crate::domain::StatusCode;
use crate::entities::users;
use crate::services::session_service::{Claims, SessionError, SessionPair, SessionService};

const REFRESH_TOKEN_BYTES: usize = 64;

pub struct SeaOrmSessionService {
    store: Store,
    encoding_key: EncodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl SeaOrmSessionService {
    #[must_use]
    pub fn new(store: Store, security: &SecurityConfig) -> Self {
        Self {
            store,
            encoding_key: EncodingKey::from_secret(security.jwt_secret.as_bytes()),
            access_ttl: Duration::minutes(security.access_ttl_minutes),
            refresh_ttl: Duration::days(security.refresh_ttl_days),
        }
    }

    fn sign_access_token(&self, user: &users::Model, expires_at: DateTime<Utc>) -> Result<String, SessionError> {
        let claims = Claims {
            sub: user.id.clone(),
            login: user.login.clone(),
            role: user.role.clone(),
            email_confirmed: user.is_email_confirmed,
            jti: uuid::Uuid::new_v4().to_string(),
            iat: Utc::now().timestamp(),
            exp: expires_at.timestamp(),
        };

        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key).map_err(|err| {
            error!("failed to sign access token: {err}");
            SessionError::Internal("failed to sign access token".to_string())
        })
    }

    fn generate_refresh_value() -> String {
        let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }
}

#[async_trait]
impl SessionService for SeaOrmSessionService {
    async fn create_session(&self, user: &users::Model) -> Result<SessionPair, SessionError> {
        let now = Utc::now();
        let access_expires_at = now + self.access_ttl;
        let refresh_expires_at = now + self.refresh_ttl;

        let access_token = self.sign_access_token(user, access_expires_at)?;
        let refresh_token = Self::generate_refresh_value();

        let persisted = self
            .store
            .insert_token(&user.id, &refresh_token, &refresh_expires_at.to_rfc3339())
            .await;

        if !persisted.success {
            return Err(SessionError::Internal(format!(
                "failed to persist session: {}",
                persisted.message()
            )));
        }

        let touched = self.store.touch_user_last_login(&user.id).await;
        if !touched.success {
            warn!(user_id = %user.id, "failed to stamp last login: {}", touched.message());
        }

        Ok(SessionPair {
            user_id: user.id.clone(),
            login: user.login.clone(),
            role: user.role.clone(),
            access_token,
            access_expires_at: access_expires_at.to_rfc3339(),
            refresh_token,
            refresh_expires_at: refresh_expires_at.to_rfc3339(),
        })
    }

    async fn refresh_session(&self, refresh_value: &str) -> Result<SessionPair, SessionError> {
        let lookup = self.store.get_token_by_value(refresh_value).await;

        let row = match lookup.data {
            Some(row) => row,
            None if lookup.status == StatusCode::NotFound => {
                return Err(SessionError::Unauthorized(
                    "unknown refresh token".to_string(),
                ));
            }
            None => {
                return Err(SessionError::Internal(lookup.message().to_string()));
            }
        };

        let expires_at = DateTime::parse_from_rfc3339(&row.expires_at)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|err| {
                error!(token_id = %row.id, "unparseable token expiry: {err}");
                SessionError::Internal("corrupt session record".to_string())
            })?;

        if Utc::now() >= expires_at {
            // Purge even though we reject, so an expired value can never be
            // presented twice.
            let purged = self.store.delete_token_by_value(refresh_value).await;
            if !purged.success && purged.status != StatusCode::NotFound {
                warn!(token_id = %row.id, "failed to purge expired token: {}", purged.message());
            }
            return Err(SessionError::Unauthorized("session expired".to_string()));
        }

        // Single-use rotation. Two concurrent refreshes race on this delete;
        // the loser sees NotFound and is rejected.
        let consumed = self.store.delete_token_by_value(refresh_value).await;
        if !consumed.success {
            return if consumed.status == StatusCode::NotFound {
                Err(SessionError::Unauthorized(
                    "refresh token already used".to_string(),
                ))
            } else {
                Err(SessionError::Internal(consumed.message().to_string()))
            };
        }

        let user_lookup = self.store.get_user_by_id(&row.user_id).await;
        let Some(user) = user_lookup.data else {
            return if user_lookup.status == StatusCode::NotFound {
                Err(SessionError::Unauthorized(
                    "session owner no longer exists".to_string(),
                ))
            } else {
                Err(SessionError::Internal(user_lookup.message().to_string()))
            };
        };

        self.create_session(&user).await
    }

    async fn revoke_session(&self, refresh_value: &str) -> Result<(), SessionError> {
        let deleted = self.store.delete_token_by_value(refresh_value).await;
        if !deleted.success && deleted.status != StatusCode::NotFound {
            warn!("failed to revoke session: {}", deleted.message());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_values_are_long_and_unique() {
        let a = SeaOrmSessionService::generate_refresh_value();
        let b = SeaOrmSessionService::generate_refresh_value();
        assert_ne!(a, b);
        // 64 bytes, base64 without padding.
        assert!(a.len() >= 85);
    }
}
