//! Domain service for issuing, rotating and revoking sessions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entities::users;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// JWT payload of the access credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub login: String,
    pub role: String,
    pub email_confirmed: bool,
    /// Unique token id.
    pub jti: String,
    /// Issued-at, unix seconds.
    pub iat: i64,
    /// Expiry, unix seconds.
    pub exp: i64,
}

/// One issued session: a signed access token and an opaque refresh value,
/// each with its own expiry.
#[derive(Debug, Clone, Serialize)]
pub struct SessionPair {
    pub user_id: String,
    pub login: String,
    pub role: String,
    pub access_token: String,
    pub access_expires_at: String,
    pub refresh_token: String,
    pub refresh_expires_at: String,
}

#[async_trait::async_trait]
pub trait SessionService: Send + Sync {
    /// Issue a fresh access/refresh pair for a user and persist the refresh
    /// row. Also stamps the user's last-login time, best effort.
    async fn create_session(&self, user: &users::Model) -> Result<SessionPair, SessionError>;

    /// Rotate a refresh token: the presented value is consumed (single use)
    /// and a new pair is issued. An expired value is purged on sight and
    /// rejected.
    async fn refresh_session(&self, refresh_value: &str) -> Result<SessionPair, SessionError>;

    /// Drop the refresh row for a presented value. Idempotent; revoking an
    /// unknown or already-revoked value is not an error.
    async fn revoke_session(&self, refresh_value: &str) -> Result<(), SessionError>;
}
