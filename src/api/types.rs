use serde::{Deserialize, Serialize};

use crate::services::SessionPair;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub login: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

/// Session payload returned in the envelope body. The credentials
/// themselves travel only in the cookies.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDto {
    pub user_id: String,
    pub login: String,
    pub role: String,
    pub access_expires_at: String,
    pub refresh_expires_at: String,
}

impl From<&SessionPair> for SessionDto {
    fn from(pair: &SessionPair) -> Self {
        Self {
            user_id: pair.user_id.clone(),
            login: pair.login.clone(),
            role: pair.role.clone(),
            access_expires_at: pair.access_expires_at.clone(),
            refresh_expires_at: pair.refresh_expires_at.clone(),
        }
    }
}
