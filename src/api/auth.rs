//! Authorization endpoints: register, login, refresh, logout.
//!
//! Credentials travel as two secure http-only cookies; response bodies
//! carry only the session metadata envelope.

use axum::{Json, extract::State, http::StatusCode as HttpStatus};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::sync::Arc;

use super::{ApiError, AppState};
use super::types::{LoginRequest, RegisterRequest, SessionDto};
use crate::db::verify_password;
use crate::domain::ServiceResponse;
use crate::services::{AccessDecision, SessionPair};

pub const ACCESS_COOKIE: &str = "access_token";
pub const REFRESH_COOKIE: &str = "refresh_token";

fn session_cookie(name: &'static str, value: String, max_age: time::Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .max_age(max_age)
        .build()
}

fn apply_session_cookies(jar: CookieJar, pair: &SessionPair, state: &AppState) -> CookieJar {
    let secure = state.config.server.secure_cookies;
    let access_ttl = time::Duration::minutes(state.config.security.access_ttl_minutes);
    let refresh_ttl = time::Duration::days(state.config.security.refresh_ttl_days);

    jar.add(session_cookie(
        ACCESS_COOKIE,
        pair.access_token.clone(),
        access_ttl,
        secure,
    ))
    .add(session_cookie(
        REFRESH_COOKIE,
        pair.refresh_token.clone(),
        refresh_ttl,
        secure,
    ))
}

fn clear_session_cookies(jar: CookieJar) -> CookieJar {
    let expired = |name: &'static str| {
        Cookie::build((name, ""))
            .path("/")
            .max_age(time::Duration::ZERO)
            .build()
    };

    jar.add(expired(ACCESS_COOKIE)).add(expired(REFRESH_COOKIE))
}

fn validate_registration(request: &RegisterRequest) -> Result<(), ApiError> {
    if request.login.trim().is_empty() || request.login.len() > 64 {
        return Err(ApiError::Validation(
            "Login must be between 1 and 64 characters".to_string(),
        ));
    }

    if request.password.len() < 8 {
        return Err(ApiError::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    if request.password != request.confirm_password {
        return Err(ApiError::Validation(
            "Passwords do not match".to_string(),
        ));
    }

    Ok(())
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<RegisterRequest>,
) -> Result<(CookieJar, (HttpStatus, Json<ServiceResponse<SessionDto>>)), ApiError> {
    validate_registration(&request)?;

    let outcome = state
        .registration
        .register(request.login.trim(), &request.password)
        .await?;

    let jar = apply_session_cookies(jar, &outcome.session, &state);
    let dto = SessionDto::from(&outcome.session);

    let body = ServiceResponse::created_with_message(dto, outcome.message);

    Ok((jar, (HttpStatus::CREATED, Json(body))))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<ServiceResponse<SessionDto>>), ApiError> {
    let lookup = state.store.get_user_by_login(request.login.trim()).await;
    let user = match lookup.data {
        Some(user) => user,
        None if lookup.status == crate::domain::StatusCode::NotFound => {
            return Err(ApiError::Unauthorized("Invalid login or password".to_string()));
        }
        None => {
            return Err(ApiError::Status {
                status: lookup.status,
                message: lookup.message().to_string(),
            });
        }
    };

    let digest = user.password_hash.clone();
    let password = request.password;
    let valid = tokio::task::spawn_blocking(move || verify_password(&password, &digest))
        .await
        .map_err(|err| ApiError::Internal(format!("verification task failed: {err}")))?
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    if !valid {
        return Err(ApiError::Unauthorized("Invalid login or password".to_string()));
    }

    match state.access.check_access(&user).await {
        AccessDecision::Allowed => {}
        decision => return Err(decision.into()),
    }

    let pair = state.sessions.create_session(&user).await?;

    let jar = apply_session_cookies(jar, &pair, &state);
    let dto = SessionDto::from(&pair);

    Ok((jar, Json(ServiceResponse::ok(dto))))
}

pub async fn refresh(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<ServiceResponse<SessionDto>>), ApiError> {
    let Some(cookie) = jar.get(REFRESH_COOKIE) else {
        return Err(ApiError::Unauthorized("Missing refresh token".to_string()));
    };

    let pair = state.sessions.refresh_session(cookie.value()).await?;

    let jar = apply_session_cookies(jar, &pair, &state);
    let dto = SessionDto::from(&pair);

    Ok((jar, Json(ServiceResponse::ok(dto))))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<ServiceResponse<()>>), ApiError> {
    if let Some(cookie) = jar.get(REFRESH_COOKIE) {
        // Idempotent; revoking an unknown value is fine.
        state.sessions.revoke_session(cookie.value()).await?;
    }

    let jar = clear_session_cookies(jar);

    Ok((jar, Json(ServiceResponse::no_content())))
}
