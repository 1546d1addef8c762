use axum::{
    Json,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use std::fmt;

use crate::domain::{ServiceResponse, StatusCode};
use crate::services::{AccessDecision, RegistrationError, SessionError};

#[derive(Debug)]
pub enum ApiError {
    Validation(String),

    Unauthorized(String),

    Locked { until: Option<DateTime<Utc>> },

    NotFound(String),

    Conflict(String),

    /// A domain status propagated verbatim from a store or collaborator
    /// envelope.
    Status { status: StatusCode, message: String },

    Internal(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(msg) => write!(f, "Validation error: {msg}"),
            Self::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
            Self::Locked { until: Some(until) } => write!(f, "Account locked until {until}"),
            Self::Locked { until: None } => write!(f, "Account locked"),
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
            Self::Conflict(msg) => write!(f, "Conflict: {msg}"),
            Self::Status { message, .. } => write!(f, "{message}"),
            Self::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Validation(msg) => (StatusCode::BadRequest, msg),
            Self::Unauthorized(msg) => (StatusCode::Unauthorized, msg),
            Self::Locked { until: Some(until) } => (
                StatusCode::Locked,
                format!("Account is locked until {}", until.to_rfc3339()),
            ),
            Self::Locked { until: None } => {
                (StatusCode::Locked, "Account is permanently locked".to_string())
            }
            Self::NotFound(msg) => (StatusCode::NotFound, msg),
            Self::Conflict(msg) => (StatusCode::Conflict, msg),
            Self::Status { status, message } => {
                if status == StatusCode::InternalError {
                    tracing::error!("Internal error: {message}");
                    (status, "An internal error occurred".to_string())
                } else {
                    (status, message)
                }
            }
            Self::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                (
                    StatusCode::InternalError,
                    "An internal error occurred".to_string(),
                )
            }
        };

        let http_status = axum::http::StatusCode::from_u16(status.as_u16())
            .unwrap_or(axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        let body = ServiceResponse::<()>::err(status, message);

        (http_status, Json(body)).into_response()
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Unauthorized(msg) => Self::Unauthorized(msg),
            SessionError::Internal(msg) => Self::Internal(msg),
        }
    }
}

impl From<RegistrationError> for ApiError {
    fn from(err: RegistrationError) -> Self {
        match err {
            RegistrationError::Rejected { status, message } => Self::Status { status, message },
            RegistrationError::Internal(msg) => Self::Internal(msg),
        }
    }
}

impl From<AccessDecision> for ApiError {
    fn from(decision: AccessDecision) -> Self {
        match decision {
            AccessDecision::Allowed => {
                debug_assert!(false, "Allowed is not an error");
                Self::Internal("unexpected access decision".to_string())
            }
            AccessDecision::Locked { until } => Self::Locked { until },
            AccessDecision::NotFound { reason } => {
                Self::NotFound(reason.unwrap_or_else(|| "Account no longer exists".to_string()))
            }
            AccessDecision::InternalError => {
                Self::Internal("access check failed".to_string())
            }
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}
