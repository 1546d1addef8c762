//! Uniform response envelope for store operations, east-west calls and the
//! public API. Failure travels as data; no layer throws across a boundary.

use serde::{Deserialize, Serialize};

use super::status::StatusCode;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceResponse<T> {
    pub success: bool,
    pub status: StatusCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ServiceResponse<T> {
    pub const fn ok(data: T) -> Self {
        Self {
            success: true,
            status: StatusCode::Ok,
            message: None,
            data: Some(data),
        }
    }

    pub const fn created(data: T) -> Self {
        Self {
            success: true,
            status: StatusCode::Created,
            message: None,
            data: Some(data),
        }
    }

    /// Success without a payload (deletes, updates).
    pub const fn no_content() -> Self {
        Self {
            success: true,
            status: StatusCode::NoContent,
            message: None,
            data: None,
        }
    }

    pub fn created_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            status: StatusCode::Created,
            message: Some(message.into()),
            data: Some(data),
        }
    }

    pub fn err(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            status,
            message: Some(message.into()),
            data: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::err(StatusCode::NotFound, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::err(StatusCode::Conflict, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::err(StatusCode::Unauthorized, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::err(StatusCode::InternalError, message)
    }

    /// Transform the payload, leaving status and message untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ServiceResponse<U> {
        ServiceResponse {
            success: self.success,
            status: self.status,
            message: self.message,
            data: self.data.map(f),
        }
    }

    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_a_normal_outcome() {
        let resp: ServiceResponse<()> = ServiceResponse::not_found("no such user");
        assert!(!resp.success);
        assert_eq!(resp.status, StatusCode::NotFound);
        assert_eq!(resp.message(), "no such user");
    }

    #[test]
    fn skips_empty_fields_on_the_wire() {
        let resp = ServiceResponse::ok(1);
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "success": true, "status": 200, "data": 1 })
        );
    }
}
