//! Domain service orchestrating account provisioning.
//!
//! Registration is a saga: persist locally, propagate to the profile
//! collaborator, notify best-effort, issue a session. The only rollback in
//! the system is the hard delete of the local row when profile propagation
//! fails.

use thiserror::Error;

use crate::domain::StatusCode;
use crate::services::session_service::SessionPair;

#[derive(Debug, Error)]
pub enum RegistrationError {
    /// The request was rejected with a specific domain status, either
    /// locally (duplicate login, validation) or by a collaborator.
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RegistrationError {
    pub fn rejected(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Rejected { status, .. } => *status,
            Self::Internal(_) => StatusCode::InternalError,
        }
    }
}

/// A completed registration. `message` reflects whether the welcome
/// notification went out.
#[derive(Debug)]
pub struct RegistrationOutcome {
    pub user_id: String,
    pub session: SessionPair,
    pub notification_sent: bool,
    pub message: String,
}

#[async_trait::async_trait]
pub trait RegistrationService: Send + Sync {
    async fn register(
        &self,
        login: &str,
        password: &str,
    ) -> Result<RegistrationOutcome, RegistrationError>;
}
