//! Domain service deciding whether an authenticated user may proceed.

use chrono::{DateTime, Utc};

use crate::entities::users;

/// Outcome of an access check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Allowed,
    /// Active ban. `until` is `None` for a permanent ban.
    Locked { until: Option<DateTime<Utc>> },
    /// Account is deleted; `reason` comes from the tombstone when present.
    NotFound { reason: Option<String> },
    InternalError,
}

#[async_trait::async_trait]
pub trait AccessService: Send + Sync {
    /// Decide whether the user may proceed. Fails closed: a blocked or
    /// deleted user is never let through on a store failure.
    async fn check_access(&self, user: &users::Model) -> AccessDecision;
}
