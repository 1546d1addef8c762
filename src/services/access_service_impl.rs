//! `SeaORM` implementation of the `AccessService` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::db::Store;
use crate::domain::StatusCode;
use crate::entities::users;
use crate::services::access_service::{AccessDecision, AccessService};

pub struct SeaOrmAccessService {
    store: Store,
}

impl SeaOrmAccessService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// Clear a lapsed ban in the background. The triggering request has
    /// already been answered; this runs on its own Store handle and its
    /// failures are only ever logged.
    fn heal_lapsed_ban(&self, user_id: &str, restriction_id: Option<String>) {
        let store = self.store.clone();
        let user_id = user_id.to_string();

        tokio::spawn(async move {
            let unblocked = store.set_user_blocked(&user_id, false).await;
            if unblocked.success {
                info!(%user_id, "cleared stale blocked flag");
            } else {
                warn!(%user_id, "failed to clear blocked flag: {}", unblocked.message());
            }

            if let Some(restriction_id) = restriction_id {
                let deactivated = store.deactivate_restriction(&restriction_id).await;
                if !deactivated.success {
                    warn!(
                        %user_id,
                        %restriction_id,
                        "failed to deactivate lapsed restriction: {}",
                        deactivated.message()
                    );
                }
            }
        });
    }
}

#[async_trait]
impl AccessService for SeaOrmAccessService {
    async fn check_access(&self, user: &users::Model) -> AccessDecision {
        if user.is_blocked {
            let lookup = self.store.active_restriction_for_user(&user.id).await;

            let restriction = match lookup.data {
                Some(restriction) => restriction,
                None if lookup.status == StatusCode::NotFound => {
                    // Blocked flag with no restriction behind it. Heal the
                    // flag off the hot path and let this request through.
                    self.heal_lapsed_ban(&user.id, None);
                    return AccessDecision::Allowed;
                }
                None => {
                    error!(user_id = %user.id, "restriction lookup failed: {}", lookup.message());
                    return AccessDecision::InternalError;
                }
            };

            let Some(expires_at) = restriction.expires_at.as_deref() else {
                return AccessDecision::Locked { until: None };
            };

            let expires_at = match DateTime::parse_from_rfc3339(expires_at) {
                Ok(t) => t.with_timezone(&Utc),
                Err(err) => {
                    error!(
                        restriction_id = %restriction.id,
                        "unparseable restriction expiry: {err}"
                    );
                    return AccessDecision::InternalError;
                }
            };

            if expires_at > Utc::now() {
                return AccessDecision::Locked {
                    until: Some(expires_at),
                };
            }

            self.heal_lapsed_ban(&user.id, Some(restriction.id));
            return AccessDecision::Allowed;
        }

        if user.is_deleted {
            let lookup = self.store.get_deletion_by_user(&user.id).await;

            return match lookup.data {
                Some(tombstone) => AccessDecision::NotFound {
                    reason: tombstone.reason,
                },
                None => {
                    error!(
                        user_id = %user.id,
                        "deleted user without a readable tombstone: {}",
                        lookup.message()
                    );
                    AccessDecision::InternalError
                }
            };
        }

        AccessDecision::Allowed
    }
}
