use serde::Serialize;

use crate::domain::ServiceResponse;

use super::{InternalRequest, InternalServiceClient};

pub const SERVICE_NAME: &str = "notification";

#[derive(Debug, Serialize)]
struct RegistrationNotice<'a> {
    user_id: &'a str,
    login: &'a str,
    kind: &'a str,
}

/// Notification collaborator. Delivery is best effort; registration never
/// fails because a notice did not go out.
#[derive(Clone)]
pub struct NotificationClient {
    inner: InternalServiceClient,
}

impl NotificationClient {
    pub const fn new(inner: InternalServiceClient) -> Self {
        Self { inner }
    }

    pub async fn send_registration(&self, user_id: &str, login: &str) -> ServiceResponse<()> {
        // No response contract: whatever payload the collaborator returns
        // is accepted and discarded, only the envelope status matters.
        let response: ServiceResponse<serde_json::Value> = self
            .inner
            .send(InternalRequest::post(
                SERVICE_NAME,
                "api/notification/send",
                RegistrationNotice {
                    user_id,
                    login,
                    kind: "registration",
                },
            ))
            .await;

        response.map(|_| ())
    }
}
