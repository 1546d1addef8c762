use serde::Serialize;

use crate::domain::ServiceResponse;

use super::{InternalRequest, InternalServiceClient};

pub const SERVICE_NAME: &str = "profile";

#[derive(Debug, Serialize)]
struct CreateProfileRequest<'a> {
    id: &'a str,
    login: &'a str,
}

/// Profile collaborator. Provisioning creates a profile row keyed by the
/// same uuid as the local user record.
#[derive(Clone)]
pub struct ProfileClient {
    inner: InternalServiceClient,
}

impl ProfileClient {
    pub const fn new(inner: InternalServiceClient) -> Self {
        Self { inner }
    }

    pub async fn create_profile(&self, user_id: &str, login: &str) -> ServiceResponse<String> {
        self.inner
            .send(InternalRequest::post(
                SERVICE_NAME,
                "api/profile/create",
                CreateProfileRequest { id: user_id, login },
            ))
            .await
    }
}
