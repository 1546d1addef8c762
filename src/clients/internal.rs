//! Typed bridge to sibling services. Every outcome, including transport
//! failure, comes back as an envelope; callers never see an `Err`.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{error, warn};

use crate::config::CollaboratorConfig;
use crate::domain::{ServiceResponse, StatusCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// One outbound call: which collaborator, which path, what body.
pub struct InternalRequest<B> {
    pub service: String,
    pub method: Method,
    pub path: String,
    pub body: Option<B>,
}

impl InternalRequest<()> {
    pub fn get(service: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            method: Method::Get,
            path: path.into(),
            body: None,
        }
    }
}

impl<B> InternalRequest<B> {
    pub fn post(service: impl Into<String>, path: impl Into<String>, body: B) -> Self {
        Self {
            service: service.into(),
            method: Method::Post,
            path: path.into(),
            body: Some(body),
        }
    }
}

#[derive(Clone)]
struct Collaborator {
    base_url: String,
    timeout: Duration,
}

#[derive(Clone)]
pub struct InternalServiceClient {
    client: Client,
    collaborators: HashMap<String, Collaborator>,
}

impl InternalServiceClient {
    pub fn new(collaborators: &[CollaboratorConfig]) -> Self {
        let client = Client::new();

        let collaborators = collaborators
            .iter()
            .map(|c| {
                (
                    c.name.clone(),
                    Collaborator {
                        base_url: c.base_url.trim_end_matches('/').to_string(),
                        timeout: Duration::from_secs(c.timeout_secs),
                    },
                )
            })
            .collect();

        Self {
            client,
            collaborators,
        }
    }

    /// Send a request to a named collaborator and decode its envelope.
    ///
    /// An unknown collaborator name is a local configuration bug, reported
    /// as `InternalError`. Transport failures and undecodable bodies are
    /// logged and come back as `InternalError` too; an HTTP failure with a
    /// decodable envelope is passed through with the remote's status and
    /// message.
    pub async fn send<B, R>(&self, request: InternalRequest<B>) -> ServiceResponse<R>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let Some(collaborator) = self.collaborators.get(&request.service) else {
            error!(service = %request.service, "no base url configured for collaborator");
            return ServiceResponse::internal(format!(
                "collaborator '{}' is not configured",
                request.service
            ));
        };

        let url = format!(
            "{}/{}",
            collaborator.base_url,
            request.path.trim_start_matches('/')
        );

        // Each collaborator gets its own deadline, tight or loose.
        let builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        }
        .timeout(collaborator.timeout);

        let builder = match &request.body {
            Some(body) => builder.json(body),
            None => builder,
        };

        let response = match builder.send().await {
            Ok(response) => response,
            Err(err) => {
                error!(service = %request.service, %url, "collaborator call failed: {err}");
                return ServiceResponse::internal(format!(
                    "collaborator '{}' is unavailable",
                    request.service
                ));
            }
        };

        let http_status = response.status();

        if http_status.is_success() {
            match response.json::<ServiceResponse<R>>().await {
                Ok(envelope) => envelope,
                Err(err) => {
                    error!(service = %request.service, %url, "undecodable collaborator response: {err}");
                    ServiceResponse::internal(format!(
                        "collaborator '{}' returned an undecodable response",
                        request.service
                    ))
                }
            }
        } else {
            // The remote's own envelope carries the real reason when it can
            // be decoded; otherwise fall back to the HTTP status line.
            let status =
                StatusCode::from_u16(http_status.as_u16()).unwrap_or(StatusCode::InternalError);

            match response.json::<ServiceResponse<serde_json::Value>>().await {
                Ok(envelope) => {
                    warn!(
                        service = %request.service,
                        %url,
                        status = http_status.as_u16(),
                        message = envelope.message(),
                        "collaborator reported failure"
                    );
                    ServiceResponse::err(envelope.status, envelope.message().to_string())
                }
                Err(_) => {
                    warn!(
                        service = %request.service,
                        %url,
                        status = http_status.as_u16(),
                        "collaborator reported failure without an envelope"
                    );
                    ServiceResponse::err(
                        status,
                        format!("collaborator '{}' returned {http_status}", request.service),
                    )
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CollaboratorConfig;
    use wiremock::matchers::{method as http_method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn collaborator(name: &str, base_url: String, timeout_secs: u64) -> CollaboratorConfig {
        CollaboratorConfig {
            name: name.to_string(),
            base_url,
            timeout_secs,
        }
    }

    #[tokio::test]
    async fn timeouts_are_applied_per_collaborator() {
        let server = MockServer::start().await;
        Mock::given(http_method("GET"))
            .and(path("/api/ping"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_secs(2))
                    .set_body_json(serde_json::json!({
                        "success": true,
                        "status": 200,
                        "data": "pong"
                    })),
            )
            .mount(&server)
            .await;

        // Same endpoint, two deadlines: the tight one must not inherit the
        // loose one.
        let client = InternalServiceClient::new(&[
            collaborator("tight", server.uri(), 1),
            collaborator("loose", server.uri(), 4),
        ]);

        let tight: ServiceResponse<String> =
            client.send(InternalRequest::get("tight", "api/ping")).await;
        assert!(!tight.success);
        assert_eq!(tight.status, StatusCode::InternalError);

        let loose: ServiceResponse<String> =
            client.send(InternalRequest::get("loose", "api/ping")).await;
        assert!(loose.success);
        assert_eq!(loose.data.as_deref(), Some("pong"));
    }

    #[tokio::test]
    async fn unknown_collaborator_is_a_local_error() {
        let client = InternalServiceClient::new(&[]);

        let response: ServiceResponse<String> =
            client.send(InternalRequest::get("ghost", "api/ping")).await;
        assert!(!response.success);
        assert_eq!(response.status, StatusCode::InternalError);
    }
}
