//! Request/response boundary for an outer web layer.
//!
//! Turns pipeline results into status codes and JSON bodies. A run whose
//! compliance flag is `false` is still a 200; callers must read the flag.

use crate::context::Context;
use crate::errors::PipelineError;
use crate::factory::TeamFactory;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

/// Status for a successful run.
pub const STATUS_OK: u16 = 200;
/// Status for a rejected client identifier.
pub const STATUS_BAD_REQUEST: u16 = 400;
/// Status for a request body that does not parse.
pub const STATUS_UNPROCESSABLE: u16 = 422;
/// Status for any other failure.
pub const STATUS_INTERNAL_ERROR: u16 = 500;

/// Body of a "run client pipeline" request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRequest {
    /// Name of the client to run the pipeline for.
    pub client_name: String,
    /// Initial context, e.g. `{"region": "..."}` or a `brand_kit` mapping.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Context>,
}

impl ClientRequest {
    /// Creates a request for `client_name`.
    #[must_use]
    pub fn new(client_name: impl Into<String>) -> Self {
        Self {
            client_name: client_name.into(),
            context: None,
        }
    }

    /// Sets the initial context.
    #[must_use]
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = Some(context);
        self
    }
}

/// A status code plus JSON body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundaryResponse {
    /// HTTP-style status code.
    pub status: u16,
    /// Response body: the context record, or `{detail, kind}` on error.
    pub body: serde_json::Value,
}

impl BoundaryResponse {
    /// Returns true for a 2xx status.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    fn from_result(result: Result<Context, PipelineError>) -> Self {
        match result {
            Ok(ctx) => Self {
                status: STATUS_OK,
                body: ctx.to_json(),
            },
            Err(err) => {
                let status = match err {
                    PipelineError::InvalidClient { .. } => STATUS_BAD_REQUEST,
                    _ => STATUS_INTERNAL_ERROR,
                };
                warn!(status, kind = err.kind(), "pipeline request failed: {}", err);
                Self::error(status, &err)
            }
        }
    }

    fn error(status: u16, err: &PipelineError) -> Self {
        Self {
            status,
            body: json!({
                "detail": err.to_string(),
                "kind": err.kind(),
            }),
        }
    }
}

/// Runs the base pipeline from an empty context.
pub async fn run_base(factory: &TeamFactory) -> BoundaryResponse {
    run_base_with(factory, None).await
}

/// Runs the base pipeline from the caller's initial context.
pub async fn run_base_with(factory: &TeamFactory, initial: Option<Context>) -> BoundaryResponse {
    BoundaryResponse::from_result(factory.run_base_pipeline(initial).await)
}

/// Runs a client pipeline from the request's initial context, if any.
pub async fn run_client(factory: &TeamFactory, request: ClientRequest) -> BoundaryResponse {
    let ClientRequest {
        client_name,
        context,
    } = request;
    BoundaryResponse::from_result(factory.run_client_pipeline(&client_name, context).await)
}

/// Parses a JSON request body and runs a client pipeline.
pub async fn run_client_json(factory: &TeamFactory, body: &str) -> BoundaryResponse {
    match serde_json::from_str::<ClientRequest>(body) {
        Ok(request) => run_client(factory, request).await,
        Err(e) => BoundaryResponse::error(STATUS_UNPROCESSABLE, &PipelineError::from(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{Collaborators, MockMessagingService};
    use crate::config::AgencyConfig;
    use crate::stages::keys;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn factory() -> TeamFactory {
        TeamFactory::with_mocks(AgencyConfig::new()).unwrap()
    }

    #[tokio::test]
    async fn test_run_base_ok() {
        let response = run_base(&factory()).await;

        assert_eq!(response.status, STATUS_OK);
        assert!(response.is_success());
        assert_eq!(response.body["supervisor"], "reviewed");
        assert_eq!(response.body["compliance"], true);
    }

    #[tokio::test]
    async fn test_run_client_embeds_name() {
        let response = run_client(&factory(), ClientRequest::new("Acme Clinic")).await;

        assert_eq!(response.status, STATUS_OK);
        assert_eq!(response.body["account_manager"]["client"], "Acme Clinic");
        assert_eq!(response.body["ads_compliance"], true);
    }

    #[tokio::test]
    async fn test_false_compliance_is_still_ok() {
        let initial = Context::new().with(keys::REGION, "Canada");
        let response = run_base_with(&factory(), Some(initial)).await;

        assert_eq!(response.status, STATUS_OK);
        assert_eq!(response.body["compliance"], false);
        assert_eq!(response.body["region"], "Canada");
        assert_eq!(response.body["proposal"]["status"], "prepared");
    }

    #[tokio::test]
    async fn test_false_ads_compliance_is_still_ok() {
        let body = r#"{"client_name": "Acme Clinic", "context": {"region": "Canada"}}"#;
        let response = run_client_json(&factory(), body).await;

        assert_eq!(response.status, STATUS_OK);
        assert_eq!(response.body["ads_compliance"], false);
        assert_eq!(response.body["account_manager"]["client"], "Acme Clinic");
    }

    #[tokio::test]
    async fn test_blank_client_is_bad_request() {
        let response = run_client(&factory(), ClientRequest::new("  ")).await;

        assert_eq!(response.status, STATUS_BAD_REQUEST);
        assert_eq!(response.body["kind"], "InvalidClient");
    }

    #[tokio::test]
    async fn test_stage_failure_is_internal_error() {
        let factory = TeamFactory::new(
            AgencyConfig::new(),
            Collaborators::mock().with_messaging(Arc::new(MockMessagingService::failing("smtp down"))),
        )
        .unwrap();

        let response = run_base(&factory).await;

        assert_eq!(response.status, STATUS_INTERNAL_ERROR);
        assert_eq!(response.body["kind"], "DeliveryError");
        assert!(response.body["detail"].as_str().unwrap().contains("smtp down"));
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let response = run_client_json(&factory(), "{\"name\": 1}").await;
        assert_eq!(response.status, STATUS_UNPROCESSABLE);
        assert_eq!(response.body["kind"], "Serialization");

        let response = run_client_json(&factory(), "{\"client_name\": \"Beta Spa\"}").await;
        assert_eq!(response.status, STATUS_OK);
    }
}
