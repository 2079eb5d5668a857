//! Google Vertex AI provider.
//!
//! Vertex serves the same Messages API under a `rawPredict` route. The model
//! lives in the URL, the body carries `anthropic_version`, and auth is an
//! OAuth bearer token.

use async_trait::async_trait;
use deskpilot_core::error::ProviderError;
use deskpilot_core::provider::{ProviderRequest, ProviderResponse};
use std::time::Duration;
use tracing::debug;

use crate::wire;

const VERTEX_ANTHROPIC_VERSION: &str = "vertex-2023-10-16";

pub struct VertexProvider {
    project_id: String,
    region: String,
    access_token: String,
    base_url: Option<String>,
    client: reqwest::Client,
}

impl VertexProvider {
    pub fn new(
        project_id: impl Into<String>,
        region: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            region: region.into(),
            access_token: access_token.into(),
            base_url: None,
            client: reqwest::Client::new(),
        }
    }

    /// Override the regional host (for testing).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into().trim_end_matches('/').to_string());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        if let Ok(client) = reqwest::Client::builder().timeout(timeout).build() {
            self.client = client;
        }
        self
    }

    fn endpoint(&self, model: &str) -> String {
        let host = self
            .base_url
            .clone()
            .unwrap_or_else(|| format!("https://{}-aiplatform.googleapis.com", self.region));
        format!(
            "{host}/v1/projects/{}/locations/{}/publishers/anthropic/models/{model}:rawPredict",
            self.project_id, self.region
        )
    }
}

#[async_trait]
impl deskpilot_core::Provider for VertexProvider {
    fn name(&self) -> &str {
        "vertex"
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let mut body = wire::request_body(&request, false);
        body["anthropic_version"] = serde_json::json!(VERTEX_ANTHROPIC_VERSION);

        debug!(provider = "vertex", model = %request.model, region = %self.region, "Sending completion request");

        let mut builder = self
            .client
            .post(self.endpoint(&request.model))
            .bearer_auth(&self.access_token)
            .header("Content-Type", "application/json");
        if let Some(betas) = wire::beta_header(&request) {
            builder = builder.header("anthropic-beta", betas);
        }

        let response = builder.json(&body).send().await.map_err(wire::send_error)?;

        wire::read_response(response, "Vertex AI").await
    }
}
