//! Anthropic native provider implementation.
//!
//! Uses Anthropic's Messages API directly.
//!
//! Features:
//! - `x-api-key` header authentication (not Bearer)
//! - `anthropic-version` header
//! - `anthropic-beta` header for the computer-use tool types
//! - System prompt as top-level field
//! - Native tool use with `tool_use` / `tool_result` content blocks

use async_trait::async_trait;
use deskpilot_core::error::ProviderError;
use deskpilot_core::provider::{ProviderRequest, ProviderResponse};
use std::time::Duration;
use tracing::debug;

use crate::wire;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Anthropic native Messages API provider.
pub struct AnthropicProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            name: "anthropic".into(),
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Create with a custom base URL (e.g., for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Bound every request by a timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        if let Ok(client) = reqwest::Client::builder().timeout(timeout).build() {
            self.client = client;
        }
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }
}

#[async_trait]
impl deskpilot_core::Provider for AnthropicProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let body = wire::request_body(&request, true);

        debug!(
            provider = "anthropic",
            model = %request.model,
            turns = request.turns.len(),
            "Sending completion request"
        );

        let mut builder = self
            .client
            .post(self.endpoint())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json");
        if let Some(betas) = wire::beta_header(&request) {
            builder = builder.header("anthropic-beta", betas);
        }

        let response = builder.json(&body).send().await.map_err(wire::send_error)?;

        wire::read_response(response, "Anthropic").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskpilot_core::Provider;

    #[test]
    fn constructor() {
        let provider = AnthropicProvider::new("sk-ant-test");
        assert_eq!(provider.name(), "anthropic");
        assert_eq!(provider.base_url, DEFAULT_BASE_URL);
        assert_eq!(provider.endpoint(), "https://api.anthropic.com/v1/messages");
    }

    #[test]
    fn constructor_with_base_url() {
        let provider =
            AnthropicProvider::new("sk-ant-test").with_base_url("https://custom.proxy.com/");
        assert_eq!(provider.base_url, "https://custom.proxy.com");
        assert_eq!(provider.endpoint(), "https://custom.proxy.com/v1/messages");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_transport_error() {
        let provider = AnthropicProvider::new("sk-ant-test")
            .with_base_url("http://127.0.0.1:1")
            .with_timeout(Duration::from_secs(2));
        let request = ProviderRequest {
            model: "claude-3-5-sonnet-20241022".into(),
            system: String::new(),
            turns: vec![deskpilot_core::Turn::user_text("hi")],
            tools: vec![],
            max_tokens: 16,
            betas: vec![],
        };
        let err = provider.complete(request).await.unwrap_err();
        assert!(matches!(
            err,
            ProviderError::Network(_) | ProviderError::Timeout(_)
        ));
    }
}
