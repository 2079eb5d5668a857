//! Amazon Bedrock provider.
//!
//! Bedrock serves the Messages API through `InvokeModel`. The model id goes
//! in the URL, the body carries `anthropic_version` and the beta list, and
//! every request is signed with AWS Signature Version 4.

use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use aws_credential_types::Credentials;
use aws_sigv4::http_request::{SignableBody, SignableRequest, SigningSettings, sign};
use aws_sigv4::sign::v4;
use deskpilot_core::error::ProviderError;
use deskpilot_core::provider::{ProviderRequest, ProviderResponse};
use tracing::debug;

use crate::wire;

const BEDROCK_ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";
const SIGNING_SERVICE: &str = "bedrock";
const CONTENT_TYPE: &str = "application/json";

pub struct BedrockProvider {
    region: String,
    credentials: Credentials,
    base_url: Option<String>,
    client: reqwest::Client,
}

impl BedrockProvider {
    pub fn new(region: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            region: region.into(),
            credentials,
            base_url: None,
            client: reqwest::Client::new(),
        }
    }

    /// Override the regional runtime host (for testing).
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
            .unwrap_or_else(|| format!("https://bedrock-runtime.{}.amazonaws.com", self.region));
        format!("{host}/model/{model}/invoke")
    }

    fn body(request: &ProviderRequest) -> serde_json::Value {
        let mut body = wire::request_body(request, false);
        body["anthropic_version"] = serde_json::json!(BEDROCK_ANTHROPIC_VERSION);
        if !request.betas.is_empty() {
            body["anthropic_beta"] = serde_json::json!(request.betas);
        }
        body
    }

    /// SigV4 headers for a POST of `body` to `url`, signed at `time`.
    fn signed_headers(
        &self,
        url: &str,
        body: &[u8],
        time: SystemTime,
    ) -> Result<Vec<(String, String)>, ProviderError> {
        let identity = self.credentials.clone().into();
        let params = v4::SigningParams::builder()
            .identity(&identity)
            .region(&self.region)
            .name(SIGNING_SERVICE)
            .time(time)
            .settings(SigningSettings::default())
            .build()
            .map_err(signing_error)?
            .into();

        let signable = SignableRequest::new(
            "POST",
            url,
            [("content-type", CONTENT_TYPE), ("accept", CONTENT_TYPE)].into_iter(),
            SignableBody::Bytes(body),
        )
        .map_err(signing_error)?;

        let (instructions, _signature) = sign(signable, &params).map_err(signing_error)?.into_parts();
        Ok(instructions
            .headers()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect())
    }
}

fn signing_error(e: impl std::fmt::Display) -> ProviderError {
    ProviderError::AuthenticationFailed(format!("could not sign Bedrock request: {e}"))
}

#[async_trait]
impl deskpilot_core::Provider for BedrockProvider {
    fn name(&self) -> &str {
        "bedrock"
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let url = self.endpoint(&request.model);
        let body = serde_json::to_vec(&Self::body(&request))
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to encode request: {e}")))?;

        debug!(provider = "bedrock", model = %request.model, region = %self.region, "Sending completion request");

        let mut builder = self
            .client
            .post(&url)
            .header("content-type", CONTENT_TYPE)
            .header("accept", CONTENT_TYPE);
        for (name, value) in self.signed_headers(&url, &body, SystemTime::now())? {
            builder = builder.header(name, value);
        }

        let response = builder.body(body).send().await.map_err(wire::send_error)?;

        wire::read_response(response, "Amazon Bedrock").await
    }
}
