//! Provider selection: maps the configured API provider onto a concrete
//! [`Provider`] and the model id it should be asked for.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use deskpilot_core::error::{Error, Result};
use deskpilot_core::provider::Provider;

use crate::anthropic::AnthropicProvider;
use crate::bedrock::BedrockProvider;
use crate::vertex::VertexProvider;

/// The vendor endpoints a model can be served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiProvider {
    Anthropic,
    Bedrock,
    Vertex,
}

impl ApiProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::Bedrock => "bedrock",
            Self::Vertex => "vertex",
        }
    }

    /// Model id used when none is configured.
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Anthropic => "claude-3-5-sonnet-20241022",
            Self::Bedrock => "anthropic.claude-3-5-sonnet-20241022-v2:0",
            Self::Vertex => "claude-3-5-sonnet-v2@20241022",
        }
    }
}

impl fmt::Display for ApiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anthropic" => Ok(Self::Anthropic),
            "bedrock" => Ok(Self::Bedrock),
            "vertex" => Ok(Self::Vertex),
            other => Err(Error::config(format!("unknown API provider '{other}'"))),
        }
    }
}

/// A ready-to-use provider plus the model to request.
#[derive(Clone)]
pub struct SelectedProvider {
    pub kind: ApiProvider,
    pub provider: Arc<dyn Provider>,
    pub model: String,
}

/// Build the configured provider.
///
/// Fails with a configuration error when the provider is unknown or its
/// credentials are missing.
pub fn build_from_config(config: &deskpilot_config::AppConfig) -> Result<SelectedProvider> {
    let kind: ApiProvider = config.provider.parse()?;
    let model = config
        .model
        .clone()
        .unwrap_or_else(|| kind.default_model().to_string());
    let timeout = config.request_timeout_secs.map(Duration::from_secs);

    let provider: Arc<dyn Provider> = match kind {
        ApiProvider::Anthropic => {
            let api_key = config.api_key.clone().ok_or_else(|| {
                Error::config("no API key: set ANTHROPIC_API_KEY or api_key in config.toml")
            })?;
            let mut provider = AnthropicProvider::new(api_key);
            if let Some(timeout) = timeout {
                provider = provider.with_timeout(timeout);
            }
            Arc::new(provider)
        }
        ApiProvider::Vertex => {
            let project = config.vertex.project_id.clone().ok_or_else(|| {
                Error::config("vertex provider needs vertex.project_id or VERTEX_PROJECT_ID")
            })?;
            let token = config.vertex.access_token.clone().ok_or_else(|| {
                Error::config("vertex provider needs vertex.access_token or VERTEX_ACCESS_TOKEN")
            })?;
            let mut provider = VertexProvider::new(project, &config.vertex.region, token);
            if let Some(timeout) = timeout {
                provider = provider.with_timeout(timeout);
            }
            Arc::new(provider)
        }
        ApiProvider::Bedrock => {
            let bedrock = &config.bedrock;
            let (Some(key_id), Some(secret)) = (&bedrock.access_key_id, &bedrock.secret_access_key)
            else {
                return Err(Error::config(
                    "bedrock provider needs AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY (or the [bedrock] section)",
                ));
            };
            let credentials = aws_credential_types::Credentials::new(
                key_id,
                secret,
                bedrock.session_token.clone(),
                None,
                "deskpilot-config",
            );
            let mut provider = BedrockProvider::new(&bedrock.region, credentials);
            if let Some(timeout) = timeout {
                provider = provider.with_timeout(timeout);
            }
            Arc::new(provider)
        }
    };

    tracing::info!(provider = %kind, model = %model, "Provider selected");

    Ok(SelectedProvider {
        kind,
        provider,
        model,
    })
}
