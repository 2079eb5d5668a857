//! Provider trait: the abstraction over the remote completion endpoint.
//!
//! A Provider knows how to send a conversation to the model and get the
//! next assistant turn back, together with the raw transport metadata.
//!
//! Implementations: Anthropic Messages API, Vertex AI.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::message::{ContentBlock, Turn};
use crate::tool::ToolDefinition;

/// Beta flag that enables the computer-use tool types.
pub const COMPUTER_USE_BETA: &str = "computer-use-2024-10-22";

/// One completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model to use (e.g., "claude-3-5-sonnet-20241022")
    pub model: String,

    /// Top-level system prompt
    pub system: String,

    /// The full conversation
    pub turns: Vec<Turn>,

    /// Tool catalog
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Vendor beta flags
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub betas: Vec<String>,
}

/// Transport metadata of a completion response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawResponse {
    /// HTTP status code
    pub status_code: u16,

    /// Vendor request id header, when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// A complete response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// Vendor message id
    pub id: String,

    /// Which model actually responded
    pub model: String,

    /// Content blocks of the new assistant turn
    pub content: Vec<ContentBlock>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,

    /// Token usage statistics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,

    pub raw: RawResponse,
}

/// Token usage information.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl Usage {
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

/// The core Provider trait.
///
/// The interaction loop calls `complete()` without knowing which vendor
/// endpoint is behind it.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "anthropic", "vertex").
    fn name(&self) -> &str;

    /// Send a request and get the next assistant turn.
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_total() {
        let usage = Usage {
            input_tokens: 1200,
            output_tokens: 80,
        };
        assert_eq!(usage.total(), 1280);
    }

    #[test]
    fn response_roundtrips_through_json() {
        let response = ProviderResponse {
            id: "msg_01".into(),
            model: "claude-3-5-sonnet-20241022".into(),
            content: vec![ContentBlock::text("Done.")],
            stop_reason: Some("end_turn".into()),
            usage: None,
            raw: RawResponse {
                status_code: 200,
                request_id: Some("req_1".into()),
            },
        };
        let json = serde_json::to_string(&response).unwrap();
        let parsed: ProviderResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.raw.status_code, 200);
        assert_eq!(parsed.content, response.content);
    }
}
