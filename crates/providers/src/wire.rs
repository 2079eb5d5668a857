//! Messages API wire format shared by the Anthropic, Bedrock and Vertex
//! endpoints.
//!
//! All of them accept the same JSON body (Bedrock and Vertex move the model
//! into the URL and add `anthropic_version`) and return the same response
//! shape.

use deskpilot_core::error::ProviderError;
use deskpilot_core::message::ContentBlock;
use deskpilot_core::provider::{ProviderRequest, ProviderResponse, RawResponse, Usage};
use serde::Deserialize;
use tracing::warn;

/// Build the JSON request body.
///
/// `model` is omitted when the endpoint takes it from the URL.
pub(crate) fn request_body(request: &ProviderRequest, include_model: bool) -> serde_json::Value {
    let mut body = serde_json::json!({
        "max_tokens": request.max_tokens,
        "messages": request.turns,
    });

    if include_model {
        body["model"] = serde_json::json!(request.model);
    }
    if !request.system.is_empty() {
        body["system"] = serde_json::json!(request.system);
    }
    if !request.tools.is_empty() {
        body["tools"] = serde_json::json!(request.tools);
    }

    body
}

/// Value of the `anthropic-beta` header, if any betas are requested.
pub(crate) fn beta_header(request: &ProviderRequest) -> Option<String> {
    if request.betas.is_empty() {
        None
    } else {
        Some(request.betas.join(","))
    }
}

/// Map a reqwest send error to a transport error.
pub(crate) fn send_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(e.to_string())
    } else {
        ProviderError::Network(e.to_string())
    }
}

/// Turn an HTTP response into a [`ProviderResponse`], mapping non-200
/// statuses onto [`ProviderError`] variants.
pub(crate) async fn read_response(
    response: reqwest::Response,
    vendor: &str,
) -> Result<ProviderResponse, ProviderError> {
    let status = response.status().as_u16();
    let request_id = response
        .headers()
        .get("request-id")
        .or_else(|| response.headers().get("x-amzn-requestid"))
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    if status == 429 {
        let retry_after_secs = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(5);
        return Err(ProviderError::RateLimited { retry_after_secs });
    }
    if status == 401 || status == 403 {
        return Err(ProviderError::AuthenticationFailed(format!(
            "{vendor} rejected the credentials (status {status})"
        )));
    }
    if status != 200 {
        let error_body = response.text().await.unwrap_or_default();
        warn!(status, body = %error_body, vendor, "Messages API error");
        return Err(ProviderError::ApiError {
            status_code: status,
            message: error_body,
        });
    }

    let body = response.text().await.map_err(send_error)?;
    parse_response(
        &body,
        RawResponse {
            status_code: status,
            request_id,
        },
    )
}

/// Parse a successful response body.
pub(crate) fn parse_response(body: &str, raw: RawResponse) -> Result<ProviderResponse, ProviderError> {
    let resp: MessagesResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse response: {e}")))?;

    Ok(ProviderResponse {
        id: resp.id,
        model: resp.model,
        content: resp.content,
        stop_reason: resp.stop_reason,
        usage: resp.usage,
        raw,
    })
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    id: String,
    model: String,
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Option<Usage>,
}
