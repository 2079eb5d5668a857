//! Shared test helpers for loop and queue runner tests.

use async_trait::async_trait;
use deskpilot_core::error::{ProviderError, ToolError};
use deskpilot_core::message::ContentBlock;
use deskpilot_core::provider::{Provider, ProviderRequest, ProviderResponse, RawResponse, Usage};
use deskpilot_core::tool::{Tool, ToolCollection, ToolOutput};
use std::sync::Mutex;

/// A mock provider that returns a sequence of scripted responses.
///
/// Each call to `complete` returns the next response in the queue and
/// records the request it was given.
pub struct SequentialMockProvider {
    responses: Mutex<Vec<Result<ProviderResponse, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self::scripted(responses.into_iter().map(Ok).collect())
    }

    pub fn scripted(responses: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A provider that answers once with plain text (no tool use).
    pub fn single_text(text: &str) -> Self {
        Self::new(vec![make_text_response(text)])
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let mut responses = self.responses.lock().unwrap();
        let call = requests.len();
        requests.push(request);

        if responses.is_empty() {
            panic!("SequentialMockProvider: no more responses (call #{call})");
        }
        responses.remove(0)
    }
}

pub fn make_response(content: Vec<ContentBlock>) -> ProviderResponse {
    ProviderResponse {
        id: "msg_mock".into(),
        model: "mock-model".into(),
        content,
        stop_reason: Some("end_turn".into()),
        usage: Some(Usage {
            input_tokens: 10,
            output_tokens: 5,
        }),
        raw: RawResponse {
            status_code: 200,
            request_id: Some("req_mock".into()),
        },
    }
}

/// A response with a single text block.
pub fn make_text_response(text: &str) -> ProviderResponse {
    make_response(vec![ContentBlock::text(text)])
}

/// A response requesting the given `(id, tool name)` invocations.
pub fn make_tool_use_response(calls: &[(&str, &str)]) -> ProviderResponse {
    make_response(
        calls
            .iter()
            .map(|(id, name)| ContentBlock::tool_use(*id, *name, serde_json::json!({"text": id})))
            .collect(),
    )
}

/// Echoes its `text` argument.
pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    async fn execute(&self, input: serde_json::Value) -> Result<ToolOutput, ToolError> {
        Ok(ToolOutput::text(input["text"].as_str().unwrap_or_default()))
    }
}

/// Always fails with "permission denied".
pub struct DeniedTool;

#[async_trait]
impl Tool for DeniedTool {
    fn name(&self) -> &str {
        "denied"
    }

    async fn execute(&self, _input: serde_json::Value) -> Result<ToolOutput, ToolError> {
        Ok(ToolOutput::failure("permission denied"))
    }
}

/// Returns a fake screenshot.
pub struct ScreenshotTool;

#[async_trait]
impl Tool for ScreenshotTool {
    fn name(&self) -> &str {
        "screenshot"
    }

    async fn execute(&self, _input: serde_json::Value) -> Result<ToolOutput, ToolError> {
        Ok(ToolOutput::image("iVBORw0KGgo="))
    }
}

/// Sleeps for five seconds of (test) time.
pub struct SlowTool;

#[async_trait]
impl Tool for SlowTool {
    fn name(&self) -> &str {
        "slow"
    }

    async fn execute(&self, _input: serde_json::Value) -> Result<ToolOutput, ToolError> {
        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
        Ok(ToolOutput::text("done"))
    }
}

pub fn test_tools() -> ToolCollection {
    let mut tools = ToolCollection::new();
    tools.register(Box::new(EchoTool));
    tools.register(Box::new(DeniedTool));
    tools.register(Box::new(ScreenshotTool));
    tools.register(Box::new(SlowTool));
    tools
}
