//! Observer hooks called by the interaction loop.
//!
//! Handlers are notified synchronously and awaited before the loop
//! proceeds. An error returned from any hook aborts the run.

use async_trait::async_trait;

use crate::error::HandlerError;
use crate::message::ContentBlock;
use crate::provider::ProviderResponse;
use crate::tool::ToolOutput;

#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Called once per completion with the full response and its transport metadata.
    async fn on_raw_response(&self, _response: &ProviderResponse) -> Result<(), HandlerError> {
        Ok(())
    }

    /// Called for every block of the assistant turn, in order.
    async fn on_model_output_block(&self, _block: &ContentBlock) -> Result<(), HandlerError> {
        Ok(())
    }

    /// Called after each tool invocation with its outcome.
    async fn on_tool_output(
        &self,
        _output: &ToolOutput,
        _tool_use_id: &str,
    ) -> Result<(), HandlerError> {
        Ok(())
    }
}

/// A handler that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHandler;

impl MessageHandler for NoopHandler {}
