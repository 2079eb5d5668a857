//! The interaction loop implementation.

use std::sync::Arc;
use std::time::Duration;

use deskpilot_core::error::{Error, Result};
use deskpilot_core::handler::MessageHandler;
use deskpilot_core::message::{ContentBlock, Conversation, Turn};
use deskpilot_core::provider::{COMPUTER_USE_BETA, Provider, ProviderRequest};
use deskpilot_core::tool::ToolCollection;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::image_trim::{DEFAULT_CHUNK_SIZE, trim_images};
use crate::prompt::build_system_prompt;
use crate::tool_result::make_tool_result;

/// What a finished run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Model calls made
    pub iterations: u32,
    /// Tools invoked
    pub tool_calls: usize,
    /// Screenshots stripped from the history
    pub images_trimmed: usize,
}

/// Alternates model calls and tool executions until the model stops
/// asking for tools.
pub struct InteractionLoop {
    /// The remote completion endpoint
    provider: Arc<dyn Provider>,

    /// The model to request
    model: String,

    system_prompt: String,

    /// Max tokens per model response
    max_tokens: u32,

    /// Tools offered to the model
    tools: Arc<ToolCollection>,

    /// Keep only this many screenshots in the history (None = keep all)
    image_retention: Option<usize>,

    /// Screenshots are removed in multiples of this
    image_chunk_size: usize,

    /// Fail with `Error::IterationLimit` past this many model calls
    max_iterations: Option<u32>,

    /// Fail with `Error::DeadlineExceeded` once a run has taken this long
    deadline: Option<Duration>,

    betas: Vec<String>,
}

impl InteractionLoop {
    /// Create a loop with the built-in system prompt, no image trimming and no limits.
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        tools: Arc<ToolCollection>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            system_prompt: build_system_prompt("", None),
            max_tokens: 4096,
            tools,
            image_retention: None,
            image_chunk_size: DEFAULT_CHUNK_SIZE,
            max_iterations: None,
            deadline: None,
            betas: vec![COMPUTER_USE_BETA.to_string()],
        }
    }

    /// Create a loop configured from `[agent]` and the top-level prompt settings.
    pub fn from_config(
        config: &deskpilot_config::AppConfig,
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        tools: Arc<ToolCollection>,
    ) -> Self {
        let mut agent = Self::new(provider, model, tools)
            .with_system_prompt(build_system_prompt(
                &config.system_prompt_suffix,
                config.system_prompt_override.as_deref(),
            ))
            .with_max_tokens(config.max_tokens)
            .with_image_retention(config.agent.only_n_most_recent_images)
            .with_chunk_size(config.agent.image_chunk_size);
        if let Some(max) = config.agent.max_iterations {
            agent = agent.with_max_iterations(max);
        }
        if let Some(secs) = config.agent.deadline_secs {
            agent = agent.with_deadline(Duration::from_secs(secs));
        }
        agent
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = max;
        self
    }

    /// Keep only the `n` most recent screenshots. 0 disables trimming.
    pub fn with_image_retention(mut self, n: usize) -> Self {
        self.image_retention = (n > 0).then_some(n);
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.image_chunk_size = chunk_size.max(1);
        self
    }

    /// Set the maximum number of model calls per run.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = Some(max);
        self
    }

    /// Set a wall-clock budget per run, checked between iterations.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_betas(mut self, betas: Vec<String>) -> Self {
        self.betas = betas;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Run the conversation until a model turn requests no tools.
    ///
    /// The conversation is extended in place. Tool failures are reported to
    /// the model as error results; provider and handler errors end the run.
    pub async fn process_messages(
        &self,
        conversation: &mut Conversation,
        handler: &dyn MessageHandler,
    ) -> Result<RunSummary> {
        info!(
            conversation_id = %conversation.id,
            turns = conversation.turns.len(),
            model = %self.model,
            "Starting interaction loop"
        );

        let started = Instant::now();
        let tool_params = self.tools.to_params();
        let mut summary = RunSummary::default();

        loop {
            if let Some(limit) = self.max_iterations {
                if summary.iterations >= limit {
                    warn!(conversation_id = %conversation.id, limit, "Iteration limit reached");
                    return Err(Error::IterationLimit { limit });
                }
            }
            if let Some(deadline) = self.deadline {
                if summary.iterations > 0 && started.elapsed() >= deadline {
                    warn!(
                        conversation_id = %conversation.id,
                        elapsed_secs = started.elapsed().as_secs(),
                        "Deadline exceeded"
                    );
                    return Err(Error::DeadlineExceeded {
                        limit_secs: deadline.as_secs(),
                    });
                }
            }

            summary.iterations += 1;

            if let Some(keep) = self.image_retention {
                summary.images_trimmed += trim_images(conversation, keep, self.image_chunk_size);
            }

            debug!(
                conversation_id = %conversation.id,
                iteration = summary.iterations,
                images = conversation.image_count(),
                "Calling model"
            );

            let request = ProviderRequest {
                model: self.model.clone(),
                system: self.system_prompt.clone(),
                turns: conversation.turns.clone(),
                tools: tool_params.clone(),
                max_tokens: self.max_tokens,
                betas: self.betas.clone(),
            };

            let response = self.provider.complete(request).await?;
            handler.on_raw_response(&response).await?;

            conversation.push(Turn::assistant(response.content.clone()));

            let mut tool_results = Vec::new();
            for block in &response.content {
                handler.on_model_output_block(block).await?;

                if let ContentBlock::ToolUse { id, name, input } = block {
                    let output = self.tools.run(name, input.clone()).await;
                    tool_results.push(make_tool_result(&output, id));
                    handler.on_tool_output(&output, id).await?;
                    summary.tool_calls += 1;
                }
            }

            if tool_results.is_empty() {
                info!(
                    conversation_id = %conversation.id,
                    iterations = summary.iterations,
                    tool_calls = summary.tool_calls,
                    "Interaction loop finished"
                );
                return Ok(summary);
            }

            conversation.push(Turn::user(tool_results));
        }
    }
}
