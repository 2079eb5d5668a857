//! The interaction loop: the heart of deskpilot.
//!
//! The agent follows a **Request → Act → Report** cycle:
//!
//! 1. **Trim** old screenshots from the conversation (if configured)
//! 2. **Send** the full conversation to the model with the tool catalog
//! 3. **Run** every tool the model asked for, in order
//! 4. **Report** the results back as a user turn and loop to step 1
//!
//! The loop ends when a model turn requests no tools, or when an optional
//! iteration or wall-clock limit is hit.

pub mod handlers;
pub mod image_trim;
pub mod loop_runner;
pub mod prompt;
pub mod queue_runner;
pub mod tool_result;

#[cfg(test)]
mod test_helpers;

pub use handlers::{CompositeHandler, ConsoleHandler, TranscriptHandler};
pub use image_trim::trim_images;
pub use loop_runner::{InteractionLoop, RunSummary};
pub use prompt::build_system_prompt;
pub use queue_runner::{QueueRunReport, QueueRunner, task_instruction};
pub use tool_result::make_tool_result;
