//! # deskpilot Core
//!
//! Domain types, traits, and error definitions for the deskpilot
//! computer-use agent. This crate has **no framework dependencies**: it
//! defines the domain model that all other crates implement against.
//!
//! Every external collaborator is a trait here:
//! - [`Provider`]: the remote completion endpoint
//! - [`Tool`]: the tool-execution backend
//! - [`MessageHandler`]: observer hooks of the interaction loop
//! - [`QueueBackend`]: the hosted task queue and mailbox

pub mod error;
pub mod handler;
pub mod message;
pub mod provider;
pub mod queue;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use handler::{MessageHandler, NoopHandler};
pub use message::{ContentBlock, Conversation, ConversationId, Role, ToolResultContent, Turn};
pub use provider::{Provider, ProviderRequest, ProviderResponse, RawResponse, Usage};
pub use queue::{MailMessage, QueueBackend, QueuedTask};
pub use tool::{Tool, ToolCollection, ToolDefinition, ToolOutput};
