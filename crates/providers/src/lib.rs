//! Remote completion endpoints for deskpilot.
//!
//! All providers implement the `deskpilot_core::Provider` trait.
//! [`build_from_config`] selects the correct one based on configuration.

pub mod anthropic;
pub mod bedrock;
pub mod router;
pub mod vertex;
mod wire;

pub use anthropic::AnthropicProvider;
pub use bedrock::BedrockProvider;
pub use router::{ApiProvider, SelectedProvider, build_from_config};
pub use vertex::VertexProvider;
