//! Tool trait: the abstraction over the tool-execution backend.
//!
//! Tools are what let the model act on the desktop: take screenshots,
//! move the mouse, run shell commands, edit files.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ToolError;

/// The outcome of one tool invocation.
///
/// A tool either produced `output` (and possibly an image) or it failed
/// with `error`. `system` carries out-of-band notes for the model such as
/// "tool has been restarted".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Base64-encoded PNG
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base64_image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
}

impl ToolOutput {
    /// A successful text result.
    pub fn text(output: impl Into<String>) -> Self {
        Self {
            output: Some(output.into()),
            ..Default::default()
        }
    }

    /// A failed result carrying only an error message.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// A successful result carrying only a screenshot.
    pub fn image(base64_png: impl Into<String>) -> Self {
        Self {
            base64_image: Some(base64_png.into()),
            ..Default::default()
        }
    }

    pub fn with_image(mut self, base64_png: impl Into<String>) -> Self {
        self.base64_image = Some(base64_png.into());
        self
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// A tool entry in the catalog sent to the model.
///
/// Computer-use tools are "native": the vendor knows their schema and only
/// needs the versioned type plus a few options. Everything else is a custom
/// tool described by a JSON schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolDefinition {
    Native {
        #[serde(rename = "type")]
        api_type: String,
        name: String,
        #[serde(flatten)]
        options: serde_json::Map<String, serde_json::Value>,
    },
    Custom {
        name: String,
        description: String,
        input_schema: serde_json::Value,
    },
}

impl ToolDefinition {
    pub fn name(&self) -> &str {
        match self {
            Self::Native { name, .. } | Self::Custom { name, .. } => name,
        }
    }
}

/// The core Tool trait.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name the model calls this tool by (e.g., "computer", "bash").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the model for custom tools).
    fn description(&self) -> &str {
        ""
    }

    /// JSON Schema describing this tool's input.
    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({ "type": "object", "properties": {} })
    }

    /// Execute the tool with the given structured input.
    async fn execute(&self, input: serde_json::Value) -> Result<ToolOutput, ToolError>;

    /// Convert this tool into its catalog entry.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition::Custom {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.parameters_schema(),
        }
    }
}

/// An ordered collection of tools.
///
/// The interaction loop uses this to:
/// 1. Get the tool catalog to send to the model
/// 2. Run tools by name when the model requests them
pub struct ToolCollection {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolCollection {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        if let Some(existing) = self.tools.iter_mut().find(|t| t.name() == tool.name()) {
            *existing = tool;
        } else {
            self.tools.push(tool);
        }
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.iter().find(|t| t.name() == name).map(|t| t.as_ref())
    }

    /// The tool catalog, in registration order.
    pub fn to_params(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.to_definition()).collect()
    }

    /// Run a tool by name.
    ///
    /// Never fails: an unknown name or a tool error becomes a failed
    /// [`ToolOutput`] so the model can see it and adapt.
    pub async fn run(&self, name: &str, input: serde_json::Value) -> ToolOutput {
        let Some(tool) = self.get(name) else {
            warn!(tool = %name, "Model requested an unknown tool");
            return ToolOutput::failure(ToolError::NotFound(name.to_string()).to_string());
        };

        debug!(tool = %name, "Running tool");
        match tool.execute(input).await {
            Ok(output) => output,
            Err(e) => {
                warn!(tool = %name, error = %e, "Tool execution failed");
                ToolOutput::failure(e.to_string())
            }
        }
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolCollection {
    fn default() -> Self {
        Self::new()
    }
}
