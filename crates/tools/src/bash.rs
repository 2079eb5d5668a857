//! Bash tool: run shell commands on the host.
//!
//! Sent to the model as the native `bash_20241022` tool type. Each call runs
//! in a fresh `sh -c` process bounded by a timeout.
//!
//! There is no persistent session: the working directory and exported
//! variables reset on every call, so a `cd` or `export` only applies to the
//! command it is part of. Chain dependent steps in one command
//! (`cd /tmp && ls`). `restart` is accepted and does nothing.

use std::time::Duration;

use async_trait::async_trait;
use deskpilot_core::error::ToolError;
use deskpilot_core::tool::{Tool, ToolDefinition, ToolOutput};
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, warn};

const TOOL_NAME: &str = "bash";
const API_TYPE: &str = "bash_20241022";

#[derive(Debug, Deserialize)]
struct BashInput {
    #[serde(default)]
    command: Option<String>,
    #[serde(default)]
    restart: bool,
}

pub struct BashTool {
    timeout: Duration,
}

impl BashTool {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for BashTool {
    fn default() -> Self {
        Self::new(Duration::from_secs(120))
    }
}

#[async_trait]
impl Tool for BashTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition::Native {
            api_type: API_TYPE.into(),
            name: TOOL_NAME.into(),
            options: serde_json::Map::new(),
        }
    }

    async fn execute(&self, input: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let input: BashInput = serde_json::from_value(input)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

        // Every command already gets a fresh process, so there is no
        // session to tear down.
        if input.restart {
            return Ok(ToolOutput {
                system: Some("tool has been restarted.".into()),
                ..Default::default()
            });
        }

        let command = input
            .command
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| ToolError::InvalidArguments("no command provided.".into()))?;

        debug!(command = %command, "Executing shell command");

        let child = Command::new("sh")
            .args(["-c", &command])
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(ToolError::ExecutionFailed {
                    tool_name: TOOL_NAME.into(),
                    reason: e.to_string(),
                });
            }
            Err(_) => {
                warn!(command = %command, "Command timed out");
                return Err(ToolError::Timeout {
                    tool_name: TOOL_NAME.into(),
                    timeout_secs: self.timeout.as_secs(),
                });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).trim_end().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim_end().to_string();

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            warn!(command = %command, exit_code = code, "Command failed");
        }

        Ok(ToolOutput {
            output: (!stdout.is_empty()).then_some(stdout),
            error: (!stderr.is_empty()).then_some(stderr),
            ..Default::default()
        })
    }
}
