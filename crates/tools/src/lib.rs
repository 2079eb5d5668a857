//! Built-in tool implementations for deskpilot.
//!
//! Tools give the agent the ability to act on the desktop:
//! look at the screen, move the mouse and type, run shell commands,
//! and view or edit files. All three are sent to the model as native
//! computer-use tool types.

pub mod bash;
pub mod computer;
pub mod edit;

use std::time::Duration;

use deskpilot_config::ComputerConfig;
use deskpilot_core::tool::ToolCollection;

pub use bash::BashTool;
pub use computer::ComputerTool;
pub use edit::EditTool;

/// Create the default tool collection: computer, bash and editor, in that order.
pub fn default_collection(config: &ComputerConfig) -> ToolCollection {
    let mut tools = ToolCollection::new();
    tools.register(Box::new(ComputerTool::from_config(config)));
    tools.register(Box::new(BashTool::new(Duration::from_secs(
        config.bash_timeout_secs,
    ))));
    tools.register(Box::new(EditTool::new()));
    tools
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_collection_order() {
        let tools = default_collection(&ComputerConfig::default());
        assert_eq!(tools.names(), vec!["computer", "bash", "str_replace_editor"]);

        let params = tools.to_params();
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json[0]["type"], "computer_20241022");
        assert_eq!(json[0]["display_width_px"], 1280);
        assert_eq!(json[1]["type"], "bash_20241022");
        assert_eq!(json[2]["type"], "text_editor_20241022");
    }

    #[tokio::test]
    async fn unknown_tool_becomes_failure() {
        let tools = default_collection(&ComputerConfig::default());
        let output = tools.run("browser", serde_json::json!({})).await;
        assert!(output.is_error());
        assert!(output.error.unwrap().contains("browser"));
    }
}
