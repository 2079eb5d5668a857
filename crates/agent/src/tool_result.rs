//! Conversion of tool outputs into `tool_result` blocks.

use deskpilot_core::message::{ContentBlock, ToolResultContent};
use deskpilot_core::tool::ToolOutput;

/// Build the `tool_result` block answering `tool_use_id`.
///
/// A failed output carries only its error text. A successful one carries a
/// text item when there is output, then an image item when there is a
/// screenshot. Any system note is prepended to the text as `<system>..</system>`.
pub fn make_tool_result(output: &ToolOutput, tool_use_id: &str) -> ContentBlock {
    let mut content = Vec::new();
    let is_error = output.is_error();

    if let Some(error) = &output.error {
        content.push(ToolResultContent::text(with_system(output, error)));
    } else {
        if let Some(text) = &output.output {
            content.push(ToolResultContent::text(with_system(output, text)));
        }
        if let Some(image) = &output.base64_image {
            content.push(ToolResultContent::png(image.clone()));
        }
    }

    ContentBlock::ToolResult {
        tool_use_id: tool_use_id.to_string(),
        content,
        is_error,
    }
}

fn with_system(output: &ToolOutput, text: &str) -> String {
    match &output.system {
        Some(system) => format!("<system>{system}</system>\n{text}"),
        None => text.to_string(),
    }
}
