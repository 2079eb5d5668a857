//! Computer tool: screenshots, mouse and keyboard on a macOS desktop.
//!
//! Sent to the model as the native `computer_20241022` tool type. Input is
//! driven through `cliclick`, screenshots through `screencapture -x`. Both
//! programs are configurable so other hosts can plug in compatible ones.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use deskpilot_core::error::ToolError;
use deskpilot_core::tool::{Tool, ToolDefinition, ToolOutput};
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

const TOOL_NAME: &str = "computer";
const API_TYPE: &str = "computer_20241022";

/// Characters sent per `t:` argument when typing.
const TYPING_GROUP_SIZE: usize = 50;

/// A validated computer action.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Key(String),
    Type(String),
    MouseMove { x: u32, y: u32 },
    LeftClickDrag { x: u32, y: u32 },
    LeftClick,
    RightClick,
    MiddleClick,
    DoubleClick,
    Screenshot,
    CursorPosition,
}

#[derive(Debug, Deserialize)]
struct ComputerInput {
    action: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    coordinate: Option<serde_json::Value>,
}

impl Action {
    /// Validate raw tool input into an action.
    pub fn parse(input: serde_json::Value) -> Result<Self, ToolError> {
        let input: ComputerInput =
            serde_json::from_value(input).map_err(|e| ToolError::InvalidArguments(e.to_string()))?;
        let action = input.action.as_str();

        match action {
            "mouse_move" | "left_click_drag" => {
                if input.text.is_some() {
                    return Err(invalid(format!("text is not accepted for {action}")));
                }
                let coordinate = input
                    .coordinate
                    .ok_or_else(|| invalid(format!("coordinate is required for {action}")))?;
                let (x, y) = parse_coordinate(&coordinate)?;
                Ok(if action == "mouse_move" {
                    Self::MouseMove { x, y }
                } else {
                    Self::LeftClickDrag { x, y }
                })
            }
            "key" | "type" => {
                if input.coordinate.is_some() {
                    return Err(invalid(format!("coordinate is not accepted for {action}")));
                }
                let text = input
                    .text
                    .ok_or_else(|| invalid(format!("text is required for {action}")))?;
                Ok(if action == "key" {
                    Self::Key(text)
                } else {
                    Self::Type(text)
                })
            }
            "left_click" | "right_click" | "middle_click" | "double_click" | "screenshot"
            | "cursor_position" => {
                if input.text.is_some() {
                    return Err(invalid(format!("text is not accepted for {action}")));
                }
                if input.coordinate.is_some() {
                    return Err(invalid(format!("coordinate is not accepted for {action}")));
                }
                Ok(match action {
                    "left_click" => Self::LeftClick,
                    "right_click" => Self::RightClick,
                    "middle_click" => Self::MiddleClick,
                    "double_click" => Self::DoubleClick,
                    "screenshot" => Self::Screenshot,
                    _ => Self::CursorPosition,
                })
            }
            other => Err(invalid(format!("Invalid action: {other}"))),
        }
    }

    /// Whether a screenshot should follow this action.
    fn wants_screenshot(&self) -> bool {
        !matches!(self, Self::Screenshot | Self::CursorPosition)
    }
}

fn invalid(message: String) -> ToolError {
    ToolError::InvalidArguments(message)
}

fn parse_coordinate(value: &serde_json::Value) -> Result<(u32, u32), ToolError> {
    let bad = || invalid(format!("{value} must be a tuple of non-negative ints"));
    let items = value.as_array().ok_or_else(bad)?;
    if items.len() != 2 {
        return Err(bad());
    }
    let x = items[0].as_u64().and_then(|v| u32::try_from(v).ok()).ok_or_else(bad)?;
    let y = items[1].as_u64().and_then(|v| u32::try_from(v).ok()).ok_or_else(bad)?;
    Ok((x, y))
}

/// Translate an xdotool-style key chord (e.g. `cmd+shift+t`, `Return`)
/// into cliclick key-down / key-press / key-up commands.
pub fn key_commands(chord: &str) -> Result<Vec<String>, ToolError> {
    let parts: Vec<&str> = chord.split('+').map(str::trim).filter(|p| !p.is_empty()).collect();
    let Some((key, modifiers)) = parts.split_last() else {
        return Err(invalid("text is required for key".into()));
    };

    let modifiers = modifiers
        .iter()
        .map(|m| modifier_name(m).ok_or_else(|| invalid(format!("unknown modifier '{m}'"))))
        .collect::<Result<Vec<_>, _>>()?;

    let mut commands: Vec<String> = Vec::new();
    if !modifiers.is_empty() {
        commands.push(format!("kd:{}", modifiers.join(",")));
    }
    match special_key_name(key) {
        Some(name) => commands.push(format!("kp:{name}")),
        None if key.chars().count() == 1 => commands.push(format!("t:{key}")),
        None => return Err(invalid(format!("unknown key '{key}'"))),
    }
    if !modifiers.is_empty() {
        commands.push(format!("ku:{}", modifiers.join(",")));
    }
    Ok(commands)
}

fn modifier_name(name: &str) -> Option<&'static str> {
    match name.to_ascii_lowercase().as_str() {
        "cmd" | "command" | "super" | "meta" => Some("cmd"),
        "ctrl" | "control" => Some("ctrl"),
        "alt" | "option" => Some("alt"),
        "shift" => Some("shift"),
        "fn" => Some("fn"),
        _ => None,
    }
}

fn special_key_name(name: &str) -> Option<String> {
    let lower = name.to_ascii_lowercase();
    let mapped = match lower.as_str() {
        "return" => "return",
        "enter" | "kp_enter" => "enter",
        "escape" | "esc" => "esc",
        "backspace" => "delete",
        "delete" => "fwd-delete",
        "tab" => "tab",
        "space" => "space",
        "up" => "arrow-up",
        "down" => "arrow-down",
        "left" => "arrow-left",
        "right" => "arrow-right",
        "page_up" | "prior" => "page-up",
        "page_down" | "next" => "page-down",
        "home" => "home",
        "end" => "end",
        f if f.len() <= 3 && f.starts_with('f') && f[1..].parse::<u8>().is_ok_and(|n| (1..=16).contains(&n)) => {
            return Some(f.to_string());
        }
        _ => return None,
    };
    Some(mapped.to_string())
}

/// Build the cliclick arguments for an input action.
///
/// Returns `None` for actions that are not input (screenshot, cursor position).
pub fn input_args(action: &Action) -> Result<Option<Vec<String>>, ToolError> {
    let args = match action {
        Action::Key(chord) => key_commands(chord)?,
        Action::Type(text) => {
            let chars: Vec<char> = text.chars().collect();
            chars
                .chunks(TYPING_GROUP_SIZE)
                .map(|chunk| format!("t:{}", chunk.iter().collect::<String>()))
                .collect()
        }
        Action::MouseMove { x, y } => vec![format!("m:{x},{y}")],
        Action::LeftClickDrag { x, y } => vec!["dd:.".into(), format!("du:{x},{y}")],
        Action::LeftClick => vec!["c:.".into()],
        Action::RightClick => vec!["rc:.".into()],
        Action::DoubleClick => vec!["dc:.".into()],
        Action::MiddleClick => {
            return Err(ToolError::ExecutionFailed {
                tool_name: TOOL_NAME.into(),
                reason: "middle_click is not supported by the input backend".into(),
            });
        }
        Action::Screenshot | Action::CursorPosition => return Ok(None),
    };
    Ok(Some(args))
}

/// Controls the local display.
pub struct ComputerTool {
    width: u32,
    height: u32,
    display_number: Option<u32>,
    screenshot_command: String,
    input_command: String,
    screenshot_delay: Duration,
}

impl ComputerTool {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            display_number: None,
            screenshot_command: "screencapture".into(),
            input_command: "cliclick".into(),
            screenshot_delay: Duration::from_secs(2),
        }
    }

    pub fn from_config(config: &deskpilot_config::ComputerConfig) -> Self {
        Self {
            width: config.display_width,
            height: config.display_height,
            display_number: config.display_number,
            screenshot_command: config.screenshot_command.clone(),
            input_command: config.input_command.clone(),
            screenshot_delay: Duration::from_millis(config.screenshot_delay_ms),
        }
    }

    pub fn with_commands(
        mut self,
        screenshot_command: impl Into<String>,
        input_command: impl Into<String>,
    ) -> Self {
        self.screenshot_command = screenshot_command.into();
        self.input_command = input_command.into();
        self
    }

    pub fn with_screenshot_delay(mut self, delay: Duration) -> Self {
        self.screenshot_delay = delay;
        self
    }

    async fn run_input(&self, args: &[String]) -> Result<String, ToolError> {
        debug!(command = %self.input_command, ?args, "Running input command");
        let output = Command::new(&self.input_command)
            .args(args)
            .output()
            .await
            .map_err(|e| self.failed(format!("{}: {e}", self.input_command)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.failed(format!(
                "{} exited with {}: {}",
                self.input_command,
                output.status,
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Capture the screen and return it base64-encoded.
    async fn screenshot(&self) -> Result<String, ToolError> {
        let path: PathBuf = std::env::temp_dir()
            .join(format!("deskpilot-screenshot-{}.png", uuid::Uuid::new_v4()));

        let mut command = Command::new(&self.screenshot_command);
        command.arg("-x");
        if let Some(display) = self.display_number {
            command.arg(format!("-D{display}"));
        }
        let status = command
            .arg(&path)
            .status()
            .await
            .map_err(|e| self.failed(format!("{}: {e}", self.screenshot_command)))?;
        if !status.success() {
            return Err(self.failed(format!("{} exited with {status}", self.screenshot_command)));
        }

        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| self.failed(format!("Failed to take screenshot: {e}")))?;
        let _ = tokio::fs::remove_file(&path).await;

        Ok(base64::engine::general_purpose::STANDARD.encode(bytes))
    }

    fn failed(&self, reason: String) -> ToolError {
        ToolError::ExecutionFailed {
            tool_name: TOOL_NAME.into(),
            reason,
        }
    }
}

#[async_trait]
impl Tool for ComputerTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn to_definition(&self) -> ToolDefinition {
        let mut options = serde_json::Map::new();
        options.insert("display_width_px".into(), self.width.into());
        options.insert("display_height_px".into(), self.height.into());
        if let Some(display) = self.display_number {
            options.insert("display_number".into(), display.into());
        }
        ToolDefinition::Native {
            api_type: API_TYPE.into(),
            name: TOOL_NAME.into(),
            options,
        }
    }

    async fn execute(&self, input: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let action = Action::parse(input)?;
        debug!(?action, "Computer action");

        match &action {
            Action::Screenshot => return Ok(ToolOutput::image(self.screenshot().await?)),
            Action::CursorPosition => {
                let position = self.run_input(&["p".into()]).await?;
                let (x, y) = position.split_once(',').unwrap_or((position.as_str(), ""));
                return Ok(ToolOutput::text(format!("X={},Y={}", x.trim(), y.trim())));
            }
            _ => {}
        }

        let Some(args) = input_args(&action)? else {
            return Ok(ToolOutput::default());
        };
        let stdout = self.run_input(&args).await?;

        let mut output = ToolOutput::default();
        if !stdout.is_empty() {
            output.output = Some(stdout);
        }
        if action.wants_screenshot() {
            tokio::time::sleep(self.screenshot_delay).await;
            output.base64_image = Some(self.screenshot().await?);
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn native_definition_carries_display_size() {
        let tool = ComputerTool::new(1280, 800);
        let json = serde_json::to_value(tool.to_definition()).unwrap();
        assert_eq!(
            json,
            json!({
                "type": "computer_20241022",
                "name": "computer",
                "display_width_px": 1280,
                "display_height_px": 800
            })
        );
    }

    #[test]
    fn parse_valid_actions() {
        assert_eq!(
            Action::parse(json!({"action": "mouse_move", "coordinate": [10, 20]})).unwrap(),
            Action::MouseMove { x: 10, y: 20 }
        );
        assert_eq!(
            Action::parse(json!({"action": "type", "text": "hello"})).unwrap(),
            Action::Type("hello".into())
        );
        assert_eq!(
            Action::parse(json!({"action": "screenshot"})).unwrap(),
            Action::Screenshot
        );
    }

    #[test]
    fn coordinate_required_for_mouse_move() {
        let err = Action::parse(json!({"action": "mouse_move"})).unwrap_err();
        assert!(err.to_string().contains("coordinate is required"));
    }

    #[test]
    fn negative_coordinate_rejected() {
        let err = Action::parse(json!({"action": "left_click_drag", "coordinate": [-1, 5]}))
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn text_forbidden_for_clicks() {
        assert!(Action::parse(json!({"action": "left_click", "text": "x"})).is_err());
        assert!(Action::parse(json!({"action": "key", "coordinate": [1, 1], "text": "a"})).is_err());
    }

    #[test]
    fn unknown_action_rejected() {
        let err = Action::parse(json!({"action": "zoom"})).unwrap_err();
        assert!(err.to_string().contains("Invalid action: zoom"));
    }

    #[test]
    fn key_chords_translate_to_cliclick() {
        assert_eq!(key_commands("Return").unwrap(), vec!["kp:return"]);
        assert_eq!(
            key_commands("cmd+shift+t").unwrap(),
            vec!["kd:cmd,shift", "t:t", "ku:cmd,shift"]
        );
        assert_eq!(key_commands("ctrl+F5").unwrap(), vec!["kd:ctrl", "kp:f5", "ku:ctrl"]);
        assert!(key_commands("hyper+x").is_err());
        assert!(key_commands("NotAKey").is_err());
    }

    #[test]
    fn typing_is_chunked() {
        let text: String = "a".repeat(120);
        let args = input_args(&Action::Type(text)).unwrap().unwrap();
        assert_eq!(args.len(), 3);
        assert_eq!(args[0].len(), 2 + TYPING_GROUP_SIZE);
        assert_eq!(args[2], format!("t:{}", "a".repeat(20)));
    }

    #[test]
    fn click_and_drag_args() {
        assert_eq!(input_args(&Action::LeftClick).unwrap().unwrap(), vec!["c:."]);
        assert_eq!(
            input_args(&Action::LeftClickDrag { x: 5, y: 6 }).unwrap().unwrap(),
            vec!["dd:.", "du:5,6"]
        );
        assert!(input_args(&Action::Screenshot).unwrap().is_none());
        assert!(input_args(&Action::MiddleClick).is_err());
    }

    #[tokio::test]
    async fn missing_input_program_is_execution_failure() {
        let tool = ComputerTool::new(1280, 800)
            .with_commands("deskpilot-no-such-screencapture", "deskpilot-no-such-cliclick")
            .with_screenshot_delay(Duration::ZERO);
        let err = tool
            .execute(json!({"action": "left_click"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::ExecutionFailed { .. }));
    }
}
