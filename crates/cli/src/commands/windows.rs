//! `deskpilot windows`: hide or show apps through System Events.

use deskpilot_config::AppConfig;
use tracing::debug;

use super::{CmdResult, load_config};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Hide,
    Show,
    List,
}

const PERMISSION_HELP: &str = "\
Permission denied by macOS.

Please grant permissions:
1. Open System Settings
2. Go to Privacy & Security > Automation
3. Find your terminal app or IDE
4. Check the box next to 'System Events'
5. Run this command again";

/// AppleScript that hides every process not named in `visible`.
pub fn hide_script(visible: &[String]) -> String {
    let filter = visible
        .iter()
        .map(|app| format!("name is not \"{}\"", app.replace('\\', "\\\\").replace('"', "\\\"")))
        .collect::<Vec<_>>()
        .join(" and ");
    let target = if filter.is_empty() {
        "every process".to_string()
    } else {
        format!("every process whose {filter}")
    };
    format!("tell application \"System Events\"\n    set visible of {target} to false\nend tell")
}

pub fn show_script() -> &'static str {
    "tell application \"System Events\"\n    set visible of every process to true\nend tell"
}

pub fn list_script() -> &'static str {
    "tell application \"System Events\"\n    get name of every process where background only is false\nend tell"
}

pub fn script_for(action: Action, config: &AppConfig) -> String {
    match action {
        Action::Hide => hide_script(&config.windows.visible_apps),
        Action::Show => show_script().to_string(),
        Action::List => list_script().to_string(),
    }
}

/// Map `osascript` output to a result. Authorization failures get setup steps.
pub fn interpret_output(stdout: &str, stderr: &str) -> Result<String, String> {
    let stderr = stderr.trim();
    if stderr.contains("Not authorized") {
        return Err(PERMISSION_HELP.to_string());
    }
    if !stderr.is_empty() {
        return Err(format!("osascript failed: {stderr}"));
    }
    Ok(stdout.trim().to_string())
}

async fn run_apple_script(script: &str) -> Result<String, Box<dyn std::error::Error>> {
    debug!(script, "Running AppleScript");
    let output = tokio::process::Command::new("osascript")
        .arg("-e")
        .arg(script)
        .output()
        .await
        .map_err(|e| format!("failed to run osascript: {e}"))?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    Ok(interpret_output(&stdout, &stderr)?)
}

pub async fn run(action: Action) -> CmdResult {
    let config = load_config()?;
    let output = run_apple_script(&script_for(action, &config)).await?;

    match action {
        Action::Hide => println!(
            "Done. Only {} should be visible.",
            config.windows.visible_apps.join(" and ")
        ),
        Action::Show => println!("All windows shown."),
        Action::List => {
            println!("Running applications:");
            for app in output.split(", ").filter(|a| !a.is_empty()) {
                println!("  {app}");
            }
        }
    }
    Ok(())
}
