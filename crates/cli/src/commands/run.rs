//! `deskpilot run`: one task through the interaction loop.

use deskpilot_config::AppConfig;
use deskpilot_core::message::Conversation;
use tracing::info;

use super::{CmdResult, build_agent, build_handler, load_config};

/// The `--task` flag wins over `agent.default_task`; blank tasks are rejected.
pub fn resolve_task(flag: Option<String>, config: &AppConfig) -> Result<String, String> {
    flag.or_else(|| config.agent.default_task.clone())
        .map(|task| task.trim().to_string())
        .filter(|task| !task.is_empty())
        .ok_or_else(|| "No task given: pass --task or set agent.default_task in config.toml".into())
}

pub async fn run(task: Option<String>, transcript: bool) -> CmdResult {
    let config = load_config()?;
    run_with_config(&config, task, transcript).await
}

pub async fn run_with_config(config: &AppConfig, task: Option<String>, transcript: bool) -> CmdResult {
    let task = resolve_task(task, config)?;
    let agent = build_agent(config)?;
    let handler = build_handler(config, transcript);

    info!(model = agent.model(), "Starting task");
    let mut conversation = Conversation::with_instruction(task);
    let summary = agent.process_messages(&mut conversation, &handler).await?;

    println!();
    println!(
        "Done after {} iteration(s), {} tool call(s), {} screenshot(s) trimmed.",
        summary.iterations, summary.tool_calls, summary.images_trimmed
    );
    if let Some(text) = conversation.last_assistant_text() {
        println!("\n{text}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_beats_default_task() {
        let mut config = AppConfig::default();
        config.agent.default_task = Some("from config".into());
        assert_eq!(resolve_task(Some("from flag".into()), &config).unwrap(), "from flag");
        assert_eq!(resolve_task(None, &config).unwrap(), "from config");
    }

    #[test]
    fn missing_or_blank_task_is_an_error() {
        let config = AppConfig::default();
        assert!(resolve_task(None, &config).is_err());
        assert!(resolve_task(Some("   ".into()), &config).is_err());
    }
}
