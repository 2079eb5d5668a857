//! Subcommand implementations plus the wiring they share.

pub mod mailbox;
pub mod onboard;
pub mod queue;
pub mod run;
pub mod start;
pub mod talk;
pub mod windows;

use std::sync::Arc;

use deskpilot_agent::{CompositeHandler, ConsoleHandler, InteractionLoop, TranscriptHandler};
use deskpilot_config::AppConfig;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

pub fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    Ok(AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?)
}

/// Provider, tools and loop settings from config.
pub fn build_agent(config: &AppConfig) -> Result<InteractionLoop, Box<dyn std::error::Error>> {
    if config.provider == "anthropic" && !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    export ANTHROPIC_API_KEY=sk-ant-...");
        eprintln!("    export DESKPILOT_API_KEY=sk-ant-...");
        eprintln!();
        eprintln!("  Or add api_key to {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
    }

    let selected = deskpilot_providers::build_from_config(config)?;
    let tools = Arc::new(deskpilot_tools::default_collection(&config.computer));
    Ok(InteractionLoop::from_config(
        config,
        selected.provider,
        selected.model,
        tools,
    ))
}

/// Console output, plus the transcript files when `transcript` is set.
pub fn build_handler(config: &AppConfig, transcript: bool) -> CompositeHandler {
    let handler = CompositeHandler::new().with(ConsoleHandler);
    if transcript {
        handler.with(TranscriptHandler::from_config(&config.transcript))
    } else {
        handler
    }
}
