//! `deskpilot talk`: read agent output aloud.

use std::sync::Arc;

use deskpilot_config::AppConfig;
use deskpilot_speech::{AudioPlayer, SpeechClient, TextFileWatcher};

use super::{CmdResult, load_config};

/// Watcher over `transcript.input_file`, speaking through the configured player.
pub fn build_watcher(config: &AppConfig) -> Result<TextFileWatcher, Box<dyn std::error::Error>> {
    let client = SpeechClient::from_config(&config.speech)
        .ok_or("No speech API key: set OPENAI_API_KEY or speech.api_key in config.toml")?;
    let player = AudioPlayer::new(&config.speech.player);
    Ok(TextFileWatcher::from_config(
        config,
        Arc::new(client),
        Arc::new(player),
    ))
}

pub async fn run() -> CmdResult {
    let config = load_config()?;
    let watcher = build_watcher(&config)?;
    println!("Narrating {} (Ctrl+C to stop)", config.transcript.input_file);

    tokio::select! {
        _ = watcher.run() => {}
        _ = tokio::signal::ctrl_c() => {}
    }
    Ok(())
}
