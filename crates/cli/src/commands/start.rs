//! `deskpilot start`: narration and the agent side by side.

use std::time::Duration;

use deskpilot_agent::TranscriptHandler;
use tokio::sync::watch;
use tracing::{info, warn};

use super::{CmdResult, load_config, run, talk};

const ANNOUNCEMENT: &str = "starting computer use agent in 5 seconds";

/// Time given to the narrator to read the announcement.
const ANNOUNCEMENT_DELAY: Duration = Duration::from_millis(6000);

pub async fn run(task: Option<String>) -> CmdResult {
    let config = load_config()?;
    // Fail before announcing anything if the task or keys are missing.
    let task = run::resolve_task(task, &config)?;
    let watcher = talk::build_watcher(&config)?;

    if deskpilot_speech::remove_speech_file(&config.speech.output_dir).await? {
        info!("Removed stale speech file");
    }
    TranscriptHandler::from_config(&config.transcript)
        .save_input(ANNOUNCEMENT)
        .await?;

    let (tx, rx) = watch::channel(false);
    let narrator = tokio::spawn(watcher.run_until(rx));

    tokio::time::sleep(ANNOUNCEMENT_DELAY).await;
    let outcome = run::run_with_config(&config, Some(task), true).await;
    if let Err(e) = &outcome {
        warn!(error = %e, "Agent run failed");
    }

    println!("\nAgent finished. Narration continues until Ctrl+C.");
    tokio::signal::ctrl_c().await?;
    let _ = tx.send(true);
    narrator.await?;

    outcome
}
