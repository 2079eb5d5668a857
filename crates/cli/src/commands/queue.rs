//! `deskpilot queue`, `deskpilot enqueue` and `deskpilot db-setup`.

use std::sync::Arc;
use std::time::Duration;

use deskpilot_agent::QueueRunner;
use tokio::sync::watch;
use tracing::info;

use super::{CmdResult, build_agent, build_handler, load_config};

pub async fn run(watch_mode: bool) -> CmdResult {
    let config = load_config()?;
    let queue = deskpilot_queue::build_from_config(&config).await?;
    let agent = Arc::new(build_agent(&config)?);
    let handler = build_handler(&config, true);
    let runner = QueueRunner::new(agent, queue);

    if !watch_mode {
        let report = runner.process_queue(&handler).await?;
        println!(
            "Queue pass complete: {} processed, {} failed.",
            report.processed, report.failed
        );
        return Ok(());
    }

    let interval = Duration::from_secs(config.queue.poll_interval_secs);
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown requested");
            let _ = tx.send(true);
        }
    });

    info!(interval_secs = interval.as_secs(), "Watching the task queue (Ctrl+C to stop)");
    runner.watch(&handler, interval, rx).await?;
    Ok(())
}

pub async fn enqueue(recipient: &str, message: &str) -> CmdResult {
    let config = load_config()?;
    let queue = deskpilot_queue::build_from_config(&config).await?;
    let task = queue.add_to_queue(message, recipient).await?;
    println!("Queued task #{} for {}: {}", task.id, task.recipient, task.message);
    Ok(())
}

pub async fn db_setup() -> CmdResult {
    let config = load_config()?;
    println!("Setting up the {} queue backend...", config.queue.backend);
    // Opening a backend creates its tables.
    let queue = deskpilot_queue::build_from_config(&config).await?;
    let pending = queue.get_unprocessed().await?;
    println!("  Tables ready ({} pending task(s)).", pending.len());
    Ok(())
}
