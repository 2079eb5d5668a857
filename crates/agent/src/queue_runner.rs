//! Drains the task queue through the interaction loop.

use std::sync::Arc;
use std::time::Duration;

use deskpilot_core::error::{Error, Result};
use deskpilot_core::handler::MessageHandler;
use deskpilot_core::message::Conversation;
use deskpilot_core::queue::{QueueBackend, QueuedTask};
use tokio::sync::watch;
use tracing::{error, info};

use crate::loop_runner::InteractionLoop;

/// Outcome of one pass over the queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueRunReport {
    pub processed: usize,
    pub failed: usize,
}

/// The instruction given to the agent for a queued task.
pub fn task_instruction(task: &QueuedTask) -> String {
    format!(
        "open messages on my computer and message {} '{}' wait for a reply then reply appropriately",
        task.recipient, task.message
    )
}

pub struct QueueRunner {
    agent: Arc<InteractionLoop>,
    queue: Arc<dyn QueueBackend>,
}

impl QueueRunner {
    pub fn new(agent: Arc<InteractionLoop>, queue: Arc<dyn QueueBackend>) -> Self {
        Self { agent, queue }
    }

    /// Run every unprocessed task once, oldest first.
    ///
    /// A task is marked processed only when its run succeeds. A failed task
    /// is logged, left unprocessed, and the next task is attempted.
    pub async fn process_queue(&self, handler: &dyn MessageHandler) -> Result<QueueRunReport> {
        let tasks = self.queue.get_unprocessed().await?;
        let mut report = QueueRunReport::default();

        if tasks.is_empty() {
            info!(queue = self.queue.name(), "No queued tasks");
            return Ok(report);
        }
        info!(queue = self.queue.name(), count = tasks.len(), "Processing queued tasks");

        for task in tasks {
            let mut conversation = Conversation::with_instruction(task_instruction(&task));
            let outcome = match self.agent.process_messages(&mut conversation, handler).await {
                Ok(_) => self.queue.mark_as_processed(task.id).await.map_err(Error::from),
                Err(e) => Err(e),
            };

            match outcome {
                Ok(_) => {
                    info!(task_id = task.id, recipient = %task.recipient, "Task processed");
                    report.processed += 1;
                }
                Err(e) => {
                    error!(task_id = task.id, error = %e, "Error processing task");
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    /// Poll the queue until `shutdown` flips to `true`.
    pub async fn watch(
        &self,
        handler: &dyn MessageHandler,
        interval: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        loop {
            if *shutdown.borrow() {
                return Ok(());
            }
            if let Err(e) = self.process_queue(handler).await {
                error!(error = %e, "Queue poll failed");
            }
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        return Ok(());
                    }
                }
            }
        }
    }
}
