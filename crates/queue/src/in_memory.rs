//! In-memory queue, for tests and throwaway sessions.

use async_trait::async_trait;
use chrono::Utc;
use deskpilot_core::error::QueueError;
use deskpilot_core::queue::{MailMessage, QueueBackend, QueuedTask};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct State {
    next_task_id: i64,
    tasks: Vec<QueuedTask>,
    messages: Vec<MailMessage>,
}

/// Keeps tasks and messages in insertion order. Nothing survives a restart.
#[derive(Clone, Default)]
pub struct InMemoryQueue {
    state: Arc<RwLock<State>>,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QueueBackend for InMemoryQueue {
    fn name(&self) -> &str {
        "memory"
    }

    async fn add_to_queue(&self, message: &str, recipient: &str) -> Result<QueuedTask, QueueError> {
        let mut state = self.state.write().await;
        state.next_task_id += 1;
        let task = QueuedTask {
            id: state.next_task_id,
            message: message.into(),
            recipient: recipient.into(),
            is_processed: false,
            created_at: Utc::now(),
            processed_at: None,
        };
        state.tasks.push(task.clone());
        Ok(task)
    }

    async fn get_unprocessed(&self) -> Result<Vec<QueuedTask>, QueueError> {
        let state = self.state.read().await;
        Ok(state.tasks.iter().filter(|t| !t.is_processed).cloned().collect())
    }

    async fn mark_as_processed(&self, id: i64) -> Result<QueuedTask, QueueError> {
        let mut state = self.state.write().await;
        let task = state
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| QueueError::NotFound(format!("task {id}")))?;
        task.is_processed = true;
        task.processed_at = Some(Utc::now());
        Ok(task.clone())
    }

    async fn send_message(
        &self,
        content: &str,
        sender: &str,
        recipient: &str,
    ) -> Result<MailMessage, QueueError> {
        let message = MailMessage {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            sender: sender.into(),
            recipient: recipient.into(),
            is_read: false,
            created_at: Utc::now(),
            read_at: None,
        };
        self.state.write().await.messages.push(message.clone());
        Ok(message)
    }

    async fn get_unread_messages(&self, recipient: &str) -> Result<Vec<MailMessage>, QueueError> {
        let state = self.state.read().await;
        Ok(state
            .messages
            .iter()
            .filter(|m| m.recipient == recipient && !m.is_read)
            .cloned()
            .collect())
    }

    async fn mark_as_read(&self, id: &str) -> Result<MailMessage, QueueError> {
        let mut state = self.state.write().await;
        let message = state
            .messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| QueueError::NotFound(format!("message {id}")))?;
        message.is_read = true;
        message.read_at = Some(Utc::now());
        Ok(message.clone())
    }

    async fn mark_all_as_read(&self, recipient: &str) -> Result<Vec<MailMessage>, QueueError> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let mut updated = Vec::new();
        for message in state
            .messages
            .iter_mut()
            .filter(|m| m.recipient == recipient && !m.is_read)
        {
            message.is_read = true;
            message.read_at = Some(now);
            updated.push(message.clone());
        }
        Ok(updated)
    }
}
