//! Queue trait: the hosted task queue and agent mailbox.
//!
//! Two tables back this contract:
//! - `message_queue`: instructions waiting to be run by the agent
//! - `messages`: a simple sender → recipient mailbox with read tracking

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::QueueError;

/// A task waiting in the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedTask {
    pub id: i64,

    /// Message the agent should deliver
    pub message: String,

    /// Who the agent should deliver it to
    pub recipient: String,

    pub is_processed: bool,

    pub created_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
}

/// A mailbox message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MailMessage {
    pub id: String,
    pub content: String,
    pub sender: String,
    pub recipient: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_at: Option<DateTime<Utc>>,
}

/// The queue backend trait.
///
/// Implementations: in-memory, SQLite, PostgreSQL.
#[async_trait]
pub trait QueueBackend: Send + Sync {
    /// Backend name (e.g., "sqlite", "postgres").
    fn name(&self) -> &str;

    /// Add a new task to the queue.
    async fn add_to_queue(&self, message: &str, recipient: &str) -> Result<QueuedTask, QueueError>;

    /// All unprocessed tasks, oldest first.
    async fn get_unprocessed(&self) -> Result<Vec<QueuedTask>, QueueError>;

    /// Mark a task as processed.
    async fn mark_as_processed(&self, id: i64) -> Result<QueuedTask, QueueError>;

    /// Send a mailbox message.
    async fn send_message(
        &self,
        content: &str,
        sender: &str,
        recipient: &str,
    ) -> Result<MailMessage, QueueError>;

    /// Unread messages for a recipient, oldest first.
    async fn get_unread_messages(&self, recipient: &str) -> Result<Vec<MailMessage>, QueueError>;

    /// Mark a single message as read.
    async fn mark_as_read(&self, id: &str) -> Result<MailMessage, QueueError>;

    /// Mark every unread message for a recipient as read. Returns the updated rows.
    async fn mark_all_as_read(&self, recipient: &str) -> Result<Vec<MailMessage>, QueueError>;
}
