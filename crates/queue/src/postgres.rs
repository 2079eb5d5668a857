//! PostgreSQL queue backend.
//!
//! Works against any Postgres database, including a hosted Supabase
//! instance reached through its direct connection string.
//!
//! # Feature gate
//!
//! ```toml
//! deskpilot-queue = { workspace = true, features = ["postgres"] }
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deskpilot_core::error::QueueError;
use deskpilot_core::queue::{MailMessage, QueueBackend, QueuedTask};
use sqlx::Row;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use tracing::{debug, info};
use uuid::Uuid;

const TASK_COLUMNS: &str = "id, message, recipient, is_processed, created_at, processed_at";
const MESSAGE_COLUMNS: &str = "id::text AS id, content, sender, recipient, is_read, created_at, read_at";

pub struct PostgresQueue {
    pool: PgPool,
}

impl PostgresQueue {
    /// Connect using a `postgres://` URL.
    pub async fn connect(database_url: &str) -> Result<Self, QueueError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(|e| QueueError::Storage(format!("PostgreSQL connection failed: {e}")))?;

        info!("Connected to PostgreSQL for the task queue");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the queue tables if they are missing.
    pub async fn migrate(&self) -> Result<(), QueueError> {
        let migration_sql = include_str!("../migrations/001_create_queue.sql");

        sqlx::raw_sql(migration_sql)
            .execute(&self.pool)
            .await
            .map_err(|e| QueueError::MigrationFailed(format!("Migration failed: {e}")))?;

        info!("Queue schema migration complete");
        Ok(())
    }
}

fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T, QueueError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(name)
        .map_err(|e| QueueError::QueryFailed(format!("{name} column: {e}")))
}

fn row_to_task(row: &PgRow) -> Result<QueuedTask, QueueError> {
    Ok(QueuedTask {
        id: column(row, "id")?,
        message: column(row, "message")?,
        recipient: column(row, "recipient")?,
        is_processed: column(row, "is_processed")?,
        created_at: column::<DateTime<Utc>>(row, "created_at")?,
        processed_at: column::<Option<DateTime<Utc>>>(row, "processed_at")?,
    })
}

fn row_to_message(row: &PgRow) -> Result<MailMessage, QueueError> {
    Ok(MailMessage {
        id: column(row, "id")?,
        content: column(row, "content")?,
        sender: column(row, "sender")?,
        recipient: column(row, "recipient")?,
        is_read: column(row, "is_read")?,
        created_at: column::<DateTime<Utc>>(row, "created_at")?,
        read_at: column::<Option<DateTime<Utc>>>(row, "read_at")?,
    })
}

#[async_trait]
impl QueueBackend for PostgresQueue {
    fn name(&self) -> &str {
        "postgres"
    }

    async fn add_to_queue(&self, message: &str, recipient: &str) -> Result<QueuedTask, QueueError> {
        let row = sqlx::query(&format!(
            "INSERT INTO message_queue (message, recipient, is_processed, created_at) \
             VALUES ($1, $2, FALSE, $3) RETURNING {TASK_COLUMNS}"
        ))
        .bind(message)
        .bind(recipient)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| QueueError::QueryFailed(format!("insert task: {e}")))?;

        let task = row_to_task(&row)?;
        debug!(task_id = task.id, recipient, "Task queued");
        Ok(task)
    }

    async fn get_unprocessed(&self) -> Result<Vec<QueuedTask>, QueueError> {
        let rows = sqlx::query(&format!(
            "SELECT {TASK_COLUMNS} FROM message_queue WHERE is_processed = FALSE ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| QueueError::QueryFailed(format!("select pending tasks: {e}")))?;

        rows.iter().map(row_to_task).collect()
    }

    async fn mark_as_processed(&self, id: i64) -> Result<QueuedTask, QueueError> {
        let row = sqlx::query(&format!(
            "UPDATE message_queue SET is_processed = TRUE, processed_at = $1 WHERE id = $2 RETURNING {TASK_COLUMNS}"
        ))
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| QueueError::QueryFailed(format!("update task: {e}")))?
        .ok_or_else(|| QueueError::NotFound(format!("task {id}")))?;

        row_to_task(&row)
    }

    async fn send_message(
        &self,
        content: &str,
        sender: &str,
        recipient: &str,
    ) -> Result<MailMessage, QueueError> {
        let row = sqlx::query(&format!(
            "INSERT INTO messages (id, content, sender, recipient, is_read, created_at) \
             VALUES ($1::uuid, $2, $3, $4, FALSE, $5) RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(Uuid::new_v4().to_string())
        .bind(content)
        .bind(sender)
        .bind(recipient)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| QueueError::QueryFailed(format!("insert message: {e}")))?;

        row_to_message(&row)
    }

    async fn get_unread_messages(&self, recipient: &str) -> Result<Vec<MailMessage>, QueueError> {
        let rows = sqlx::query(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE recipient = $1 AND is_read = FALSE ORDER BY created_at"
        ))
        .bind(recipient)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| QueueError::QueryFailed(format!("select unread: {e}")))?;

        rows.iter().map(row_to_message).collect()
    }

    async fn mark_as_read(&self, id: &str) -> Result<MailMessage, QueueError> {
        // Anything that is not a UUID cannot exist in the table.
        if Uuid::parse_str(id).is_err() {
            return Err(QueueError::NotFound(format!("message {id}")));
        }

        let row = sqlx::query(&format!(
            "UPDATE messages SET is_read = TRUE, read_at = $1 WHERE id = $2::uuid RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| QueueError::QueryFailed(format!("update message: {e}")))?
        .ok_or_else(|| QueueError::NotFound(format!("message {id}")))?;

        row_to_message(&row)
    }

    async fn mark_all_as_read(&self, recipient: &str) -> Result<Vec<MailMessage>, QueueError> {
        let rows = sqlx::query(&format!(
            "UPDATE messages SET is_read = TRUE, read_at = $1 \
             WHERE recipient = $2 AND is_read = FALSE RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(Utc::now())
        .bind(recipient)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| QueueError::QueryFailed(format!("update messages: {e}")))?;

        rows.iter().map(row_to_message).collect()
    }
}
