//! SQLite queue backend.
//!
//! One database file with two tables:
//! - `message_queue`: tasks waiting for the agent, keyed by an autoincrement id
//! - `messages`: the mailbox, keyed by a UUID string
//!
//! Timestamps are stored as fixed-width RFC 3339 text so that lexical order
//! matches time order.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use deskpilot_core::error::QueueError;
use deskpilot_core::queue::{MailMessage, QueueBackend, QueuedTask};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

pub struct SqliteQueue {
    pool: SqlitePool,
}

const TASK_COLUMNS: &str = "id, message, recipient, is_processed, created_at, processed_at";
const MESSAGE_COLUMNS: &str = "id, content, sender, recipient, is_read, created_at, read_at";

impl SqliteQueue {
    /// Open (or create) the queue database at `path`.
    ///
    /// Accepts a plain file path or a `sqlite:` URL.
    pub async fn new(path: &str) -> Result<Self, QueueError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| QueueError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| QueueError::Storage(format!("Failed to open SQLite: {e}")))?;

        let queue = Self { pool };
        queue.run_migrations().await?;
        info!("SQLite queue initialized at {path}");
        Ok(queue)
    }

    /// Wrap an existing pool and make sure the tables exist.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, QueueError> {
        let queue = Self { pool };
        queue.run_migrations().await?;
        Ok(queue)
    }

    async fn run_migrations(&self) -> Result<(), QueueError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS message_queue (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                message       TEXT NOT NULL,
                recipient     TEXT NOT NULL,
                is_processed  INTEGER NOT NULL DEFAULT 0,
                created_at    TEXT NOT NULL,
                processed_at  TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| QueueError::MigrationFailed(format!("message_queue table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                id          TEXT PRIMARY KEY NOT NULL,
                content     TEXT NOT NULL,
                sender      TEXT NOT NULL,
                recipient   TEXT NOT NULL,
                is_read     INTEGER NOT NULL DEFAULT 0,
                created_at  TEXT NOT NULL,
                read_at     TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| QueueError::MigrationFailed(format!("messages table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_messages_unread ON messages (recipient, is_read, created_at)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| QueueError::MigrationFailed(format!("messages index: {e}")))?;

        debug!("SQLite queue migrations complete");
        Ok(())
    }

    async fn fetch_task(&self, id: i64) -> Result<QueuedTask, QueueError> {
        let row = sqlx::query(&format!("SELECT {TASK_COLUMNS} FROM message_queue WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| QueueError::QueryFailed(format!("select task: {e}")))?
            .ok_or_else(|| QueueError::NotFound(format!("task {id}")))?;
        row_to_task(&row)
    }

    async fn fetch_message(&self, id: &str) -> Result<MailMessage, QueueError> {
        let row = sqlx::query(&format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| QueueError::QueryFailed(format!("select message: {e}")))?
            .ok_or_else(|| QueueError::NotFound(format!("message {id}")))?;
        row_to_message(&row)
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(column: &str, value: &str) -> Result<DateTime<Utc>, QueueError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| QueueError::QueryFailed(format!("{column} column: {e}")))
}

fn column<'r, T>(row: &'r SqliteRow, name: &str) -> Result<T, QueueError>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(name)
        .map_err(|e| QueueError::QueryFailed(format!("{name} column: {e}")))
}

fn optional_timestamp(row: &SqliteRow, name: &str) -> Result<Option<DateTime<Utc>>, QueueError> {
    column::<Option<String>>(row, name)?
        .map(|value| parse_timestamp(name, &value))
        .transpose()
}

fn row_to_task(row: &SqliteRow) -> Result<QueuedTask, QueueError> {
    let created_at: String = column(row, "created_at")?;
    Ok(QueuedTask {
        id: column(row, "id")?,
        message: column(row, "message")?,
        recipient: column(row, "recipient")?,
        is_processed: column(row, "is_processed")?,
        created_at: parse_timestamp("created_at", &created_at)?,
        processed_at: optional_timestamp(row, "processed_at")?,
    })
}

fn row_to_message(row: &SqliteRow) -> Result<MailMessage, QueueError> {
    let created_at: String = column(row, "created_at")?;
    Ok(MailMessage {
        id: column(row, "id")?,
        content: column(row, "content")?,
        sender: column(row, "sender")?,
        recipient: column(row, "recipient")?,
        is_read: column(row, "is_read")?,
        created_at: parse_timestamp("created_at", &created_at)?,
        read_at: optional_timestamp(row, "read_at")?,
    })
}

#[async_trait]
impl QueueBackend for SqliteQueue {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn add_to_queue(&self, message: &str, recipient: &str) -> Result<QueuedTask, QueueError> {
        let result = sqlx::query(
            "INSERT INTO message_queue (message, recipient, is_processed, created_at) VALUES (?, ?, 0, ?)",
        )
        .bind(message)
        .bind(recipient)
        .bind(timestamp(Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(|e| QueueError::QueryFailed(format!("insert task: {e}")))?;

        let id = result.last_insert_rowid();
        debug!(task_id = id, recipient, "Task queued");
        self.fetch_task(id).await
    }

    async fn get_unprocessed(&self) -> Result<Vec<QueuedTask>, QueueError> {
        let rows = sqlx::query(&format!(
            "SELECT {TASK_COLUMNS} FROM message_queue WHERE is_processed = 0 ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| QueueError::QueryFailed(format!("select pending tasks: {e}")))?;

        rows.iter().map(row_to_task).collect()
    }

    async fn mark_as_processed(&self, id: i64) -> Result<QueuedTask, QueueError> {
        let result = sqlx::query("UPDATE message_queue SET is_processed = 1, processed_at = ? WHERE id = ?")
            .bind(timestamp(Utc::now()))
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| QueueError::QueryFailed(format!("update task: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(QueueError::NotFound(format!("task {id}")));
        }
        self.fetch_task(id).await
    }

    async fn send_message(
        &self,
        content: &str,
        sender: &str,
        recipient: &str,
    ) -> Result<MailMessage, QueueError> {
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO messages (id, content, sender, recipient, is_read, created_at) VALUES (?, ?, ?, ?, 0, ?)",
        )
        .bind(&id)
        .bind(content)
        .bind(sender)
        .bind(recipient)
        .bind(timestamp(Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(|e| QueueError::QueryFailed(format!("insert message: {e}")))?;

        self.fetch_message(&id).await
    }

    async fn get_unread_messages(&self, recipient: &str) -> Result<Vec<MailMessage>, QueueError> {
        let rows = sqlx::query(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE recipient = ? AND is_read = 0 ORDER BY created_at, rowid"
        ))
        .bind(recipient)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| QueueError::QueryFailed(format!("select unread: {e}")))?;

        rows.iter().map(row_to_message).collect()
    }

    async fn mark_as_read(&self, id: &str) -> Result<MailMessage, QueueError> {
        let result = sqlx::query("UPDATE messages SET is_read = 1, read_at = ? WHERE id = ?")
            .bind(timestamp(Utc::now()))
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| QueueError::QueryFailed(format!("update message: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(QueueError::NotFound(format!("message {id}")));
        }
        self.fetch_message(id).await
    }

    async fn mark_all_as_read(&self, recipient: &str) -> Result<Vec<MailMessage>, QueueError> {
        let rows = sqlx::query(&format!(
            "UPDATE messages SET is_read = 1, read_at = ? WHERE recipient = ? AND is_read = 0 RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(timestamp(Utc::now()))
        .bind(recipient)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| QueueError::QueryFailed(format!("update messages: {e}")))?;

        rows.iter().map(row_to_message).collect()
    }
}
