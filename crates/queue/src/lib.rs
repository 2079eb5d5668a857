//! Task queue and mailbox backends for DeskPilot.

pub mod in_memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "postgres")]
pub mod postgres;

use std::sync::Arc;

use deskpilot_config::AppConfig;
use deskpilot_core::error::QueueError;
use deskpilot_core::queue::QueueBackend;
use tracing::info;

pub use in_memory::InMemoryQueue;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteQueue;

#[cfg(feature = "postgres")]
pub use postgres::PostgresQueue;

/// Open the backend named by `config.queue.backend`.
///
/// The postgres backend also runs its migration, so a fresh database is
/// usable straight away.
pub async fn build_from_config(config: &AppConfig) -> Result<Arc<dyn QueueBackend>, QueueError> {
    match config.queue.backend.as_str() {
        "memory" => Ok(Arc::new(InMemoryQueue::new())),

        #[cfg(feature = "sqlite")]
        "sqlite" => {
            let path = config.sqlite_path();
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| QueueError::Storage(format!("{}: {e}", parent.display())))?;
            }
            let queue = SqliteQueue::new(&path.to_string_lossy()).await?;
            Ok(Arc::new(queue))
        }

        #[cfg(feature = "postgres")]
        "postgres" => {
            let url = config.queue.database_url.as_deref().ok_or_else(|| {
                QueueError::Storage("postgres queue needs DATABASE_URL or queue.database_url".into())
            })?;
            let queue = PostgresQueue::connect(url).await?;
            queue.migrate().await?;
            Ok(Arc::new(queue))
        }

        other => {
            info!(backend = other, "Queue backend not compiled in");
            Err(QueueError::Storage(format!(
                "queue backend '{other}' is not available in this build"
            )))
        }
    }
}
