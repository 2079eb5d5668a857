//! Error types for the deskpilot domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; [`Error`] wraps them all.

use thiserror::Error;

/// The top-level error type for all deskpilot operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Remote completion endpoint (transport) ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Tool execution ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Observer callbacks ---
    #[error("Handler error: {0}")]
    Handler(#[from] HandlerError),

    // --- Task queue / mailbox ---
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    // --- Text to speech ---
    #[error("Speech error: {0}")]
    Speech(#[from] SpeechError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Loop limits ---
    #[error("Interaction loop stopped after reaching the iteration limit of {limit}")]
    IterationLimit { limit: u32 },

    #[error("Interaction loop stopped after exceeding its {limit_secs}s deadline")]
    DeadlineExceeded { limit_secs: u64 },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Shorthand for a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Tool timed out: {tool_name} after {timeout_secs}s")]
    Timeout { tool_name: String, timeout_secs: u64 },

    #[error("Permission denied: {tool_name}: {reason}")]
    PermissionDenied { tool_name: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("Handler I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Handler failed: {0}")]
    Failed(String),
}

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("Speech API request failed: {message} (status: {status_code})")]
    Api { status_code: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Speech file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Audio playback failed: {0}")]
    Playback(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 529,
            message: "Overloaded".into(),
        });
        assert!(err.to_string().contains("529"));
        assert!(err.to_string().contains("Overloaded"));
    }

    #[test]
    fn tool_error_displays_correctly() {
        let err = Error::Tool(ToolError::PermissionDenied {
            tool_name: "bash".into(),
            reason: "permission denied".into(),
        });
        assert!(err.to_string().contains("bash"));
        assert!(err.to_string().contains("permission denied"));
    }

    #[test]
    fn loop_limit_errors_name_their_limit() {
        let err = Error::IterationLimit { limit: 40 };
        assert!(err.to_string().contains("40"));

        let err = Error::DeadlineExceeded { limit_secs: 900 };
        assert!(err.to_string().contains("900s"));
    }

    #[test]
    fn config_shorthand() {
        let err = Error::config("unknown API provider 'openai'");
        assert!(matches!(err, Error::Config { .. }));
        assert!(err.to_string().contains("openai"));
    }
}
