//! Built-in [`MessageHandler`] implementations.

use std::path::PathBuf;

use async_trait::async_trait;
use deskpilot_core::error::HandlerError;
use deskpilot_core::handler::MessageHandler;
use deskpilot_core::message::ContentBlock;
use deskpilot_core::provider::ProviderResponse;
use deskpilot_core::tool::ToolOutput;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Prints loop activity to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleHandler;

#[async_trait]
impl MessageHandler for ConsoleHandler {
    async fn on_raw_response(&self, response: &ProviderResponse) -> Result<(), HandlerError> {
        info!(
            status = response.raw.status_code,
            request_id = response.raw.request_id.as_deref().unwrap_or("-"),
            stop_reason = response.stop_reason.as_deref().unwrap_or("-"),
            "Model response"
        );
        println!("\nAPI Response Status: {}", response.raw.status_code);
        Ok(())
    }

    async fn on_model_output_block(&self, block: &ContentBlock) -> Result<(), HandlerError> {
        match block {
            ContentBlock::Text { text } => {
                println!("\nModel Output:\n{text}");
            }
            ContentBlock::ToolUse { name, input, .. } => {
                println!("\nUsing tool: {name}");
                println!("Input: {input}");
            }
            ContentBlock::ToolResult { .. } => {}
        }
        Ok(())
    }

    async fn on_tool_output(&self, output: &ToolOutput, tool_use_id: &str) -> Result<(), HandlerError> {
        println!("\nTool Output (ID: {tool_use_id}):");
        if let Some(text) = &output.output {
            println!("{text}");
        }
        if let Some(error) = &output.error {
            println!("Error: {error}");
        }
        if output.base64_image.is_some() {
            println!("[Image data available]");
        }
        Ok(())
    }
}

/// Writes model text to disk.
///
/// Each text block overwrites `input_file` (picked up by the speech watcher)
/// and is appended to `log_file` followed by a blank line. As a loop handler
/// it never fails: write errors are logged and the run goes on.
#[derive(Debug, Clone)]
pub struct TranscriptHandler {
    input_file: PathBuf,
    log_file: PathBuf,
}

impl TranscriptHandler {
    pub fn new(input_file: impl Into<PathBuf>, log_file: impl Into<PathBuf>) -> Self {
        Self {
            input_file: input_file.into(),
            log_file: log_file.into(),
        }
    }

    pub fn from_config(config: &deskpilot_config::TranscriptConfig) -> Self {
        Self::new(&config.input_file, &config.log_file)
    }

    /// Overwrite the input file with `text`.
    pub async fn save_input(&self, text: &str) -> Result<(), HandlerError> {
        tokio::fs::write(&self.input_file, text).await?;
        debug!(path = %self.input_file.display(), "Saved model text");
        Ok(())
    }

    /// Append `text` to the log, separated from earlier entries by a newline.
    pub async fn append_log(&self, text: &str) -> Result<(), HandlerError> {
        let existing = match tokio::fs::metadata(&self.log_file).await {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => 0,
            Err(e) => return Err(e.into()),
        };

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file)
            .await?;
        if existing > 0 {
            file.write_all(b"\n").await?;
        }
        file.write_all(text.as_bytes()).await?;
        file.write_all(b"\n\n").await?;
        file.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl MessageHandler for TranscriptHandler {
    async fn on_model_output_block(&self, block: &ContentBlock) -> Result<(), HandlerError> {
        if let ContentBlock::Text { text } = block {
            if let Err(e) = self.save_input(text).await {
                warn!(error = %e, path = %self.input_file.display(), "Error saving transcript");
            }
            if let Err(e) = self.append_log(text).await {
                warn!(error = %e, path = %self.log_file.display(), "Error appending transcript log");
            }
        }
        Ok(())
    }
}

/// Forwards every notification to each inner handler in order.
///
/// Stops at the first handler that fails and returns its error.
#[derive(Default)]
pub struct CompositeHandler {
    handlers: Vec<Box<dyn MessageHandler>>,
}

impl CompositeHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, handler: impl MessageHandler + 'static) -> Self {
        self.handlers.push(Box::new(handler));
        self
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[async_trait]
impl MessageHandler for CompositeHandler {
    async fn on_raw_response(&self, response: &ProviderResponse) -> Result<(), HandlerError> {
        for handler in &self.handlers {
            handler.on_raw_response(response).await?;
        }
        Ok(())
    }

    async fn on_model_output_block(&self, block: &ContentBlock) -> Result<(), HandlerError> {
        for handler in &self.handlers {
            handler.on_model_output_block(block).await?;
        }
        Ok(())
    }

    async fn on_tool_output(&self, output: &ToolOutput, tool_use_id: &str) -> Result<(), HandlerError> {
        for handler in &self.handlers {
            handler.on_tool_output(output, tool_use_id).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn transcript_overwrites_input_and_appends_log() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.txt");
        let log = dir.path().join("logs.txt");
        let handler = TranscriptHandler::new(&input, &log);

        handler
            .on_model_output_block(&ContentBlock::text("first"))
            .await
            .unwrap();
        handler
            .on_model_output_block(&ContentBlock::text("second"))
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(&input).unwrap(), "second");
        assert_eq!(std::fs::read_to_string(&log).unwrap(), "first\n\n\nsecond\n\n");
    }

    #[tokio::test]
    async fn transcript_ignores_tool_use() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.txt");
        let handler = TranscriptHandler::new(&input, dir.path().join("logs.txt"));
        handler
            .on_model_output_block(&ContentBlock::tool_use("t1", "bash", serde_json::json!({})))
            .await
            .unwrap();
        assert!(!input.exists());
    }

    #[tokio::test]
    async fn transcript_io_failure_is_logged_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let handler = TranscriptHandler::new(missing.join("input.txt"), missing.join("logs.txt"));

        handler
            .on_model_output_block(&ContentBlock::text("hello"))
            .await
            .unwrap();
        assert!(!missing.exists());

        // Direct calls still report the failure.
        let err = handler.save_input("hello").await.unwrap_err();
        assert!(matches!(err, HandlerError::Io(_)));
        let err = handler.append_log("hello").await.unwrap_err();
        assert!(matches!(err, HandlerError::Io(_)));
    }

    #[tokio::test]
    async fn log_failure_still_saves_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.txt");
        let handler = TranscriptHandler::new(&input, dir.path().join("missing").join("logs.txt"));

        handler
            .on_model_output_block(&ContentBlock::text("still spoken"))
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(&input).unwrap(), "still spoken");
    }

    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    #[async_trait]
    impl MessageHandler for Recorder {
        async fn on_tool_output(&self, _output: &ToolOutput, id: &str) -> Result<(), HandlerError> {
            self.log.lock().unwrap().push(format!("{}:{id}", self.name));
            if self.fail {
                Err(HandlerError::Failed("boom".into()))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn composite_fans_out_in_order_and_stops_on_error() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let composite = CompositeHandler::new()
            .with(Recorder { name: "a", log: log.clone(), fail: false })
            .with(Recorder { name: "b", log: log.clone(), fail: true })
            .with(Recorder { name: "c", log: log.clone(), fail: false });
        assert_eq!(composite.len(), 3);

        let result = composite.on_tool_output(&ToolOutput::text("ok"), "t1").await;
        assert!(result.is_err());
        assert_eq!(*log.lock().unwrap(), vec!["a:t1", "b:t1"]);
    }
}
