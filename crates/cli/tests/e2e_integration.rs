//! End-to-end tests for the DeskPilot agent pipeline.
//!
//! These drive the real loop, real bash and editor tools, the queue and
//! the narration watcher, with only the model endpoint and audio scripted.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use deskpilot_agent::{InteractionLoop, QueueRunner, TranscriptHandler};
use deskpilot_core::error::{Error, ProviderError, SpeechError, ToolError};
use deskpilot_core::message::{ContentBlock, Conversation, ToolResultContent, Turn};
use deskpilot_core::provider::{Provider, ProviderRequest, ProviderResponse, RawResponse, Usage};
use deskpilot_core::queue::QueueBackend;
use deskpilot_core::tool::{Tool, ToolCollection, ToolOutput};
use deskpilot_core::NoopHandler;
use deskpilot_queue::InMemoryQueue;
use deskpilot_speech::{Player, PollOutcome, Synthesizer, TextFileWatcher};
use deskpilot_tools::{BashTool, EditTool};
use serde_json::json;

// ── Mock Provider ────────────────────────────────────────────────────────

/// Returns scripted responses in order and keeps every request.
struct ScriptedProvider {
    responses: Mutex<Vec<ProviderResponse>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    fn new(responses: Vec<ProviderResponse>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            panic!("ScriptedProvider exhausted");
        }
        Ok(responses.remove(0))
    }
}

fn response(content: Vec<ContentBlock>) -> ProviderResponse {
    ProviderResponse {
        id: "msg_e2e".into(),
        model: "mock".into(),
        content,
        stop_reason: None,
        usage: Some(Usage {
            input_tokens: 10,
            output_tokens: 5,
        }),
        raw: RawResponse {
            status_code: 200,
            request_id: None,
        },
    }
}

fn text_response(text: &str) -> ProviderResponse {
    response(vec![ContentBlock::text(text)])
}

fn screenshot_request(id: usize) -> ProviderResponse {
    response(vec![ContentBlock::tool_use(
        format!("shot_{id}"),
        "screenshot",
        json!({"action": "screenshot"}),
    )])
}

/// Stands in for the real computer tool, which needs a display.
struct FakeScreenshot;

#[async_trait::async_trait]
impl Tool for FakeScreenshot {
    fn name(&self) -> &str {
        "screenshot"
    }

    async fn execute(&self, _input: serde_json::Value) -> Result<ToolOutput, ToolError> {
        Ok(ToolOutput::image("iVBORw0KGgo="))
    }
}

fn images_in(turns: &[Turn]) -> usize {
    turns
        .iter()
        .flat_map(|t| t.content.iter())
        .map(ContentBlock::image_count)
        .sum()
}

fn tool_results(turn: &Turn) -> Vec<(String, Vec<ToolResultContent>, bool)> {
    turn.content
        .iter()
        .filter_map(|b| match b {
            ContentBlock::ToolResult {
                tool_use_id,
                content,
                is_error,
            } => Some((tool_use_id.clone(), content.clone(), *is_error)),
            _ => None,
        })
        .collect()
}

// ── Mock speech ─────────────────────────────────────────────────────────

#[derive(Default)]
struct RecordingSynth(Mutex<Vec<String>>);

#[async_trait::async_trait]
impl Synthesizer for RecordingSynth {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SpeechError> {
        self.0.lock().unwrap().push(text.to_string());
        Ok(b"ID3".to_vec())
    }
}

#[derive(Default)]
struct RecordingPlayer(Mutex<Vec<PathBuf>>);

impl Player for RecordingPlayer {
    fn play(&self, path: &Path) -> Result<(), SpeechError> {
        self.0.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }
}

// ── E2E: queue → loop → tools → transcript → narration ───────────────────

#[tokio::test]
async fn e2e_queued_task_runs_tools_and_is_narrated() {
    let dir = tempfile::tempdir().unwrap();
    let notes = dir.path().join("notes.txt");
    let input_file = dir.path().join("input.txt");
    let log_file = dir.path().join("logs.txt");

    let queue = Arc::new(InMemoryQueue::new());
    queue.add_to_queue("hi I am an agent", "Sam").await.unwrap();

    let provider = Arc::new(ScriptedProvider::new(vec![
        response(vec![
            ContentBlock::text("Let me check the machine first."),
            ContentBlock::tool_use("toolu_1", "bash", json!({"command": "echo ready"})),
            ContentBlock::tool_use(
                "toolu_2",
                "str_replace_editor",
                json!({"command": "create", "path": notes.display().to_string(), "file_text": "sent to Sam"}),
            ),
        ]),
        text_response("Message sent to Sam."),
    ]));

    let mut tools = ToolCollection::new();
    tools.register(Box::new(BashTool::default()));
    tools.register(Box::new(EditTool::new()));
    let agent = InteractionLoop::new(provider.clone(), "mock", Arc::new(tools));

    let handler = TranscriptHandler::new(&input_file, &log_file);
    let report = QueueRunner::new(Arc::new(agent), queue.clone())
        .process_queue(&handler)
        .await
        .unwrap();

    assert_eq!(report.processed, 1);
    assert_eq!(report.failed, 0);
    assert!(queue.get_unprocessed().await.unwrap().is_empty());

    // The editor really wrote the file.
    assert_eq!(std::fs::read_to_string(&notes).unwrap(), "sent to Sam");

    // The second request carries both results, in request order.
    let requests = provider.requests();
    assert_eq!(requests.len(), 2);
    let results = tool_results(requests[1].turns.last().unwrap());
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].0, "toolu_1");
    assert_eq!(results[0].1, vec![ToolResultContent::text("ready")]);
    assert!(!results[0].2);
    assert_eq!(results[1].0, "toolu_2");
    assert!(!results[1].2);

    // Instruction wording for queued tasks.
    let first = serde_json::to_string(&requests[0].turns).unwrap();
    assert!(first.contains("message Sam 'hi I am an agent'"));

    // Transcript: latest text in input, everything in the log.
    assert_eq!(std::fs::read_to_string(&input_file).unwrap(), "Message sent to Sam.");
    let log = std::fs::read_to_string(&log_file).unwrap();
    assert!(log.contains("Let me check the machine first."));
    assert!(log.ends_with("Message sent to Sam.\n\n"));

    // Narration picks up the latest text.
    let synth = Arc::new(RecordingSynth::default());
    let player = Arc::new(RecordingPlayer::default());
    let mut watcher = TextFileWatcher::new(
        &input_file,
        dir.path().join("speech_files"),
        synth.clone(),
        player.clone(),
    );
    assert_eq!(watcher.poll_once().await.unwrap(), PollOutcome::Spoken);
    assert_eq!(*synth.0.lock().unwrap(), vec!["Message sent to Sam."]);
    assert_eq!(player.0.lock().unwrap().len(), 1);
}

// ── E2E: screenshot history stays bounded ────────────────────────────────

#[tokio::test]
async fn e2e_screenshot_history_stays_bounded() {
    let mut script: Vec<ProviderResponse> = (0..30).map(screenshot_request).collect();
    script.push(text_response("done looking"));
    let provider = Arc::new(ScriptedProvider::new(script));

    let mut tools = ToolCollection::new();
    tools.register(Box::new(FakeScreenshot));
    let agent = InteractionLoop::new(provider.clone(), "mock", Arc::new(tools))
        .with_image_retention(10)
        .with_chunk_size(10);

    let mut conversation = Conversation::with_instruction("watch the screen");
    let summary = agent
        .process_messages(&mut conversation, &NoopHandler)
        .await
        .unwrap();

    assert_eq!(summary.iterations, 31);
    assert_eq!(summary.tool_calls, 30);

    for request in provider.requests() {
        let images = images_in(&request.turns);
        assert!(images < 20, "request carried {images} images");
    }
    assert!(summary.images_trimmed > 0);
    assert_eq!(
        conversation.image_count() + summary.images_trimmed,
        30,
        "every screenshot is either kept or trimmed"
    );
}

// ── E2E: runaway loops are stopped ───────────────────────────────────────

#[tokio::test]
async fn e2e_iteration_limit_stops_runaway_agent() {
    let script: Vec<ProviderResponse> = (0..10).map(screenshot_request).collect();
    let provider = Arc::new(ScriptedProvider::new(script));

    let mut tools = ToolCollection::new();
    tools.register(Box::new(FakeScreenshot));
    let agent = InteractionLoop::new(provider.clone(), "mock", Arc::new(tools)).with_max_iterations(3);

    let mut conversation = Conversation::with_instruction("never stop");
    let err = agent
        .process_messages(&mut conversation, &NoopHandler)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::IterationLimit { limit: 3 }));
    assert_eq!(provider.requests().len(), 3);
}

// ── E2E: tool failures are reported, not fatal ───────────────────────────

#[tokio::test]
async fn e2e_failing_command_is_reported_to_the_model() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        response(vec![ContentBlock::tool_use(
            "toolu_err",
            "str_replace_editor",
            json!({"command": "view", "path": "relative/path.txt"}),
        )]),
        text_response("That path was wrong."),
    ]));

    let mut tools = ToolCollection::new();
    tools.register(Box::new(EditTool::new()));
    let agent = InteractionLoop::new(provider.clone(), "mock", Arc::new(tools));

    let mut conversation = Conversation::with_instruction("look at a file");
    agent
        .process_messages(&mut conversation, &NoopHandler)
        .await
        .unwrap();

    let requests = provider.requests();
    let results = tool_results(requests[1].turns.last().unwrap());
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].0, "toolu_err");
    assert!(results[0].2, "editor failure must be flagged as an error");
    assert_eq!(conversation.last_assistant_text(), Some("That path was wrong."));
}
