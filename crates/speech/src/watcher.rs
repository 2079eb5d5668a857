//! Speaks the agent's latest text whenever the transcript input file changes.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use deskpilot_core::error::SpeechError;
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::player::Player;
use crate::tts::Synthesizer;

/// File name of the synthesized audio inside the output directory.
pub const SPEECH_FILE_NAME: &str = "speech.mp3";

/// Result of a single look at the watched file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The file does not exist yet.
    Missing,
    /// Modification time is the same as last time.
    Unchanged,
    /// The file was touched but its text is empty or was already spoken.
    Skipped,
    /// New text was synthesized and handed to the player.
    Spoken,
}

/// Delete a leftover `speech.mp3`. Returns whether a file was removed.
pub async fn remove_speech_file(output_dir: impl AsRef<Path>) -> Result<bool, SpeechError> {
    let path = output_dir.as_ref().join(SPEECH_FILE_NAME);
    match tokio::fs::remove_file(&path).await {
        Ok(()) => {
            debug!(path = %path.display(), "Removed stale speech file");
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

pub struct TextFileWatcher {
    input: PathBuf,
    output_dir: PathBuf,
    interval: Duration,
    synthesizer: Arc<dyn Synthesizer>,
    player: Arc<dyn Player>,
    last_modified: Option<SystemTime>,
    last_spoken: String,
    waiting: bool,
}

impl TextFileWatcher {
    pub fn new(
        input: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        synthesizer: Arc<dyn Synthesizer>,
        player: Arc<dyn Player>,
    ) -> Self {
        Self {
            input: input.into(),
            output_dir: output_dir.into(),
            interval: Duration::from_secs(1),
            synthesizer,
            player,
            last_modified: None,
            last_spoken: String::new(),
            waiting: false,
        }
    }

    pub fn from_config(
        config: &deskpilot_config::AppConfig,
        synthesizer: Arc<dyn Synthesizer>,
        player: Arc<dyn Player>,
    ) -> Self {
        Self::new(
            &config.transcript.input_file,
            &config.speech.output_dir,
            synthesizer,
            player,
        )
        .with_interval(Duration::from_millis(config.speech.poll_interval_ms))
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn speech_file(&self) -> PathBuf {
        self.output_dir.join(SPEECH_FILE_NAME)
    }

    /// Check the file once and speak it if it has new text.
    ///
    /// The stored modification time only advances after a successful
    /// synthesis, so a failed attempt is retried on the next poll.
    pub async fn poll_once(&mut self) -> Result<PollOutcome, SpeechError> {
        let modified = match tokio::fs::metadata(&self.input).await {
            Ok(meta) => meta.modified()?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if !self.waiting {
                    info!("Waiting for {} to be created...", self.input.display());
                    self.waiting = true;
                }
                return Ok(PollOutcome::Missing);
            }
            Err(e) => return Err(e.into()),
        };
        self.waiting = false;

        if self.last_modified == Some(modified) {
            return Ok(PollOutcome::Unchanged);
        }

        let raw = tokio::fs::read_to_string(&self.input).await?;
        let content = raw.trim();
        let mut outcome = PollOutcome::Skipped;

        if !content.is_empty() && content != self.last_spoken {
            let path = self.speech_file();
            self.synthesizer.synthesize_to_file(content, &path).await?;
            self.player.play(&path)?;
            info!(chars = content.len(), "Speaking new agent output");
            self.last_spoken = content.to_string();
            outcome = PollOutcome::Spoken;
        }

        self.last_modified = Some(modified);
        Ok(outcome)
    }

    /// Poll until `shutdown` becomes `true` or its sender is dropped.
    ///
    /// Errors are logged and polling continues.
    pub async fn run_until(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(file = %self.input.display(), interval_ms = self.interval.as_millis() as u64, "Watching for agent output");
        loop {
            if *shutdown.borrow() {
                break;
            }
            if let Err(e) = self.poll_once().await {
                error!(error = %e, "Speech watcher error");
            }
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        debug!("Speech watcher stopped");
    }

    /// Poll forever.
    pub async fn run(self) {
        let (_keep_alive, shutdown) = watch::channel(false);
        self.run_until(shutdown).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSynth {
        spoken: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl Synthesizer for RecordingSynth {
        async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SpeechError> {
            if self.fail {
                return Err(SpeechError::Api {
                    status_code: 500,
                    message: "down".into(),
                });
            }
            self.spoken.lock().unwrap().push(text.to_string());
            Ok(b"ID3".to_vec())
        }
    }

    #[derive(Default)]
    struct RecordingPlayer {
        played: Mutex<Vec<PathBuf>>,
    }

    impl Player for RecordingPlayer {
        fn play(&self, path: &Path) -> Result<(), SpeechError> {
            self.played.lock().unwrap().push(path.to_path_buf());
            Ok(())
        }
    }

    /// Write `content` and pin the mtime so consecutive writes always differ.
    fn write_at(path: &Path, content: &str, secs: u64) {
        std::fs::write(path, content).unwrap();
        let file = std::fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
            .unwrap();
    }

    struct Fixture {
        dir: tempfile::TempDir,
        synth: Arc<RecordingSynth>,
        player: Arc<RecordingPlayer>,
    }

    impl Fixture {
        fn new(synth: RecordingSynth) -> Self {
            Self {
                dir: tempfile::tempdir().unwrap(),
                synth: Arc::new(synth),
                player: Arc::new(RecordingPlayer::default()),
            }
        }

        fn input(&self) -> PathBuf {
            self.dir.path().join("input.txt")
        }

        fn watcher(&self) -> TextFileWatcher {
            TextFileWatcher::new(
                self.input(),
                self.dir.path().join("speech_files"),
                self.synth.clone(),
                self.player.clone(),
            )
        }
    }

    #[tokio::test]
    async fn missing_file_waits() {
        let fx = Fixture::new(RecordingSynth::default());
        let mut watcher = fx.watcher();
        assert_eq!(watcher.poll_once().await.unwrap(), PollOutcome::Missing);
        assert!(fx.synth.spoken.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn speaks_new_text_once() {
        let fx = Fixture::new(RecordingSynth::default());
        let mut watcher = fx.watcher();
        write_at(&fx.input(), "  Opening Safari now.\n", 100);

        assert_eq!(watcher.poll_once().await.unwrap(), PollOutcome::Spoken);
        assert_eq!(watcher.poll_once().await.unwrap(), PollOutcome::Unchanged);

        assert_eq!(*fx.synth.spoken.lock().unwrap(), vec!["Opening Safari now."]);
        let played = fx.player.played.lock().unwrap();
        assert_eq!(played.len(), 1);
        assert!(played[0].ends_with("speech_files/speech.mp3"));
        assert!(played[0].exists());
    }

    #[tokio::test]
    async fn same_text_or_empty_is_skipped() {
        let fx = Fixture::new(RecordingSynth::default());
        let mut watcher = fx.watcher();

        write_at(&fx.input(), "hello", 100);
        assert_eq!(watcher.poll_once().await.unwrap(), PollOutcome::Spoken);

        write_at(&fx.input(), "hello\n", 200);
        assert_eq!(watcher.poll_once().await.unwrap(), PollOutcome::Skipped);

        write_at(&fx.input(), "   ", 300);
        assert_eq!(watcher.poll_once().await.unwrap(), PollOutcome::Skipped);

        write_at(&fx.input(), "goodbye", 400);
        assert_eq!(watcher.poll_once().await.unwrap(), PollOutcome::Spoken);

        assert_eq!(*fx.synth.spoken.lock().unwrap(), vec!["hello", "goodbye"]);
    }

    #[tokio::test]
    async fn failed_synthesis_is_retried() {
        let fx = Fixture::new(RecordingSynth {
            fail: true,
            ..Default::default()
        });
        let mut watcher = fx.watcher();
        write_at(&fx.input(), "hello", 100);

        assert!(watcher.poll_once().await.is_err());
        // Same mtime, but nothing was recorded as spoken, so it tries again.
        assert!(watcher.poll_once().await.is_err());
        assert!(fx.player.played.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn remove_speech_file_reports_whether_it_existed() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!remove_speech_file(dir.path()).await.unwrap());

        std::fs::write(dir.path().join(SPEECH_FILE_NAME), b"ID3").unwrap();
        assert!(remove_speech_file(dir.path()).await.unwrap());
        assert!(!dir.path().join(SPEECH_FILE_NAME).exists());
    }

    #[tokio::test]
    async fn run_until_stops_on_shutdown() {
        let fx = Fixture::new(RecordingSynth::default());
        write_at(&fx.input(), "hello", 100);
        let watcher = fx.watcher().with_interval(Duration::from_millis(10));
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(watcher.run_until(rx));
        tokio::time::sleep(Duration::from_millis(100)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();

        assert_eq!(*fx.synth.spoken.lock().unwrap(), vec!["hello"]);
    }
}
