//! Fire-and-forget audio playback.

use std::path::Path;
use std::process::Stdio;

use deskpilot_core::error::SpeechError;
use tracing::debug;

/// Plays an audio file without waiting for it to finish.
pub trait Player: Send + Sync {
    fn play(&self, path: &Path) -> Result<(), SpeechError>;
}

/// Runs `<program> <file>` in the background (`afplay` on macOS).
#[derive(Debug, Clone)]
pub struct AudioPlayer {
    program: String,
}

impl AudioPlayer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for AudioPlayer {
    fn default() -> Self {
        Self::new("afplay")
    }
}

impl Player for AudioPlayer {
    fn play(&self, path: &Path) -> Result<(), SpeechError> {
        // Not awaited. Playback may overlap the next utterance.
        let child = tokio::process::Command::new(&self.program)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| SpeechError::Playback(format!("{}: {e}", self.program)))?;
        debug!(player = %self.program, pid = child.id(), path = %path.display(), "Playback started");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_program_is_playback_error() {
        let player = AudioPlayer::new("definitely-not-an-audio-player-xyz");
        let err = player.play(Path::new("speech.mp3")).unwrap_err();
        assert!(matches!(err, SpeechError::Playback(_)));
    }

    #[tokio::test]
    async fn spawns_without_waiting() {
        let player = AudioPlayer::new("true");
        assert!(player.play(Path::new("speech.mp3")).is_ok());
    }

    #[test]
    fn default_is_afplay() {
        assert_eq!(AudioPlayer::default().program(), "afplay");
    }
}
