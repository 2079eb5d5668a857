//! Spoken narration of the agent's output.
//!
//! The interaction loop writes each model text block to a transcript file;
//! [`TextFileWatcher`] notices the change, synthesizes it with a
//! [`Synthesizer`] and hands the audio to a [`Player`].

pub mod player;
pub mod tts;
pub mod watcher;

pub use player::{AudioPlayer, Player};
pub use tts::{SpeechClient, Synthesizer};
pub use watcher::{PollOutcome, SPEECH_FILE_NAME, TextFileWatcher, remove_speech_file};
