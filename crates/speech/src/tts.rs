//! OpenAI-compatible text-to-speech client.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use deskpilot_core::error::SpeechError;
use serde::Serialize;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Turns text into encoded audio.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SpeechError>;

    /// Synthesize `text` and write the audio to `path`, creating parent dirs.
    async fn synthesize_to_file(&self, text: &str, path: &Path) -> Result<(), SpeechError> {
        let audio = self.synthesize(text).await?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, &audio).await?;
        debug!(path = %path.display(), bytes = audio.len(), "Speech file written");
        Ok(())
    }
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
}

/// Calls `POST {base}/v1/audio/speech`.
pub struct SpeechClient {
    base_url: String,
    api_key: String,
    model: String,
    voice: String,
    client: reqwest::Client,
}

impl SpeechClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            model: "tts-1".into(),
            voice: "alloy".into(),
            client: reqwest::Client::new(),
        }
    }

    /// Build from `[speech]` settings. Returns `None` without an API key.
    pub fn from_config(config: &deskpilot_config::SpeechConfig) -> Option<Self> {
        let key = config.api_key.as_deref().filter(|k| !k.is_empty())?;
        Some(
            Self::new(key)
                .with_base_url(&config.api_url)
                .with_voice(&config.model, &config.voice),
        )
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_voice(mut self, model: impl Into<String>, voice: impl Into<String>) -> Self {
        self.model = model.into();
        self.voice = voice.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        if let Ok(client) = reqwest::Client::builder().timeout(timeout).build() {
            self.client = client;
        }
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/audio/speech", self.base_url)
    }
}

#[async_trait]
impl Synthesizer for SpeechClient {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SpeechError> {
        let body = SpeechRequest {
            model: &self.model,
            voice: &self.voice,
            input: text,
        };

        debug!(model = %self.model, voice = %self.voice, chars = text.len(), "Requesting speech");

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| SpeechError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SpeechError::Api {
                status_code: status.as_u16(),
                message,
            });
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| SpeechError::Network(e.to_string()))?;
        Ok(audio.to_vec())
    }
}
