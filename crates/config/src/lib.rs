//! Configuration loading, validation, and management for deskpilot.
//!
//! Loads configuration from `~/.deskpilot/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.deskpilot/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Model API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// API provider: "anthropic", "bedrock" or "vertex"
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model override; each provider has its own default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Max tokens per model response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Appended to the built-in system prompt
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub system_prompt_suffix: String,

    /// Replace the built-in system prompt entirely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt_override: Option<String>,

    /// HTTP timeout for model requests. Unset means no timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,

    #[serde(default)]
    pub bedrock: BedrockConfig,

    #[serde(default)]
    pub vertex: VertexConfig,

    #[serde(default)]
    pub agent: AgentConfig,

    #[serde(default)]
    pub computer: ComputerConfig,

    #[serde(default)]
    pub queue: QueueConfig,

    #[serde(default)]
    pub speech: SpeechConfig,

    #[serde(default)]
    pub transcript: TranscriptConfig,

    #[serde(default)]
    pub windows: WindowsConfig,
}

fn default_provider() -> String {
    "anthropic".into()
}
fn default_max_tokens() -> u32 {
    4096
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("system_prompt_suffix", &self.system_prompt_suffix)
            .field("system_prompt_override", &self.system_prompt_override)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("bedrock", &self.bedrock)
            .field("vertex", &self.vertex)
            .field("agent", &self.agent)
            .field("computer", &self.computer)
            .field("queue", &self.queue)
            .field("speech", &self.speech)
            .field("transcript", &self.transcript)
            .field("windows", &self.windows)
            .finish()
    }
}

/// Amazon Bedrock settings. Requests are signed with these AWS credentials.
#[derive(Clone, Serialize, Deserialize)]
pub struct BedrockConfig {
    #[serde(default = "default_bedrock_region")]
    pub region: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_access_key: Option<String>,

    /// Only needed for temporary credentials
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
}

fn default_bedrock_region() -> String {
    "us-east-1".into()
}

impl Default for BedrockConfig {
    fn default() -> Self {
        Self {
            region: default_bedrock_region(),
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
        }
    }
}

impl std::fmt::Debug for BedrockConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BedrockConfig")
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &redact(&self.secret_access_key))
            .field("session_token", &redact(&self.session_token))
            .finish()
    }
}

/// Google Vertex AI settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct VertexConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,

    #[serde(default = "default_vertex_region")]
    pub region: String,

    /// OAuth access token (e.g. from `gcloud auth print-access-token`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

fn default_vertex_region() -> String {
    "us-east5".into()
}

impl Default for VertexConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            region: default_vertex_region(),
            access_token: None,
        }
    }
}

impl std::fmt::Debug for VertexConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VertexConfig")
            .field("project_id", &self.project_id)
            .field("region", &self.region)
            .field("access_token", &redact(&self.access_token))
            .finish()
    }
}

/// Interaction loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Keep only this many screenshots in the request. 0 disables trimming.
    #[serde(default = "default_image_retention")]
    pub only_n_most_recent_images: usize,

    /// Images are removed in multiples of this many
    #[serde(default = "default_image_chunk_size")]
    pub image_chunk_size: usize,

    /// Stop with an error after this many model calls
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<u32>,

    /// Stop with an error once a run has taken this long
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline_secs: Option<u64>,

    /// Instruction used by `deskpilot run` when `--task` is not given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_task: Option<String>,
}

fn default_image_retention() -> usize {
    10
}
fn default_image_chunk_size() -> usize {
    10
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            only_n_most_recent_images: default_image_retention(),
            image_chunk_size: default_image_chunk_size(),
            max_iterations: None,
            deadline_secs: None,
            default_task: None,
        }
    }
}

/// Desktop control settings for the computer, bash and editor tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputerConfig {
    #[serde(default = "default_display_width")]
    pub display_width: u32,

    #[serde(default = "default_display_height")]
    pub display_height: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_number: Option<u32>,

    /// Screenshot program; called as `<cmd> -x <file>`
    #[serde(default = "default_screenshot_command")]
    pub screenshot_command: String,

    /// Mouse/keyboard program (cliclick syntax)
    #[serde(default = "default_input_command")]
    pub input_command: String,

    /// Pause between an action and its follow-up screenshot
    #[serde(default = "default_screenshot_delay_ms")]
    pub screenshot_delay_ms: u64,

    #[serde(default = "default_bash_timeout")]
    pub bash_timeout_secs: u64,
}

fn default_display_width() -> u32 {
    1280
}
fn default_display_height() -> u32 {
    800
}
fn default_screenshot_command() -> String {
    "screencapture".into()
}
fn default_input_command() -> String {
    "cliclick".into()
}
fn default_screenshot_delay_ms() -> u64 {
    2000
}
fn default_bash_timeout() -> u64 {
    120
}

impl Default for ComputerConfig {
    fn default() -> Self {
        Self {
            display_width: default_display_width(),
            display_height: default_display_height(),
            display_number: None,
            screenshot_command: default_screenshot_command(),
            input_command: default_input_command(),
            screenshot_delay_ms: default_screenshot_delay_ms(),
            bash_timeout_secs: default_bash_timeout(),
        }
    }
}

/// Task queue / mailbox storage.
#[derive(Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// "sqlite", "postgres" or "memory"
    #[serde(default = "default_queue_backend")]
    pub backend: String,

    /// Connection string for the postgres backend (e.g. a Supabase database)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,

    /// Database file for the sqlite backend. Defaults to `~/.deskpilot/queue.db`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sqlite_path: Option<String>,

    /// Mailbox recipient name of the agent
    #[serde(default = "default_recipient")]
    pub recipient: String,

    #[serde(default = "default_queue_poll")]
    pub poll_interval_secs: u64,
}

fn default_queue_backend() -> String {
    "sqlite".into()
}
fn default_recipient() -> String {
    "agent".into()
}
fn default_queue_poll() -> u64 {
    10
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            backend: default_queue_backend(),
            database_url: None,
            sqlite_path: None,
            recipient: default_recipient(),
            poll_interval_secs: default_queue_poll(),
        }
    }
}

impl std::fmt::Debug for QueueConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueConfig")
            .field("backend", &self.backend)
            .field("database_url", &redact(&self.database_url))
            .field("sqlite_path", &self.sqlite_path)
            .field("recipient", &self.recipient)
            .field("poll_interval_secs", &self.poll_interval_secs)
            .finish()
    }
}

/// Text-to-speech settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_speech_url")]
    pub api_url: String,

    #[serde(default = "default_speech_model")]
    pub model: String,

    #[serde(default = "default_voice")]
    pub voice: String,

    /// Where `speech.mp3` is written
    #[serde(default = "default_speech_dir")]
    pub output_dir: String,

    /// Audio player program; called as `<player> <file>`
    #[serde(default = "default_player")]
    pub player: String,

    #[serde(default = "default_speech_poll")]
    pub poll_interval_ms: u64,
}

fn default_speech_url() -> String {
    "https://api.openai.com".into()
}
fn default_speech_model() -> String {
    "tts-1".into()
}
fn default_voice() -> String {
    "alloy".into()
}
fn default_speech_dir() -> String {
    "speech_files".into()
}
fn default_player() -> String {
    "afplay".into()
}
fn default_speech_poll() -> u64 {
    1000
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_speech_url(),
            model: default_speech_model(),
            voice: default_voice(),
            output_dir: default_speech_dir(),
            player: default_player(),
            poll_interval_ms: default_speech_poll(),
        }
    }
}

impl std::fmt::Debug for SpeechConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("voice", &self.voice)
            .field("output_dir", &self.output_dir)
            .field("player", &self.player)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .finish()
    }
}

/// Files written by the transcript handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptConfig {
    /// Latest model text; watched by the speech loop
    #[serde(default = "default_input_file")]
    pub input_file: String,

    /// Every model text, appended
    #[serde(default = "default_log_file")]
    pub log_file: String,
}

fn default_input_file() -> String {
    "input.txt".into()
}
fn default_log_file() -> String {
    "logs.txt".into()
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            input_file: default_input_file(),
            log_file: default_log_file(),
        }
    }
}

/// macOS window management.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowsConfig {
    /// Applications left visible by `deskpilot windows hide`
    #[serde(default = "default_visible_apps")]
    pub visible_apps: Vec<String>,
}

fn default_visible_apps() -> Vec<String> {
    vec!["Brave Browser".into(), "TextEdit".into()]
}

impl Default for WindowsConfig {
    fn default() -> Self {
        Self {
            visible_apps: default_visible_apps(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.deskpilot/config.toml).
    ///
    /// Environment overrides:
    /// - `DESKPILOT_API_KEY`, then `ANTHROPIC_API_KEY`
    /// - `DESKPILOT_PROVIDER`, `DESKPILOT_MODEL`
    /// - `OPENAI_API_KEY` for speech
    /// - `DATABASE_URL`, then `SUPABASE_DB_URL` for the postgres queue
    /// - `VERTEX_PROJECT_ID`, `VERTEX_REGION`, `VERTEX_ACCESS_TOKEN`
    /// - `AWS_REGION`, `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`,
    ///   `AWS_SESSION_TOKEN` for Bedrock
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through a lookup function.
    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if self.api_key.is_none() {
            self.api_key = var("DESKPILOT_API_KEY").or_else(|| var("ANTHROPIC_API_KEY"));
        }
        if let Some(provider) = var("DESKPILOT_PROVIDER") {
            self.provider = provider;
        }
        if let Some(model) = var("DESKPILOT_MODEL") {
            self.model = Some(model);
        }
        if self.speech.api_key.is_none() {
            self.speech.api_key = var("OPENAI_API_KEY");
        }
        if self.queue.database_url.is_none() {
            self.queue.database_url = var("DATABASE_URL").or_else(|| var("SUPABASE_DB_URL"));
        }
        if let Some(project) = var("VERTEX_PROJECT_ID") {
            self.vertex.project_id = Some(project);
        }
        if let Some(region) = var("VERTEX_REGION") {
            self.vertex.region = region;
        }
        if let Some(token) = var("VERTEX_ACCESS_TOKEN") {
            self.vertex.access_token = Some(token);
        }
        if let Some(region) = var("AWS_REGION") {
            self.bedrock.region = region;
        }
        if self.bedrock.access_key_id.is_none() {
            self.bedrock.access_key_id = var("AWS_ACCESS_KEY_ID");
            self.bedrock.secret_access_key = var("AWS_SECRET_ACCESS_KEY");
            self.bedrock.session_token = var("AWS_SESSION_TOKEN");
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".deskpilot")
    }

    /// Path of the sqlite queue database.
    pub fn sqlite_path(&self) -> PathBuf {
        match &self.queue.sqlite_path {
            Some(path) => PathBuf::from(path),
            None => Self::config_dir().join("queue.db"),
        }
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_tokens == 0 {
            return Err(ConfigError::ValidationError("max_tokens must be > 0".into()));
        }
        if self.agent.image_chunk_size == 0 {
            return Err(ConfigError::ValidationError(
                "agent.image_chunk_size must be > 0".into(),
            ));
        }
        if self.agent.max_iterations == Some(0) {
            return Err(ConfigError::ValidationError(
                "agent.max_iterations must be > 0 when set".into(),
            ));
        }
        if self.queue.poll_interval_secs == 0 || self.speech.poll_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "poll intervals must be > 0".into(),
            ));
        }
        if !["sqlite", "postgres", "memory"].contains(&self.queue.backend.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "unknown queue backend '{}'",
                self.queue.backend
            )));
        }
        Ok(())
    }

    /// Check if a model API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            provider: default_provider(),
            model: None,
            max_tokens: default_max_tokens(),
            system_prompt_suffix: String::new(),
            system_prompt_override: None,
            request_timeout_secs: None,
            bedrock: BedrockConfig::default(),
            vertex: VertexConfig::default(),
            agent: AgentConfig::default(),
            computer: ComputerConfig::default(),
            queue: QueueConfig::default(),
            speech: SpeechConfig::default(),
            transcript: TranscriptConfig::default(),
            windows: WindowsConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "anthropic");
        assert_eq!(config.max_tokens, 4096);
        assert_eq!(config.agent.only_n_most_recent_images, 10);
        assert_eq!(config.agent.image_chunk_size, 10);
        assert!(config.agent.max_iterations.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.provider, config.provider);
        assert_eq!(parsed.speech.voice, "alloy");
        assert_eq!(parsed.windows.visible_apps, config.windows.visible_apps);
    }

    #[test]
    fn zero_chunk_size_rejected() {
        let mut config = AppConfig::default();
        config.agent.image_chunk_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_queue_backend_rejected() {
        let mut config = AppConfig::default();
        config.queue.backend = "redis".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("redis"));
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().provider, "anthropic");
    }

    #[test]
    fn load_from_file_with_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
provider = "vertex"
max_tokens = 2048

[agent]
only_n_most_recent_images = 3
max_iterations = 50

[vertex]
project_id = "my-project"
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.provider, "vertex");
        assert_eq!(config.max_tokens, 2048);
        assert_eq!(config.agent.only_n_most_recent_images, 3);
        assert_eq!(config.agent.image_chunk_size, 10);
        assert_eq!(config.agent.max_iterations, Some(50));
        assert_eq!(config.vertex.project_id.as_deref(), Some("my-project"));
        assert_eq!(config.vertex.region, "us-east5");
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "max_tokens = \"many\"").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn env_overrides_fill_missing_keys() {
        let env: HashMap<&str, &str> = [
            ("ANTHROPIC_API_KEY", "sk-ant-env"),
            ("DESKPILOT_MODEL", "claude-3-5-sonnet-20241022"),
            ("OPENAI_API_KEY", "sk-openai"),
            ("SUPABASE_DB_URL", "postgres://db"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.api_key.as_deref(), Some("sk-ant-env"));
        assert_eq!(config.model.as_deref(), Some("claude-3-5-sonnet-20241022"));
        assert_eq!(config.speech.api_key.as_deref(), Some("sk-openai"));
        assert_eq!(config.queue.database_url.as_deref(), Some("postgres://db"));
    }

    #[test]
    fn aws_env_fills_bedrock_credentials() {
        let env: HashMap<&str, &str> = [
            ("AWS_REGION", "eu-central-1"),
            ("AWS_ACCESS_KEY_ID", "AKIDENV"),
            ("AWS_SECRET_ACCESS_KEY", "env-secret"),
            ("AWS_SESSION_TOKEN", "env-session"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        assert_eq!(config.bedrock.region, "us-east-1");
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.bedrock.region, "eu-central-1");
        assert_eq!(config.bedrock.access_key_id.as_deref(), Some("AKIDENV"));
        assert_eq!(config.bedrock.secret_access_key.as_deref(), Some("env-secret"));
        assert_eq!(config.bedrock.session_token.as_deref(), Some("env-session"));

        // Keys from the file are kept as a pair.
        let mut config = AppConfig::default();
        config.bedrock.access_key_id = Some("AKIDFILE".into());
        config.bedrock.secret_access_key = Some("file-secret".into());
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.bedrock.access_key_id.as_deref(), Some("AKIDFILE"));
        assert_eq!(config.bedrock.secret_access_key.as_deref(), Some("file-secret"));
        assert_eq!(config.bedrock.session_token, None);
    }

    #[test]
    fn file_key_wins_over_env() {
        let mut config = AppConfig {
            api_key: Some("sk-ant-file".into()),
            ..AppConfig::default()
        };
        config.apply_env(|k| (k == "ANTHROPIC_API_KEY").then(|| "sk-ant-env".to_string()));
        assert_eq!(config.api_key.as_deref(), Some("sk-ant-file"));
    }

    #[test]
    fn debug_redacts_secrets() {
        let mut config = AppConfig {
            api_key: Some("sk-ant-super-secret".into()),
            ..AppConfig::default()
        };
        config.speech.api_key = Some("sk-openai-secret".into());
        config.queue.database_url = Some("postgres://user:hunter2@db".into());
        config.bedrock.secret_access_key = Some("aws-secret-value".into());
        config.bedrock.session_token = Some("aws-session-value".into());
        let debug = format!("{config:?}");
        assert!(!debug.contains("aws-secret-value"));
        assert!(!debug.contains("aws-session-value"));
        assert!(!debug.contains("super-secret"));
        assert!(!debug.contains("openai-secret"));
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("anthropic"));
        assert!(toml_str.contains("tts-1"));
    }
}
