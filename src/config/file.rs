//! TOML configuration file loading
//!
//! Supports `~/.config/astra/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Result;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct AstraConfigFile {
    /// Assistant identity
    #[serde(default)]
    pub assistant: AssistantFileConfig,

    /// Voice/audio configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// AI chat fallback configuration
    #[serde(default)]
    pub chat: ChatFileConfig,

    /// Web search configuration
    #[serde(default)]
    pub search: SearchFileConfig,

    /// Wikipedia lookup configuration
    #[serde(default)]
    pub wikipedia: WikipediaFileConfig,

    /// Alarm configuration
    #[serde(default)]
    pub alarm: AlarmFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,
}

/// Assistant identity
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct AssistantFileConfig {
    /// Name used in the greeting (e.g. "Astra")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Phrases that wake the assistant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wake_phrases: Option<Vec<String>>,
}

/// Voice processing configuration
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct VoiceFileConfig {
    /// STT backend ("whisper" or "deepgram")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stt_provider: Option<String>,

    /// STT model (e.g. "whisper-1")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stt_model: Option<String>,

    /// TTS backend ("openai", "elevenlabs", "command", "console")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tts_provider: Option<String>,

    /// TTS model (e.g. "tts-1")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tts_model: Option<String>,

    /// TTS voice identifier (e.g. "nova")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tts_voice: Option<String>,

    /// TTS speed multiplier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tts_speed: Option<f32>,
}

/// Chat completion endpoint configuration
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ChatFileConfig {
    /// `OpenAI`-compatible chat completions URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Model identifier (e.g. "deepseek-chat")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Request timeout in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Web search configuration
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SearchFileConfig {
    /// URL template with a `{query}` placeholder
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_template: Option<String>,
}

/// Wikipedia configuration
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct WikipediaFileConfig {
    /// Language subdomain (e.g. "en")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Action API endpoint, overriding the one derived from `language`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Number of summary sentences to speak (1-10)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentences: Option<usize>,
}

/// Alarm configuration
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct AlarmFileConfig {
    /// Path to the alarm sound (MP3)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,

    /// Seconds between clock checks (1-30)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_secs: Option<u64>,

    /// Maximum number of rings before the alarm gives up
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_rings: Option<u32>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ApiKeysFileConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deepseek: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openai: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elevenlabs: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deepgram: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `AstraConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> AstraConfigFile {
    let Some(path) = config_file_path() else {
        return AstraConfigFile::default();
    };

    if !path.exists() {
        return AstraConfigFile::default();
    }

    match read_config_file(&path) {
        Ok(config) => {
            tracing::info!(path = %path.display(), "loaded config file");
            config
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to load config file, using defaults"
            );
            AstraConfigFile::default()
        }
    }
}

/// Read and parse a config file at an explicit path
///
/// # Errors
///
/// Returns error if the file cannot be read or is not valid TOML
pub fn read_config_file(path: &Path) -> Result<AstraConfigFile> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Serialize and write a config file, creating parent directories
///
/// # Errors
///
/// Returns error if serialization or the write fails
pub fn write_config_file(path: &Path, config: &AstraConfigFile) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let toml = toml::to_string_pretty(config)
        .map_err(|e| crate::Error::Config(format!("failed to serialize config: {e}")))?;
    std::fs::write(path, toml)?;

    Ok(())
}

/// Return the config file path: `~/.config/astra/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("astra").join("config.toml"))
}
