//! Configuration management for Astra
//!
//! Values are layered: built-in defaults, then the TOML config file, then
//! environment variables (including a `.env` file loaded by the binary).

pub mod file;

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::wake::DEFAULT_WAKE_PHRASES;
use crate::{Error, Result};

use file::AstraConfigFile;

/// Default assistant name
pub const DEFAULT_NAME: &str = "Astra";

/// Default chat completions endpoint
pub const DEFAULT_CHAT_URL: &str = "https://api.deepseek.com/v1/chat/completions";

/// Default search URL template
pub const DEFAULT_SEARCH_TEMPLATE: &str = "https://www.google.com/search?q={query}";

/// Longest alarm poll interval that cannot skip a whole minute
const MAX_POLL_SECS: u64 = 30;

/// Astra configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Assistant identity and wake phrases
    pub assistant: AssistantConfig,

    /// Voice configuration
    pub voice: VoiceConfig,

    /// AI chat fallback configuration
    pub chat: ChatConfig,

    /// Search URL template with a `{query}` placeholder
    pub search_url_template: String,

    /// Wikipedia configuration
    pub wikipedia: WikipediaConfig,

    /// Alarm configuration
    pub alarm: AlarmConfig,

    /// API keys
    pub api_keys: ApiKeys,
}

/// Assistant identity
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// Name spoken in the greeting
    pub name: String,

    /// Phrases that wake the assistant
    pub wake_phrases: Vec<String>,
}

/// Speech-to-text backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SttProvider {
    /// `OpenAI` Whisper
    Whisper,
    /// Deepgram
    Deepgram,
}

impl FromStr for SttProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "whisper" | "openai" => Ok(Self::Whisper),
            "deepgram" => Ok(Self::Deepgram),
            other => Err(Error::Config(format!("unknown STT provider: {other}"))),
        }
    }
}

/// Text-to-speech backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtsProvider {
    /// `OpenAI` speech API
    OpenAi,
    /// `ElevenLabs` speech API
    ElevenLabs,
    /// Local `say`/`espeak` binary
    Command,
    /// Print replies to stdout
    Console,
}

impl FromStr for TtsProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "elevenlabs" => Ok(Self::ElevenLabs),
            "command" | "local" => Ok(Self::Command),
            "console" | "text" => Ok(Self::Console),
            other => Err(Error::Config(format!("unknown TTS provider: {other}"))),
        }
    }
}

impl std::fmt::Display for TtsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenAi => write!(f, "openai"),
            Self::ElevenLabs => write!(f, "elevenlabs"),
            Self::Command => write!(f, "command"),
            Self::Console => write!(f, "console"),
        }
    }
}

/// Voice processing configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// STT backend
    pub stt_provider: SttProvider,

    /// STT model (e.g. "whisper-1", "nova-2")
    pub stt_model: String,

    /// TTS backend
    pub tts_provider: TtsProvider,

    /// TTS model (e.g. "tts-1")
    pub tts_model: String,

    /// TTS voice identifier
    pub tts_voice: String,

    /// TTS speed multiplier (0.25 to 4.0)
    pub tts_speed: f32,
}

/// AI chat configuration
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// `OpenAI`-compatible chat completions URL
    pub api_url: String,

    /// Model identifier
    pub model: String,

    /// Request timeout
    pub timeout: Duration,
}

/// Wikipedia configuration
#[derive(Debug, Clone)]
pub struct WikipediaConfig {
    /// Language subdomain
    pub language: String,

    /// MediaWiki action API endpoint
    pub api_url: String,

    /// Summary sentences to keep (1-10, the extracts API limit)
    pub sentences: usize,
}

/// Alarm configuration
#[derive(Debug, Clone)]
pub struct AlarmConfig {
    /// Sound file played when the alarm rings
    pub sound: PathBuf,

    /// Interval between clock checks
    pub poll_interval: Duration,

    /// Rings before the alarm finishes on its own
    pub max_rings: u32,
}

/// API keys for external services
#[derive(Clone, Default)]
pub struct ApiKeys {
    /// `DeepSeek` (or compatible) chat key
    pub deepseek: Option<String>,

    /// `OpenAI` key (Whisper and TTS)
    pub openai: Option<String>,

    /// `ElevenLabs` key (optional TTS)
    pub elevenlabs: Option<String>,

    /// `Deepgram` key (optional STT)
    pub deepgram: Option<String>,
}

impl std::fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |k: &Option<String>| k.as_ref().map(|_| "***");
        f.debug_struct("ApiKeys")
            .field("deepseek", &mask(&self.deepseek))
            .field("openai", &mask(&self.openai))
            .field("elevenlabs", &mask(&self.elevenlabs))
            .field("deepgram", &mask(&self.deepgram))
            .finish()
    }
}

impl Config {
    /// Load configuration from the config file and process environment
    ///
    /// # Errors
    ///
    /// Returns error if a configured value is invalid
    pub fn load() -> Result<Self> {
        Self::from_sources(file::load_config_file(), |key| std::env::var(key).ok())
    }

    /// Build configuration from a parsed config file and an environment lookup
    ///
    /// Environment values win over file values, which win over defaults.
    ///
    /// # Errors
    ///
    /// Returns error if a configured value is invalid
    pub fn from_sources<F>(file: AstraConfigFile, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| non_blank(env(key));

        let api_keys = ApiKeys {
            deepseek: env("DEEPSEEK_API_KEY")
                .or_else(|| env("API_KEY"))
                .or_else(|| non_blank(file.api_keys.deepseek)),
            openai: env("OPENAI_API_KEY").or_else(|| non_blank(file.api_keys.openai)),
            elevenlabs: env("ELEVENLABS_API_KEY").or_else(|| non_blank(file.api_keys.elevenlabs)),
            deepgram: env("DEEPGRAM_API_KEY").or_else(|| non_blank(file.api_keys.deepgram)),
        };

        let wake_phrases = env("ASTRA_WAKE_PHRASES")
            .map(|s| s.split(',').map(|p| p.trim().to_string()).collect::<Vec<_>>())
            .or(file.assistant.wake_phrases)
            .unwrap_or_else(|| DEFAULT_WAKE_PHRASES.iter().map(ToString::to_string).collect());
        if wake_phrases.iter().all(|p| p.trim().is_empty()) {
            return Err(Error::Config("at least one wake phrase is required".to_string()));
        }

        let assistant = AssistantConfig {
            name: env("ASTRA_NAME")
                .or(file.assistant.name)
                .unwrap_or_else(|| DEFAULT_NAME.to_string()),
            wake_phrases,
        };

        let stt_provider = env("ASTRA_STT_PROVIDER")
            .or(file.voice.stt_provider)
            .map_or(Ok(SttProvider::Whisper), |s| s.parse())?;

        // Cloud voice when an OpenAI key is present, local speech otherwise
        let tts_provider = match env("ASTRA_TTS_PROVIDER").or(file.voice.tts_provider) {
            Some(s) => s.parse()?,
            None if api_keys.openai.is_some() => TtsProvider::OpenAi,
            None => TtsProvider::Command,
        };

        let tts_speed = match env("ASTRA_TTS_SPEED") {
            Some(s) => s
                .parse::<f32>()
                .map_err(|e| Error::Config(format!("invalid ASTRA_TTS_SPEED: {e}")))?,
            None => file.voice.tts_speed.unwrap_or(1.0),
        };
        if !(0.25..=4.0).contains(&tts_speed) {
            return Err(Error::Config(format!(
                "tts speed must be between 0.25 and 4.0, got {tts_speed}"
            )));
        }

        let default_stt_model = match stt_provider {
            SttProvider::Whisper => "whisper-1",
            SttProvider::Deepgram => "nova-2",
        };
        let default_tts_model = match tts_provider {
            TtsProvider::ElevenLabs => "eleven_monolingual_v1",
            _ => "tts-1",
        };

        let voice = VoiceConfig {
            stt_provider,
            stt_model: env("ASTRA_STT_MODEL")
                .or(file.voice.stt_model)
                .unwrap_or_else(|| default_stt_model.to_string()),
            tts_provider,
            tts_model: env("ASTRA_TTS_MODEL")
                .or(file.voice.tts_model)
                .unwrap_or_else(|| default_tts_model.to_string()),
            tts_voice: env("ASTRA_TTS_VOICE")
                .or(file.voice.tts_voice)
                .unwrap_or_else(|| "nova".to_string()),
            tts_speed,
        };

        let chat_timeout = file.chat.timeout_secs.unwrap_or(10);
        if chat_timeout == 0 {
            return Err(Error::Config("chat timeout must be at least 1 second".to_string()));
        }

        let chat = ChatConfig {
            api_url: env("ASTRA_CHAT_URL")
                .or(file.chat.api_url)
                .unwrap_or_else(|| DEFAULT_CHAT_URL.to_string()),
            model: env("ASTRA_CHAT_MODEL")
                .or(file.chat.model)
                .unwrap_or_else(|| "deepseek-chat".to_string()),
            timeout: Duration::from_secs(chat_timeout),
        };

        let search_url_template = env("ASTRA_SEARCH_URL")
            .or(file.search.url_template)
            .unwrap_or_else(|| DEFAULT_SEARCH_TEMPLATE.to_string());
        if !search_url_template.contains("{query}") {
            return Err(Error::Config(
                "search url template must contain {query}".to_string(),
            ));
        }

        let language = env("ASTRA_WIKIPEDIA_LANG")
            .or(file.wikipedia.language)
            .unwrap_or_else(|| "en".to_string());
        let wikipedia = WikipediaConfig {
            api_url: env("ASTRA_WIKIPEDIA_URL")
                .or(file.wikipedia.api_url)
                .unwrap_or_else(|| format!("https://{language}.wikipedia.org/w/api.php")),
            language,
            sentences: file.wikipedia.sentences.unwrap_or(2).clamp(1, 10),
        };

        let poll_secs = match env("ASTRA_ALARM_POLL_SECS") {
            Some(s) => s
                .parse::<u64>()
                .map_err(|e| Error::Config(format!("invalid ASTRA_ALARM_POLL_SECS: {e}")))?,
            None => file.alarm.poll_secs.unwrap_or(10),
        };
        // Two checks must always land inside the target minute
        if !(1..=MAX_POLL_SECS).contains(&poll_secs) {
            return Err(Error::Config(format!(
                "alarm poll interval must be 1-{MAX_POLL_SECS} seconds, got {poll_secs}"
            )));
        }

        let alarm = AlarmConfig {
            sound: env("ASTRA_ALARM_SOUND")
                .or(file.alarm.sound)
                .map_or_else(|| PathBuf::from("alarm.mp3"), PathBuf::from),
            poll_interval: Duration::from_secs(poll_secs),
            max_rings: file.alarm.max_rings.unwrap_or(6).max(1),
        };

        Ok(Self {
            assistant,
            voice,
            chat,
            search_url_template,
            wikipedia,
            alarm,
            api_keys,
        })
    }

    /// Rename the assistant
    ///
    /// Default wake phrases follow the new name; custom ones are kept.
    pub fn rename(&mut self, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            return;
        }

        let defaults = self
            .assistant
            .wake_phrases
            .iter()
            .map(String::as_str)
            .eq(DEFAULT_WAKE_PHRASES.iter().copied());
        if defaults {
            let lower = name.to_lowercase();
            self.assistant.wake_phrases = DEFAULT_WAKE_PHRASES
                .iter()
                .map(|p| p.replace("astra", &lower))
                .collect();
        }

        self.assistant.name = name.to_string();
    }
}

/// Treat empty or whitespace-only values as unset
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
