//! Error types for Astra

use thiserror::Error;

/// Result type alias for Astra operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Astra
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Audio device or decoding error
    #[error("audio error: {0}")]
    Audio(String),

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Alarm scheduling or ringing error
    #[error("alarm error: {0}")]
    Alarm(String),

    /// Browser or file opener failure
    #[error("launch error: {0}")]
    Launch(String),

    /// Lookup matched a disambiguation page
    #[error("ambiguous lookup: {0}")]
    Disambiguation(String),

    /// Resource not found (file, Wikipedia page)
    #[error("not found: {0}")]
    NotFound(String),

    /// Chat completion error
    #[error("chat error: {0}")]
    Chat(String),

    /// Input stream ended (stdin closed)
    #[error("input closed")]
    InputClosed,

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
