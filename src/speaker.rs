//! Reply output
//!
//! A [`Speaker`] voices reply text through a cloud TTS service, a local
//! speech binary, or plain console output.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::config::{Config, TtsProvider};
use crate::voice::{AudioPlayback, TextToSpeech};
use crate::{Error, Result};

/// Local speech synthesizers, in order of preference
const SPEECH_BINARIES: &[&str] = &["say", "espeak-ng", "espeak", "spd-say"];

/// Sink for spoken replies
#[async_trait(?Send)]
pub trait Speaker {
    /// Speak the text, returning once it has been played
    ///
    /// # Errors
    ///
    /// Returns error for empty text or when synthesis/playback fails
    async fn speak(&mut self, text: &str) -> Result<()>;
}

/// Build the speaker selected by the configuration
///
/// A missing local speech binary falls back to console output.
///
/// # Errors
///
/// Returns error if a cloud backend lacks its key or no output device exists
pub fn build_speaker(config: &Config) -> Result<Box<dyn Speaker>> {
    let name = config.assistant.name.clone();

    match config.voice.tts_provider {
        TtsProvider::OpenAi | TtsProvider::ElevenLabs => {
            let tts = TextToSpeech::from_config(&config.voice, &config.api_keys)?;
            let playback = AudioPlayback::new()?;
            Ok(Box::new(CloudSpeaker::new(tts, playback)))
        }
        TtsProvider::Command => match CommandSpeaker::detect(&config.voice.tts_voice) {
            Some(speaker) => Ok(Box::new(speaker)),
            None => {
                tracing::warn!(
                    candidates = ?SPEECH_BINARIES,
                    "no local speech binary found, replies will be printed"
                );
                Ok(Box::new(ConsoleSpeaker::new(name)))
            }
        },
        TtsProvider::Console => Ok(Box::new(ConsoleSpeaker::new(name))),
    }
}

fn ensure_text(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(Error::Tts("cannot speak empty text".to_string()));
    }
    Ok(())
}

/// Cloud TTS played through the default output device
pub struct CloudSpeaker {
    tts: TextToSpeech,
    playback: AudioPlayback,
}

impl CloudSpeaker {
    /// Create a cloud speaker
    #[must_use]
    pub const fn new(tts: TextToSpeech, playback: AudioPlayback) -> Self {
        Self { tts, playback }
    }
}

#[async_trait(?Send)]
impl Speaker for CloudSpeaker {
    async fn speak(&mut self, text: &str) -> Result<()> {
        ensure_text(text)?;
        let audio = self.tts.synthesize(text).await?;
        self.playback.play_mp3(&audio).await
    }
}

/// Speaks through a local binary such as macOS `say` or `espeak`
#[derive(Debug, Clone)]
pub struct CommandSpeaker {
    program: PathBuf,
    voice: Option<String>,
}

impl CommandSpeaker {
    /// Create a speaker for an explicit program
    #[must_use]
    pub const fn new(program: PathBuf, voice: Option<String>) -> Self {
        Self { program, voice }
    }

    /// Find the first available speech binary on `PATH`
    ///
    /// Cloud voice names (e.g. "nova") are not passed to local binaries.
    #[must_use]
    pub fn detect(voice: &str) -> Option<Self> {
        let program = SPEECH_BINARIES
            .iter()
            .find_map(|bin| which::which(bin).ok())?;

        let voice = if crate::voice::OPENAI_VOICES.contains(&voice) || voice.is_empty() {
            None
        } else {
            Some(voice.to_string())
        };

        tracing::debug!(program = %program.display(), ?voice, "using local speech binary");
        Some(Self::new(program, voice))
    }

    /// Arguments for one utterance
    fn args(&self, text: &str) -> Vec<String> {
        let mut args = Vec::with_capacity(3);
        if let Some(ref voice) = self.voice {
            args.push("-v".to_string());
            args.push(voice.clone());
        }
        // Keep utterances starting with '-' from being read as flags
        args.push("--".to_string());
        args.push(text.to_string());
        args
    }

    /// List voices reported by the binary (`say -v ?`, `espeak --voices`)
    ///
    /// # Errors
    ///
    /// Returns error if the binary cannot be run
    pub async fn list_voices(&self) -> Result<String> {
        let is_say = self
            .program
            .file_name()
            .is_some_and(|n| n.to_string_lossy() == "say");
        let args: &[&str] = if is_say { &["-v", "?"] } else { &["--voices"] };

        let output = tokio::process::Command::new(&self.program)
            .args(args)
            .output()
            .await?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait(?Send)]
impl Speaker for CommandSpeaker {
    async fn speak(&mut self, text: &str) -> Result<()> {
        ensure_text(text)?;

        let status = tokio::process::Command::new(&self.program)
            .args(self.args(text))
            .status()
            .await?;

        if !status.success() {
            return Err(Error::Tts(format!(
                "{} exited with {status}",
                self.program.display()
            )));
        }
        Ok(())
    }
}

/// Prints replies instead of speaking them
#[derive(Debug, Clone)]
pub struct ConsoleSpeaker {
    name: String,
}

impl ConsoleSpeaker {
    /// Create a console speaker labelled with the assistant's name
    #[must_use]
    pub const fn new(name: String) -> Self {
        Self { name }
    }
}

#[async_trait(?Send)]
impl Speaker for ConsoleSpeaker {
    async fn speak(&mut self, text: &str) -> Result<()> {
        ensure_text(text)?;
        println!("{}: {text}", self.name);
        Ok(())
    }
}
