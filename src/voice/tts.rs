//! Text-to-speech (TTS) processing

use serde::Deserialize;

use crate::config::{ApiKeys, TtsProvider, VoiceConfig};
use crate::{Error, Result};

/// Built-in `OpenAI` voices
pub const OPENAI_VOICES: &[&str] = &["alloy", "echo", "fable", "onyx", "nova", "shimmer"];

/// Cloud TTS backend
#[derive(Clone, Copy, Debug)]
enum CloudProvider {
    OpenAi,
    ElevenLabs,
}

/// A voice offered by a TTS backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceInfo {
    /// Identifier passed back as `tts_voice`
    pub id: String,
    /// Human-readable name
    pub name: String,
}

#[derive(Deserialize)]
struct ElevenLabsVoices {
    voices: Vec<ElevenLabsVoice>,
}

#[derive(Deserialize)]
struct ElevenLabsVoice {
    voice_id: String,
    name: String,
}

/// Synthesizes speech from text via a cloud API
pub struct TextToSpeech {
    client: reqwest::Client,
    api_key: String,
    voice: String,
    speed: f32,
    model: String,
    provider: CloudProvider,
}

impl TextToSpeech {
    /// Create the cloud synthesizer selected by the voice configuration
    ///
    /// # Errors
    ///
    /// Returns error if the provider is not a cloud backend or its key is missing
    pub fn from_config(voice: &VoiceConfig, keys: &ApiKeys) -> Result<Self> {
        match voice.tts_provider {
            TtsProvider::OpenAi => Self::new_openai(
                keys.openai.clone().unwrap_or_default(),
                voice.tts_voice.clone(),
                voice.tts_speed,
                voice.tts_model.clone(),
            ),
            TtsProvider::ElevenLabs => Self::new_elevenlabs(
                keys.elevenlabs.clone().unwrap_or_default(),
                voice.tts_voice.clone(),
                voice.tts_model.clone(),
            ),
            other => Err(Error::Config(format!("{other} is not a cloud TTS provider"))),
        }
    }

    /// Create a new TTS instance using `OpenAI`
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new_openai(api_key: String, voice: String, speed: f32, model: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("OPENAI_API_KEY required for TTS".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            voice,
            speed,
            model,
            provider: CloudProvider::OpenAi,
        })
    }

    /// Create a new TTS instance using `ElevenLabs`
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new_elevenlabs(api_key: String, voice_id: String, model: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "ELEVENLABS_API_KEY required for TTS".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            voice: voice_id,
            speed: 1.0,
            model,
            provider: CloudProvider::ElevenLabs,
        })
    }

    /// Synthesize text to MP3 audio bytes
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        tracing::debug!(chars = text.len(), provider = ?self.provider, "synthesizing speech");
        match self.provider {
            CloudProvider::OpenAi => self.synthesize_openai(text).await,
            CloudProvider::ElevenLabs => self.synthesize_elevenlabs(text).await,
        }
    }

    /// List the voices the backend offers
    ///
    /// # Errors
    ///
    /// Returns error if the voice listing request fails
    pub async fn list_voices(&self) -> Result<Vec<VoiceInfo>> {
        match self.provider {
            CloudProvider::OpenAi => Ok(OPENAI_VOICES
                .iter()
                .map(|v| VoiceInfo {
                    id: (*v).to_string(),
                    name: (*v).to_string(),
                })
                .collect()),
            CloudProvider::ElevenLabs => {
                let response = self
                    .client
                    .get("https://api.elevenlabs.io/v1/voices")
                    .header("xi-api-key", &self.api_key)
                    .send()
                    .await?
                    .error_for_status()?;

                let voices: ElevenLabsVoices = response.json().await?;
                Ok(voices
                    .voices
                    .into_iter()
                    .map(|v| VoiceInfo {
                        id: v.voice_id,
                        name: v.name,
                    })
                    .collect())
            }
        }
    }

    /// Synthesize using `OpenAI` TTS
    async fn synthesize_openai(&self, text: &str) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct TtsRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f32,
            response_format: &'a str,
        }

        let request = TtsRequest {
            model: &self.model,
            input: text,
            voice: &self.voice,
            speed: self.speed,
            response_format: "mp3",
        };

        let response = self
            .client
            .post("https://api.openai.com/v1/audio/speech")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("OpenAI TTS error {status}: {body}")));
        }

        Ok(response.bytes().await?.to_vec())
    }

    /// Synthesize using `ElevenLabs` TTS
    async fn synthesize_elevenlabs(&self, text: &str) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct ElevenLabsRequest<'a> {
            text: &'a str,
            model_id: &'a str,
        }

        let url = format!("https://api.elevenlabs.io/v1/text-to-speech/{}", self.voice);

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .header("Accept", "audio/mpeg")
            .json(&ElevenLabsRequest {
                text,
                model_id: &self.model,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("ElevenLabs TTS error {status}: {body}")));
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_openai_voices_listed_offline() {
        let tts = TextToSpeech::new_openai(
            "sk-test".to_string(),
            "nova".to_string(),
            1.0,
            "tts-1".to_string(),
        )
        .unwrap();

        let voices = tts.list_voices().await.unwrap();
        assert_eq!(voices.len(), OPENAI_VOICES.len());
        assert!(voices.iter().any(|v| v.id == "nova"));
    }

    #[test]
    fn test_missing_key_rejected() {
        assert!(
            TextToSpeech::new_elevenlabs(String::new(), "voice".to_string(), "m".to_string())
                .is_err()
        );
    }
}
