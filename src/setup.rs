//! Interactive first-run setup wizard (`astra setup`)

use std::path::PathBuf;

use dialoguer::{Confirm, Input, Select};

use crate::config::file::{
    AlarmFileConfig, AssistantFileConfig, VoiceFileConfig, config_file_path, load_config_file,
    write_config_file,
};
use crate::config::DEFAULT_NAME;
use crate::voice::OPENAI_VOICES;
use crate::wake::DEFAULT_WAKE_PHRASES;

const TTS_PROVIDERS: [&str; 4] = ["openai", "elevenlabs", "command", "console"];
const STT_PROVIDERS: [&str; 2] = ["whisper", "deepgram"];

/// Run the interactive setup wizard
///
/// # Errors
///
/// Returns error if user input fails or config cannot be written
pub fn run_setup() -> anyhow::Result<()> {
    println!("Astra Setup\n");

    let mut config = load_config_file();
    let config_path =
        config_file_path().unwrap_or_else(|| PathBuf::from("~/.config/astra/config.toml"));

    if config_path.exists() {
        println!("Existing config found at {}\n", config_path.display());
        let update = Confirm::new()
            .with_prompt("Update it?")
            .default(true)
            .interact()?;
        if !update {
            return Ok(());
        }
    }

    // 1. Identity
    let name: String = Input::new()
        .with_prompt("Assistant name")
        .default(
            config
                .assistant
                .name
                .clone()
                .unwrap_or_else(|| DEFAULT_NAME.to_string()),
        )
        .interact_text()?;

    let default_phrases = config.assistant.wake_phrases.clone().unwrap_or_else(|| {
        if name.eq_ignore_ascii_case(DEFAULT_NAME) {
            DEFAULT_WAKE_PHRASES.iter().map(ToString::to_string).collect()
        } else {
            let lower = name.to_lowercase();
            vec![format!("hey {lower}"), lower]
        }
    });
    let phrases: String = Input::new()
        .with_prompt("Wake phrases (comma separated)")
        .default(default_phrases.join(", "))
        .interact_text()?;

    config.assistant = AssistantFileConfig {
        name: Some(name),
        wake_phrases: Some(
            phrases
                .split(',')
                .map(|p| p.trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        ),
    };

    // 2. Chat fallback
    config.api_keys.deepseek = prompt_key("DeepSeek", "DEEPSEEK_API_KEY", config.api_keys.deepseek)?;

    // 3. Speech output
    let default_tts = config
        .voice
        .tts_provider
        .as_deref()
        .and_then(|p| TTS_PROVIDERS.iter().position(|&l| l.eq_ignore_ascii_case(p)))
        .unwrap_or(0);
    let tts_idx = Select::new()
        .with_prompt("Speech output")
        .items(&TTS_PROVIDERS)
        .default(default_tts)
        .interact()?;
    let tts_provider = TTS_PROVIDERS[tts_idx];

    let tts_voice = match tts_provider {
        "openai" => {
            config.api_keys.openai = prompt_key("OpenAI", "OPENAI_API_KEY", config.api_keys.openai)?;
            let current = config
                .voice
                .tts_voice
                .as_deref()
                .and_then(|v| OPENAI_VOICES.iter().position(|&o| o == v))
                .unwrap_or(4);
            let idx = Select::new()
                .with_prompt("Voice")
                .items(OPENAI_VOICES)
                .default(current)
                .interact()?;
            Some(OPENAI_VOICES[idx].to_string())
        }
        "elevenlabs" => {
            config.api_keys.elevenlabs =
                prompt_key("ElevenLabs", "ELEVENLABS_API_KEY", config.api_keys.elevenlabs)?;
            let voice: String = Input::new()
                .with_prompt("ElevenLabs voice id (see `astra voices`)")
                .default(config.voice.tts_voice.clone().unwrap_or_default())
                .interact_text()?;
            Some(voice)
        }
        _ => config.voice.tts_voice.clone(),
    };

    // 4. Speech recognition
    let default_stt = config
        .voice
        .stt_provider
        .as_deref()
        .and_then(|p| STT_PROVIDERS.iter().position(|&l| l.eq_ignore_ascii_case(p)))
        .unwrap_or(0);
    let stt_idx = Select::new()
        .with_prompt("Speech recognition")
        .items(&STT_PROVIDERS)
        .default(default_stt)
        .interact()?;
    let stt_provider = STT_PROVIDERS[stt_idx];

    match stt_provider {
        "deepgram" => {
            config.api_keys.deepgram =
                prompt_key("Deepgram", "DEEPGRAM_API_KEY", config.api_keys.deepgram)?;
        }
        _ if config.api_keys.openai.is_none() => {
            config.api_keys.openai = prompt_key("OpenAI", "OPENAI_API_KEY", None)?;
        }
        _ => {}
    }

    config.voice = VoiceFileConfig {
        stt_provider: Some(stt_provider.to_string()),
        tts_provider: Some(tts_provider.to_string()),
        tts_voice,
        ..config.voice
    };

    // 5. Alarm sound
    let sound: String = Input::new()
        .with_prompt("Alarm sound file (mp3 or wav)")
        .default(
            config
                .alarm
                .sound
                .clone()
                .unwrap_or_else(|| "alarm.mp3".to_string()),
        )
        .interact_text()?;
    config.alarm = AlarmFileConfig {
        sound: Some(sound),
        ..config.alarm
    };

    write_config_file(&config_path, &config)?;
    println!("\nConfig written to {}", config_path.display());

    println!("\nSetup complete! Run `astra -v` to start, or `astra --console` to type instead.");

    Ok(())
}

/// Ask for an API key, keeping the current one on blank input
fn prompt_key(
    service: &str,
    env_hint: &str,
    existing: Option<String>,
) -> anyhow::Result<Option<String>> {
    let prompt = existing.as_deref().map_or_else(
        || format!("{service} API key ({env_hint}, leave blank to skip)"),
        |k| format!("{service} API key (current: {}, leave blank to keep)", mask_key(k)),
    );

    let input: String = Input::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()?;

    let input = input.trim();
    Ok(if input.is_empty() {
        existing
    } else {
        Some(input.to_string())
    })
}

/// Show only the ends of a key
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    } else {
        "****".to_string()
    }
}
