use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use astra::alarm::AlarmClock;
use astra::config::TtsProvider;
use astra::handlers::{Opener, PrintOpener, SystemOpener};
use astra::listener::{ConsoleListener, Listener, VoiceListener};
use astra::speaker::{CommandSpeaker, Speaker, build_speaker};
use astra::voice::{AudioCapture, AudioPlayback, PLAYBACK_SAMPLE_RATE, SpeechToText, TextToSpeech, rms};
use astra::{Assistant, Config, Handlers, WakePhrases};

/// Sentence spoken when trying out a voice
const VOICE_SAMPLE: &str = "Hello, I am using a different voice now!";

/// Astra - a voice-activated personal assistant
#[derive(Parser)]
#[command(name = "astra", version, about)]
struct Cli {
    /// Type commands and read replies instead of using the microphone
    #[arg(long)]
    console: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Assistant name (default wake phrases follow it)
    #[arg(long)]
    name: Option<String>,

    /// Speech output backend: openai, elevenlabs, command or console
    #[arg(long)]
    speaker: Option<TtsProvider>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
#[allow(clippy::enum_variant_names)]
enum Command {
    /// Run a single command without the wake phrase
    Ask {
        /// Command text, e.g. "what time is it"
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// List voices of the configured speech backend
    Voices {
        /// Speak a sample sentence with this voice
        #[arg(long = "try", value_name = "VOICE")]
        try_voice: Option<String>,
    },
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test speaker output
    TestSpeaker,
    /// Test TTS output
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
    },
    /// Interactive first-run setup
    Setup,
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info,astra=info",
        1 => "info,astra=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    if matches!(cli.command, Some(Command::Setup)) {
        return astra::setup::run_setup();
    }

    let mut config = Config::load()?;
    if let Some(ref name) = cli.name {
        config.rename(name);
    }
    if let Some(speaker) = cli.speaker {
        config.voice.tts_provider = speaker;
    } else if cli.console {
        config.voice.tts_provider = TtsProvider::Console;
    }
    tracing::debug!(?config, "loaded configuration");

    if let Some(cmd) = cli.command {
        return match cmd {
            Command::Ask { text } => ask(&config, &text.join(" ")).await,
            Command::Voices { try_voice } => voices(config, try_voice).await,
            Command::TestMic { duration } => test_mic(duration).await,
            Command::TestSpeaker => test_speaker().await,
            Command::TestTts { text } => test_tts(&config, &text).await,
            Command::Setup => astra::setup::run_setup(),
        };
    }

    run_assistant(&config, cli.console).await
}

/// Run the interactive session until exit, end of input or Ctrl-C
#[allow(clippy::future_not_send)]
async fn run_assistant(config: &Config, console: bool) -> anyhow::Result<()> {
    let alarm = AlarmClock::system(&config.alarm);
    let handlers = Handlers::from_config(config, opener(), alarm.clone())?;

    let listener: Box<dyn Listener> = if console {
        Box::new(ConsoleListener::stdin())
    } else {
        let stt = SpeechToText::from_config(&config.voice, &config.api_keys)?;
        let capture = AudioCapture::new()?;
        alarm.enable_console_prompt();
        Box::new(VoiceListener::new(capture, stt))
    };
    let speaker = build_speaker(config)?;

    let wake = WakePhrases::new(&config.assistant.wake_phrases);
    let mut assistant = Assistant::new(
        config.assistant.name.clone(),
        listener,
        speaker,
        handlers,
        wake,
    );

    tracing::info!(
        console,
        speaker = %config.voice.tts_provider,
        "astra ready - say \"{}\"",
        config.assistant.wake_phrases.first().map_or("", String::as_str)
    );

    tokio::select! {
        result = assistant.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            if alarm.cancel() {
                tracing::debug!("alarm cancelled");
            }
            tracing::info!("interrupted, shutting down");
        }
    }

    Ok(())
}

/// Desktop opener, or printing when no opener binary exists
fn opener() -> Arc<dyn Opener> {
    match SystemOpener::detect() {
        Ok(opener) => Arc::new(opener),
        Err(e) => {
            tracing::warn!(error = %e, "no desktop opener, links will be printed");
            Arc::new(PrintOpener)
        }
    }
}

/// Dispatch one command and speak the reply
#[allow(clippy::future_not_send)]
async fn ask(config: &Config, text: &str) -> anyhow::Result<()> {
    let alarm = AlarmClock::system(&config.alarm);
    let handlers = Handlers::from_config(config, opener(), alarm.clone())?;

    let query = text.trim().to_lowercase();
    let command = astra::Command::parse(&query);
    tracing::debug!(command = command.name(), "dispatching");

    let reply = handlers.handle(command).await;
    let mut speaker = build_speaker(config)?;
    speaker.speak(&reply).await?;

    if let Some(time) = alarm.active() {
        println!(
            "Alarm armed for {} (Ctrl-C to cancel)",
            time.format("%H:%M")
        );
        tokio::select! {
            () = wait_for_alarm(&alarm) => {}
            _ = tokio::signal::ctrl_c() => {
                if alarm.cancel() {
                    println!("Alarm cancelled.");
                }
            }
        }
    }

    Ok(())
}

/// Wait until the alarm has rung out or been cancelled
async fn wait_for_alarm(alarm: &AlarmClock) {
    while alarm.active().is_some() {
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
}

/// List voices, optionally speaking a sample with one of them
#[allow(clippy::future_not_send)]
async fn voices(mut config: Config, try_voice: Option<String>) -> anyhow::Result<()> {
    match config.voice.tts_provider {
        TtsProvider::OpenAi | TtsProvider::ElevenLabs => {
            let tts = TextToSpeech::from_config(&config.voice, &config.api_keys)?;
            for voice in tts.list_voices().await? {
                println!("{:<24} {}", voice.id, voice.name);
            }
        }
        TtsProvider::Command => {
            let speaker = CommandSpeaker::detect("")
                .ok_or_else(|| anyhow::anyhow!("no say/espeak binary found on PATH"))?;
            print!("{}", speaker.list_voices().await?);
        }
        TtsProvider::Console => {
            println!("The console backend prints replies and has no voices.");
            return Ok(());
        }
    }

    if let Some(voice) = try_voice {
        println!("\nTrying voice {voice}...");
        config.voice.tts_voice = voice;
        let mut speaker = build_speaker(&config)?;
        speaker.speak(VOICE_SAMPLE).await?;
    }

    Ok(())
}

/// Test microphone input
#[allow(clippy::future_not_send)]
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let mut capture = AudioCapture::new()?;
    capture.start()?;

    let sample_rate = capture.sample_rate();
    println!("Sample rate: {sample_rate} Hz");
    println!("---");

    for i in 0..duration {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let samples = capture.peek_buffer();
        let energy = rms(&samples);
        let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let meter_len = (energy * 100.0).min(50.0) as usize;
        let meter: String = "#".repeat(meter_len) + &" ".repeat(50 - meter_len);

        println!(
            "[{:2}s] RMS: {:.4} | Peak: {:.4} | [{}]",
            i + 1,
            energy,
            peak,
            meter
        );

        capture.clear_buffer();
    }

    capture.stop();

    println!("\n---");
    println!("If you saw movement in the meter, your mic is working!");
    println!("If RMS stayed near 0, check:");
    println!("  1. Is your mic plugged in?");
    println!("  2. Run: arecord -l (to list devices)");
    println!("  3. Try: pavucontrol (to check levels)");

    Ok(())
}

/// Test speaker output with a sine wave
#[allow(clippy::future_not_send)]
async fn test_speaker() -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let mut playback = AudioPlayback::new()?;

    let frequency = 440.0_f32;
    let num_samples = PLAYBACK_SAMPLE_RATE as usize * 2;

    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..num_samples)
        .map(|i| {
            let t = i as f32 / PLAYBACK_SAMPLE_RATE as f32;
            (2.0 * std::f32::consts::PI * frequency * t).sin() * 0.3
        })
        .collect();

    println!(
        "Playing {} samples at {} Hz...",
        samples.len(),
        PLAYBACK_SAMPLE_RATE
    );
    playback.play(samples).await?;

    println!("\n---");
    println!("If you heard the tone, your speakers are working!");
    println!("If you didn't hear anything, check:");
    println!("  1. Run: pactl list sinks short");
    println!("  2. Try: pavucontrol (to check output levels)");

    Ok(())
}

/// Test the configured speech backend
#[allow(clippy::future_not_send)]
async fn test_tts(config: &Config, text: &str) -> anyhow::Result<()> {
    println!(
        "Testing {} speech with text: \"{text}\"\n",
        config.voice.tts_provider
    );

    let mut speaker: Box<dyn Speaker> = build_speaker(config)?;
    speaker.speak(text).await?;

    println!("\n---");
    println!("If you heard the speech, TTS is working!");

    Ok(())
}
