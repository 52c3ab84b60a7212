//! Utterance sources
//!
//! A [`Listener`] yields one normalised utterance per call: from the
//! microphone through cloud STT, or from typed console input.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader, Stdin};

use crate::voice::{AudioCapture, SegmentState, SpeechSegmenter, SpeechToText, samples_to_wav};
use crate::{Error, Result};

/// Audio polling interval (100ms chunks)
const CHUNK_INTERVAL: Duration = Duration::from_millis(100);

/// Ambient noise sampled before the first utterance
const CALIBRATION_WINDOW: Duration = Duration::from_millis(500);

/// Flush a stalled utterance after this long
const LISTEN_TIMEOUT: Duration = Duration::from_secs(20);

/// Source of user utterances
#[async_trait(?Send)]
pub trait Listener {
    /// Wait for the next utterance
    ///
    /// Returns `Ok(None)` when nothing intelligible was heard.
    ///
    /// # Errors
    ///
    /// [`Error::Stt`] when the recognition service fails, [`Error::InputClosed`]
    /// when the input source is exhausted.
    async fn listen(&mut self) -> Result<Option<String>>;
}

/// Normalise a transcript for matching
///
/// Lowercases, drops commas and trailing sentence punctuation that STT adds,
/// and collapses whitespace. Returns `None` for an empty result.
#[must_use]
pub fn normalize_utterance(raw: &str) -> Option<String> {
    let lowered = raw.to_lowercase().replace(',', " ");
    let collapsed = lowered.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed = collapsed.trim_end_matches(['.', '!', '?']).trim();

    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Pull chunks until the segmenter completes an utterance
///
/// Silence alone never ends the wait: while no speech has started the timer
/// just restarts. Speech that stalls past `timeout` is flushed as it is.
pub async fn next_segment<F>(
    segmenter: &mut SpeechSegmenter,
    mut next_chunk: F,
    interval: Duration,
    timeout: Duration,
) -> Vec<f32>
where
    F: FnMut() -> Vec<f32>,
{
    let mut started = Instant::now();

    loop {
        tokio::time::sleep(interval).await;

        if let Some(segment) = segmenter.push(&next_chunk()) {
            return segment;
        }
        if started.elapsed() < timeout {
            continue;
        }

        if segmenter.state() == SegmentState::Speaking {
            tracing::debug!("listen timeout, flushing partial speech");
            if let Some(segment) = segmenter.flush() {
                return segment;
            }
        }
        started = Instant::now();
    }
}

/// Listens on the microphone and transcribes through a cloud STT service
pub struct VoiceListener {
    capture: AudioCapture,
    segmenter: SpeechSegmenter,
    stt: SpeechToText,
    calibrated: bool,
}

impl VoiceListener {
    /// Create a listener over an opened capture device
    #[must_use]
    pub const fn new(capture: AudioCapture, stt: SpeechToText) -> Self {
        Self {
            capture,
            segmenter: SpeechSegmenter::new(),
            stt,
            calibrated: false,
        }
    }

    /// Record one utterance, waiting as long as it takes for speech
    async fn record_utterance(&mut self) -> Result<Vec<f32>> {
        self.capture.start()?;

        if !self.calibrated {
            tokio::time::sleep(CALIBRATION_WINDOW).await;
            self.segmenter.calibrate(&self.capture.take_buffer());
            self.calibrated = true;
        }

        println!("Listening...");
        self.capture.clear_buffer();
        self.segmenter.reset();

        let capture = &self.capture;
        let segment = next_segment(
            &mut self.segmenter,
            || capture.take_buffer(),
            CHUNK_INTERVAL,
            LISTEN_TIMEOUT,
        )
        .await;

        // Stop so the assistant does not transcribe its own replies
        self.capture.stop();
        Ok(segment)
    }
}

#[async_trait(?Send)]
impl Listener for VoiceListener {
    async fn listen(&mut self) -> Result<Option<String>> {
        let samples = self.record_utterance().await?;

        println!("Recognizing...");
        let wav = samples_to_wav(&samples, self.capture.sample_rate())?;
        let transcript = self.stt.transcribe(&wav).await?;

        let utterance = normalize_utterance(&transcript);
        if let Some(ref text) = utterance {
            println!("\n{text}");
        }
        Ok(utterance)
    }
}

/// Reads typed lines instead of listening to the microphone
pub struct ConsoleListener<R> {
    reader: R,
    prompt: Option<String>,
}

impl ConsoleListener<BufReader<Stdin>> {
    /// Read from standard input, printing a `> ` prompt
    #[must_use]
    pub fn stdin() -> Self {
        Self {
            reader: BufReader::new(tokio::io::stdin()),
            prompt: Some("> ".to_string()),
        }
    }
}

impl<R: AsyncBufRead + Unpin> ConsoleListener<R> {
    /// Read from any buffered async reader without prompting
    #[must_use]
    pub const fn from_reader(reader: R) -> Self {
        Self {
            reader,
            prompt: None,
        }
    }
}

#[async_trait(?Send)]
impl<R: AsyncBufRead + Unpin> Listener for ConsoleListener<R> {
    async fn listen(&mut self) -> Result<Option<String>> {
        if let Some(ref prompt) = self.prompt {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(prompt.as_bytes()).await?;
            stdout.flush().await?;
        }

        let mut line = String::new();
        let read = self.reader.read_line(&mut line).await?;
        if read == 0 {
            return Err(Error::InputClosed);
        }

        Ok(normalize_utterance(&line))
    }
}
