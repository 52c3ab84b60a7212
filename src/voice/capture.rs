//! Microphone input for the listener
//!
//! Samples land in a shared buffer that the listener drains every chunk
//! interval. Speech APIs get the utterance back as 16-bit WAV.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleRate, Stream, StreamConfig};

use crate::{Error, Result};

/// Capture rate; cloud STT models are trained on 16kHz speech
pub const SAMPLE_RATE: u32 = 16000;

type SampleBuffer = Arc<Mutex<Vec<f32>>>;

/// Mono microphone on the default input device
///
/// The stream only runs between [`AudioCapture::start`] and
/// [`AudioCapture::stop`], so the assistant does not hear its own replies.
pub struct AudioCapture {
    device: Device,
    config: StreamConfig,
    buffer: SampleBuffer,
    stream: Option<Stream>,
}

fn audio_err(e: impl std::fmt::Display) -> Error {
    Error::Audio(e.to_string())
}

impl AudioCapture {
    /// Open the default input device
    ///
    /// # Errors
    ///
    /// Returns error if no input device supports mono 16kHz capture
    pub fn new() -> Result<Self> {
        let device = cpal::default_host()
            .default_input_device()
            .ok_or_else(|| Error::Audio("no microphone found".to_string()))?;

        let rate = SampleRate(SAMPLE_RATE);
        let config = device
            .supported_input_configs()
            .map_err(audio_err)?
            .find(|c| {
                c.channels() == 1 && (c.min_sample_rate()..=c.max_sample_rate()).contains(&rate)
            })
            .ok_or_else(|| Error::Audio("microphone cannot record mono 16kHz".to_string()))?
            .with_sample_rate(rate)
            .config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = SAMPLE_RATE,
            "microphone opened"
        );

        Ok(Self {
            device,
            config,
            buffer: SampleBuffer::default(),
            stream: None,
        })
    }

    /// Begin recording; a no-op while already recording
    ///
    /// # Errors
    ///
    /// Returns error if the input stream cannot be built or started
    pub fn start(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let sink = Arc::clone(&self.buffer);
        let stream = self
            .device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    lock(&sink).extend_from_slice(data);
                },
                |err| tracing::error!(error = %err, "microphone stream error"),
                None,
            )
            .map_err(audio_err)?;
        stream.play().map_err(audio_err)?;

        self.stream = Some(stream);
        tracing::trace!("microphone on");
        Ok(())
    }

    /// Stop recording and discard unread samples
    pub fn stop(&mut self) {
        if self.stream.take().is_some() {
            self.clear_buffer();
            tracing::trace!("microphone off");
        }
    }

    /// Drain everything recorded since the last drain
    #[must_use]
    pub fn take_buffer(&self) -> Vec<f32> {
        std::mem::take(&mut *lock(&self.buffer))
    }

    /// Snapshot of the unread samples, for level meters
    #[must_use]
    pub fn peek_buffer(&self) -> Vec<f32> {
        lock(&self.buffer).clone()
    }

    /// Discard unread samples
    pub fn clear_buffer(&self) {
        lock(&self.buffer).clear();
    }

    #[must_use]
    pub const fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }
}

/// A panicking audio callback must not silence the microphone for good
fn lock(buffer: &Mutex<Vec<f32>>) -> MutexGuard<'_, Vec<f32>> {
    buffer.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Encode an utterance as 16-bit mono WAV for upload
///
/// # Errors
///
/// Returns error if WAV encoding fails
pub fn samples_to_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut wav = std::io::Cursor::new(Vec::with_capacity(44 + samples.len() * 2));
    let mut writer = hound::WavWriter::new(&mut wav, spec).map_err(audio_err)?;
    for &sample in samples {
        #[allow(clippy::cast_possible_truncation)]
        let pcm = (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16;
        writer.write_sample(pcm).map_err(audio_err)?;
    }
    writer.finalize().map_err(audio_err)?;

    Ok(wav.into_inner())
}

/// Root-mean-square level of a chunk (0.0 for an empty one)
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let energy = samples.iter().fold(0.0f32, |acc, s| s.mul_add(*s, acc));
    (energy / samples.len() as f32).sqrt()
}
