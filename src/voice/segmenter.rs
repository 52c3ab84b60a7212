//! Energy-based speech segmentation
//!
//! Splits the microphone stream into utterances: a segment starts when the
//! RMS energy crosses the threshold and completes after enough trailing
//! silence. The threshold adapts to the room via [`SpeechSegmenter::calibrate`].

use super::capture::{SAMPLE_RATE, rms};

/// Energy floor for speech when the room is quiet
pub const BASE_THRESHOLD: f32 = 0.03;

/// Ambient RMS multiplier used when calibrating
const AMBIENT_FACTOR: f32 = 2.5;

/// Minimum duration of speech to keep a segment (0.3 seconds)
const MIN_SPEECH_SAMPLES: usize = SAMPLE_RATE as usize * 3 / 10;

/// Silence after speech that ends an utterance (0.5 seconds)
const SILENCE_SAMPLES: usize = SAMPLE_RATE as usize / 2;

/// Hard cap on one utterance (15 seconds)
const MAX_SEGMENT_SAMPLES: usize = SAMPLE_RATE as usize * 15;

/// Segmenter state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentState {
    /// Waiting for speech
    Idle,
    /// Speech detected, accumulating until silence
    Speaking,
}

/// Accumulates audio chunks into complete utterances
#[derive(Debug)]
pub struct SpeechSegmenter {
    threshold: f32,
    state: SegmentState,
    buffer: Vec<f32>,
    speech_samples: usize,
    silence_samples: usize,
}

impl SpeechSegmenter {
    /// Create a segmenter with the base threshold
    #[must_use]
    pub const fn new() -> Self {
        Self {
            threshold: BASE_THRESHOLD,
            state: SegmentState::Idle,
            buffer: Vec::new(),
            speech_samples: 0,
            silence_samples: 0,
        }
    }

    /// Raise the threshold above the ambient noise level
    ///
    /// Never lowers it below [`BASE_THRESHOLD`].
    pub fn calibrate(&mut self, ambient: &[f32]) {
        let ambient_rms = rms(ambient);
        self.threshold = (ambient_rms * AMBIENT_FACTOR).max(BASE_THRESHOLD);
        tracing::debug!(ambient_rms, threshold = self.threshold, "calibrated for ambient noise");
    }

    /// Feed a chunk of samples
    ///
    /// Returns the complete utterance once speech is followed by enough silence.
    pub fn push(&mut self, chunk: &[f32]) -> Option<Vec<f32>> {
        if chunk.is_empty() {
            return None;
        }

        let energy = rms(chunk);
        let is_speech = energy > self.threshold;

        match self.state {
            SegmentState::Idle => {
                if is_speech {
                    self.state = SegmentState::Speaking;
                    self.buffer.clear();
                    self.buffer.extend_from_slice(chunk);
                    self.speech_samples = chunk.len();
                    self.silence_samples = 0;
                    tracing::trace!(energy, "speech started");
                }
                None
            }
            SegmentState::Speaking => {
                self.buffer.extend_from_slice(chunk);

                if is_speech {
                    self.speech_samples += chunk.len();
                    self.silence_samples = 0;
                } else {
                    self.silence_samples += chunk.len();
                }

                if self.silence_samples >= SILENCE_SAMPLES {
                    if self.speech_samples >= MIN_SPEECH_SAMPLES {
                        tracing::debug!(samples = self.buffer.len(), "utterance complete");
                        return Some(self.finish());
                    }
                    // A click or cough, not speech
                    tracing::trace!("segment too short, discarding");
                    self.reset();
                    return None;
                }

                if self.buffer.len() >= MAX_SEGMENT_SAMPLES {
                    tracing::debug!("utterance hit length cap");
                    return Some(self.finish());
                }

                None
            }
        }
    }

    /// Take whatever speech has been accumulated, if it is long enough
    pub fn flush(&mut self) -> Option<Vec<f32>> {
        if self.state == SegmentState::Speaking && self.speech_samples >= MIN_SPEECH_SAMPLES {
            Some(self.finish())
        } else {
            self.reset();
            None
        }
    }

    /// Reset to idle, dropping buffered audio (the threshold is kept)
    pub fn reset(&mut self) {
        self.state = SegmentState::Idle;
        self.buffer.clear();
        self.speech_samples = 0;
        self.silence_samples = 0;
    }

    /// Get current state
    #[must_use]
    pub const fn state(&self) -> SegmentState {
        self.state
    }

    /// Get the current speech threshold
    #[must_use]
    pub const fn threshold(&self) -> f32 {
        self.threshold
    }

    fn finish(&mut self) -> Vec<f32> {
        let segment = std::mem::take(&mut self.buffer);
        self.reset();
        segment
    }
}

impl Default for SpeechSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calibration_never_lowers_floor() {
        let mut segmenter = SpeechSegmenter::new();
        segmenter.calibrate(&[0.0; 800]);
        assert!((segmenter.threshold() - BASE_THRESHOLD).abs() < f32::EPSILON);

        segmenter.calibrate(&[0.1; 800]);
        assert!(segmenter.threshold() > 0.2);
    }

    #[test]
    fn test_empty_chunk_ignored() {
        let mut segmenter = SpeechSegmenter::new();
        assert!(segmenter.push(&[]).is_none());
        assert_eq!(segmenter.state(), SegmentState::Idle);
    }

    #[test]
    fn test_short_blip_discarded() {
        let mut segmenter = SpeechSegmenter::new();

        // 0.1s of noise then long silence
        assert!(segmenter.push(&[0.5; 1600]).is_none());
        assert_eq!(segmenter.state(), SegmentState::Speaking);
        assert!(segmenter.push(&[0.0; 8000]).is_none());
        assert_eq!(segmenter.state(), SegmentState::Idle);
    }

    #[test]
    fn test_flush_returns_partial_speech() {
        let mut segmenter = SpeechSegmenter::new();
        segmenter.push(&[0.5; 8000]);

        let segment = segmenter.flush().unwrap();
        assert_eq!(segment.len(), 8000);
        assert_eq!(segmenter.state(), SegmentState::Idle);
        assert!(segmenter.flush().is_none());
    }
}
