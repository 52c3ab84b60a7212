//! Voice processing module
//!
//! Handles microphone capture, speech segmentation, cloud STT/TTS and playback.

mod capture;
mod playback;
mod segmenter;
mod stt;
mod tts;

pub use capture::{AudioCapture, SAMPLE_RATE, rms, samples_to_wav};
pub use playback::{
    AudioPlayback, DecodedAudio, PLAYBACK_SAMPLE_RATE, beep_pattern, decode_mp3, decode_wav,
    load_sound, normalize, resample,
};
pub use segmenter::{BASE_THRESHOLD, SegmentState, SpeechSegmenter};
pub use stt::SpeechToText;
pub use tts::{OPENAI_VOICES, TextToSpeech, VoiceInfo};
