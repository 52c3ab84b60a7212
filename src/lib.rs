//! Astra - a voice-activated personal assistant
//!
//! Astra listens for a wake phrase, takes a spoken (or typed) command,
//! routes it to a handler and speaks the reply:
//! - Voice input (microphone capture, speech segmentation, cloud STT)
//! - Keyword command dispatch
//! - Handlers for web search, websites, files, alarms, Wikipedia, time and AI chat
//! - Voice output (cloud TTS, local speech binaries, console)
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────┐   ┌──────────┐   ┌──────────┐   ┌─────────┐
//! │ Listener ├──►│ Wake ├──►│ Dispatch ├──►│ Handlers ├──►│ Speaker │
//! └──────────┘   └──────┘   └──────────┘   └────┬─────┘   └─────────┘
//!                                               │
//!                                        ┌──────▼──────┐
//!                                        │ Alarm task  │
//!                                        └─────────────┘
//! ```

pub mod alarm;
pub mod assistant;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod listener;
pub mod setup;
pub mod speaker;
pub mod voice;
pub mod wake;

pub use alarm::{AlarmClock, AlarmRinger, AlarmSettings};
pub use assistant::Assistant;
pub use config::Config;
pub use dispatch::Command;
pub use error::{Error, Result};
pub use handlers::{Handlers, Opener};
pub use listener::Listener;
pub use speaker::Speaker;
pub use wake::{Wake, WakePhrases};
