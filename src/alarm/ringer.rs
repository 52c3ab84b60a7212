//! Alarm ringing: desktop notification plus sound

use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::OnceLock;

use chrono::NaiveTime;

use crate::voice::{AudioPlayback, beep_pattern, load_sound};
use crate::{Error, Result};

/// Notification title
pub const NOTIFICATION_TITLE: &str = "Alarm Notification";

/// Notification body
pub const NOTIFICATION_MESSAGE: &str = "It's your alarm time... Press 'q' to stop.";

/// Fallback tone when the sound file is unavailable
const BEEP_FREQUENCY: f32 = 880.0;

/// Emits one ring of a due alarm
///
/// Called from a blocking thread, so implementations may block while the
/// sound plays.
pub trait AlarmRinger: Send + Sync {
    /// Ring once for the alarm set at `time`
    ///
    /// # Errors
    ///
    /// Returns error if neither the notification nor the sound could be emitted
    fn ring(&self, time: NaiveTime) -> Result<()>;
}

/// Rings with a desktop notification and the configured sound file
pub struct DesktopRinger {
    sound: PathBuf,
    samples: OnceLock<Vec<f32>>,
}

impl DesktopRinger {
    /// Create a ringer playing `sound` (MP3 or WAV)
    #[must_use]
    pub const fn new(sound: PathBuf) -> Self {
        Self {
            sound,
            samples: OnceLock::new(),
        }
    }

    /// Decoded sound, falling back to a beep pattern
    fn samples(&self) -> &[f32] {
        self.samples.get_or_init(|| match load_sound(&self.sound) {
            Ok(samples) => samples,
            Err(e) => {
                tracing::warn!(
                    sound = %self.sound.display(),
                    error = %e,
                    "alarm sound unavailable, using beep"
                );
                beep_pattern(BEEP_FREQUENCY)
            }
        })
    }
}

impl AlarmRinger for DesktopRinger {
    fn ring(&self, time: NaiveTime) -> Result<()> {
        tracing::info!(time = %time.format("%H:%M"), "alarm ringing");

        let notified = notify(NOTIFICATION_TITLE, NOTIFICATION_MESSAGE);
        if let Err(ref e) = notified {
            tracing::warn!(error = %e, "desktop notification failed");
        }

        let played = AudioPlayback::new().and_then(|playback| playback.play_blocking(self.samples()));

        match (notified, played) {
            (Err(_), Err(e)) => Err(Error::Alarm(format!("could not ring: {e}"))),
            (_, Err(e)) => {
                tracing::warn!(error = %e, "alarm sound failed");
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

/// Send a desktop notification with `notify-send` or `osascript`
///
/// # Errors
///
/// Returns error if no notifier is installed or it fails to start
pub fn notify(title: &str, message: &str) -> Result<()> {
    let mut command = if cfg!(target_os = "macos") {
        let program = which::which("osascript")
            .map_err(|e| Error::Alarm(format!("osascript not available: {e}")))?;
        let script = format!(
            "display notification {} with title {}",
            applescript_string(message),
            applescript_string(title)
        );
        let mut command = Command::new(program);
        command.arg("-e").arg(script);
        command
    } else {
        let program = which::which("notify-send")
            .map_err(|e| Error::Alarm(format!("notify-send not available: {e}")))?;
        let mut command = Command::new(program);
        command.args(["--urgency=critical", "--expire-time=10000", title, message]);
        command
    };

    let status = command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()?;

    if !status.success() {
        return Err(Error::Alarm(format!("notifier exited with {status}")));
    }
    Ok(())
}

fn applescript_string(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_applescript_quoting() {
        assert_eq!(applescript_string("it's \"on\""), r#""it's \"on\"""#);
    }

    #[test]
    fn test_missing_sound_falls_back_to_beep() {
        let ringer = DesktopRinger::new(PathBuf::from("/nonexistent/alarm.mp3"));
        assert_eq!(ringer.samples().len(), beep_pattern(BEEP_FREQUENCY).len());
    }
}
