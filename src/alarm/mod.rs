//! Alarm clock
//!
//! At most one alarm is armed at a time. It runs on a background tokio task
//! that polls the clock and rings through an [`AlarmRinger`] while the target
//! minute lasts, until it is cancelled or has rung `max_rings` times.

mod ringer;

pub use ringer::{AlarmRinger, DesktopRinger, NOTIFICATION_MESSAGE, NOTIFICATION_TITLE, notify};

use std::io::{BufRead, Write};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use chrono::{NaiveTime, Timelike};
use tokio::sync::Notify;

use crate::config::AlarmConfig;
use crate::{Error, Result};

/// Prompt printed in voice mode when an alarm starts ringing
pub const DISMISS_PROMPT: &str = "Press 'q' and Enter to stop the alarm: ";

/// Source of the current local time of day
pub type Clock = Arc<dyn Fn() -> NaiveTime + Send + Sync>;

/// Local wall clock
#[must_use]
pub fn local_clock() -> Clock {
    Arc::new(|| chrono::Local::now().time())
}

/// Parse a spoken alarm time in 24-hour `HH:MM` form
///
/// # Errors
///
/// Returns [`Error::Alarm`] if the text is not a valid time
pub fn parse_alarm_time(raw: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map_err(|e| Error::Alarm(format!("invalid alarm time {raw:?}: {e}")))
}

/// Timing of the alarm task
#[derive(Debug, Clone, Copy)]
pub struct AlarmSettings {
    /// Delay between clock checks (and between rings)
    pub poll_interval: Duration,
    /// Rings before the alarm finishes on its own
    pub max_rings: u32,
}

impl From<&AlarmConfig> for AlarmSettings {
    fn from(config: &AlarmConfig) -> Self {
        Self {
            poll_interval: config.poll_interval,
            max_rings: config.max_rings,
        }
    }
}

struct ActiveAlarm {
    id: u64,
    time: NaiveTime,
    running: Arc<AtomicBool>,
    ringing: Arc<AtomicBool>,
    wake: Arc<Notify>,
}

impl ActiveAlarm {
    fn stop(&self) {
        self.running.store(false, Ordering::Release);
        self.wake.notify_one();
    }
}

struct Inner {
    settings: AlarmSettings,
    ringer: Arc<dyn AlarmRinger>,
    clock: Clock,
    slot: Mutex<Option<ActiveAlarm>>,
    next_id: AtomicU64,
    console_prompt: AtomicBool,
    prompt_started: AtomicBool,
}

impl Inner {
    fn slot(&self) -> MutexGuard<'_, Option<ActiveAlarm>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drop the alarm `id` from the slot unless it was already replaced
    fn finish(&self, id: u64) {
        let mut slot = self.slot();
        if slot.as_ref().is_some_and(|a| a.id == id) {
            *slot = None;
        }
    }
}

/// Handle to the alarm clock, cheap to clone
#[derive(Clone)]
pub struct AlarmClock {
    inner: Arc<Inner>,
}

impl AlarmClock {
    /// Create an alarm clock
    #[must_use]
    pub fn new(settings: AlarmSettings, ringer: Arc<dyn AlarmRinger>, clock: Clock) -> Self {
        Self {
            inner: Arc::new(Inner {
                settings,
                ringer,
                clock,
                slot: Mutex::new(None),
                next_id: AtomicU64::new(1),
                console_prompt: AtomicBool::new(false),
                prompt_started: AtomicBool::new(false),
            }),
        }
    }

    /// Alarm clock ringing on the desktop with the local wall clock
    #[must_use]
    pub fn system(config: &AlarmConfig) -> Self {
        Self::new(
            config.into(),
            Arc::new(DesktopRinger::new(config.sound.clone())),
            local_clock(),
        )
    }

    /// Print [`DISMISS_PROMPT`] and accept `q` on stdin while ringing
    ///
    /// Only for voice mode, where stdin is otherwise unused.
    pub fn enable_console_prompt(&self) {
        self.inner.console_prompt.store(true, Ordering::Release);
    }

    /// Arm an alarm for `time`, replacing any existing one
    ///
    /// # Errors
    ///
    /// Returns error if called outside a tokio runtime
    pub fn set(&self, time: NaiveTime) -> Result<()> {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::Alarm(format!("no runtime for alarm task: {e}")))?;

        let alarm = ActiveAlarm {
            id: self.inner.next_id.fetch_add(1, Ordering::Relaxed),
            time,
            running: Arc::new(AtomicBool::new(true)),
            ringing: Arc::new(AtomicBool::new(false)),
            wake: Arc::new(Notify::new()),
        };

        let task = AlarmTask {
            clock: self.clone(),
            id: alarm.id,
            time,
            running: Arc::clone(&alarm.running),
            ringing: Arc::clone(&alarm.ringing),
            wake: Arc::clone(&alarm.wake),
        };

        if let Some(previous) = self.inner.slot().replace(alarm) {
            tracing::debug!(time = %previous.time.format("%H:%M"), "replacing alarm");
            previous.stop();
        }

        handle.spawn(task.run());
        tracing::info!(time = %time.format("%H:%M"), "alarm set");
        Ok(())
    }

    /// Cancel the current alarm
    ///
    /// Returns `true` if an alarm was armed or ringing.
    #[must_use = "tells whether anything was cancelled"]
    pub fn cancel(&self) -> bool {
        let Some(alarm) = self.inner.slot().take() else {
            return false;
        };
        alarm.stop();
        tracing::info!(time = %alarm.time.format("%H:%M"), "alarm cancelled");
        true
    }

    /// Time of the armed alarm, if any
    #[must_use]
    pub fn active(&self) -> Option<NaiveTime> {
        self.inner.slot().as_ref().map(|a| a.time)
    }

    /// Whether the armed alarm is currently ringing
    #[must_use]
    pub fn is_ringing(&self) -> bool {
        self.inner
            .slot()
            .as_ref()
            .is_some_and(|a| a.ringing.load(Ordering::Acquire))
    }

    fn prompt_for_dismissal(&self) {
        if !self.inner.console_prompt.load(Ordering::Acquire) {
            return;
        }

        print!("{DISMISS_PROMPT}");
        let _ = std::io::stdout().flush();

        if self.inner.prompt_started.swap(true, Ordering::AcqRel) {
            return;
        }

        // Blocking stdin reads cannot be cancelled, so one reader thread
        // serves every alarm for the rest of the process
        let weak = Arc::downgrade(&self.inner);
        let spawned = std::thread::Builder::new()
            .name("alarm-prompt".to_string())
            .spawn(move || read_dismissals(&weak));
        if let Err(e) = spawned {
            tracing::warn!(error = %e, "could not start alarm prompt");
            self.inner.prompt_started.store(false, Ordering::Release);
        }
    }
}

impl std::fmt::Debug for AlarmClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlarmClock")
            .field("settings", &self.inner.settings)
            .field("active", &self.active())
            .finish_non_exhaustive()
    }
}

fn read_dismissals(inner: &Weak<Inner>) {
    for line in std::io::stdin().lock().lines() {
        let Ok(line) = line else { break };
        let Some(inner) = inner.upgrade() else { break };

        let clock = AlarmClock { inner };
        if line.trim().eq_ignore_ascii_case("q") && clock.is_ringing() && clock.cancel() {
            println!("Alarm stopped.");
        }
    }
}

struct AlarmTask {
    clock: AlarmClock,
    id: u64,
    time: NaiveTime,
    running: Arc<AtomicBool>,
    ringing: Arc<AtomicBool>,
    wake: Arc<Notify>,
}

impl AlarmTask {
    async fn run(self) {
        let settings = self.clock.inner.settings;
        let mut rings = 0;

        while self.running.load(Ordering::Acquire) {
            let now = (self.clock.inner.clock)();

            if now.hour() == self.time.hour() && now.minute() == self.time.minute() {
                if rings == 0 {
                    self.ringing.store(true, Ordering::Release);
                    self.clock.prompt_for_dismissal();
                }
                rings += 1;
                self.ring().await;

                if rings >= settings.max_rings || !self.running.load(Ordering::Acquire) {
                    break;
                }
            } else if rings > 0 {
                break;
            }

            tokio::select! {
                () = tokio::time::sleep(settings.poll_interval) => {}
                () = self.wake.notified() => {}
            }
        }

        self.ringing.store(false, Ordering::Release);
        self.running.store(false, Ordering::Release);
        self.clock.inner.finish(self.id);
        tracing::debug!(time = %self.time.format("%H:%M"), rings, "alarm finished");
    }

    async fn ring(&self) {
        let ringer = Arc::clone(&self.clock.inner.ringer);
        let time = self.time;

        match tokio::task::spawn_blocking(move || ringer.ring(time)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "alarm ring failed"),
            Err(e) => tracing::error!(error = %e, "alarm ring task panicked"),
        }
    }
}
