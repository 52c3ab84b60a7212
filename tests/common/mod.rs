//! Shared test utilities
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use astra::alarm::{AlarmClock, AlarmRinger, AlarmSettings, Clock};
use astra::config::file::AstraConfigFile;
use astra::{Config, Error, Handlers, Listener, Opener, Result, Speaker};

/// Wall-clock moment every test handler sees: Tuesday 2024-03-05 14:07
pub fn fixed_now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 5)
        .unwrap()
        .and_hms_opt(14, 7, 0)
        .unwrap()
}

/// Reply to "what time is it" at [`fixed_now`]
pub const FIXED_TIME_REPLY: &str =
    "The current time is 02:07 PM and the date is Tuesday, March 05, 2024";

/// Configuration built from defaults only
pub fn test_config() -> Config {
    Config::from_sources(AstraConfigFile::default(), |_| None).expect("default config")
}

/// One scripted listener result
pub enum Heard {
    /// A transcript
    Text(&'static str),
    /// Nothing intelligible
    Nothing,
    /// Recognition service failure
    SttFailure,
}

/// Listener that replays a script, then reports closed input
pub struct ScriptedListener {
    script: VecDeque<Heard>,
    delay: Duration,
}

impl ScriptedListener {
    pub fn new(script: impl IntoIterator<Item = Heard>) -> Self {
        Self {
            script: script.into_iter().collect(),
            delay: Duration::ZERO,
        }
    }

    /// Lines of text only
    pub fn lines(lines: &[&'static str]) -> Self {
        Self::new(lines.iter().copied().map(Heard::Text))
    }

    /// Pause before answering each listen call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait(?Send)]
impl Listener for ScriptedListener {
    async fn listen(&mut self) -> Result<Option<String>> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match self.script.pop_front() {
            Some(Heard::Text(text)) => Ok(Some(text.to_string())),
            Some(Heard::Nothing) => Ok(None),
            Some(Heard::SttFailure) => Err(Error::Stt("service unreachable".to_string())),
            None => Err(Error::InputClosed),
        }
    }
}

/// Speaker that records everything it is asked to say
#[derive(Clone, Default)]
pub struct RecordingSpeaker {
    spoken: Arc<Mutex<Vec<String>>>,
}

impl RecordingSpeaker {
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }
}

#[async_trait(?Send)]
impl Speaker for RecordingSpeaker {
    async fn speak(&mut self, text: &str) -> Result<()> {
        self.spoken.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Opener that records targets instead of launching anything
#[derive(Clone, Default)]
pub struct RecordingOpener {
    opened: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl RecordingOpener {
    /// An opener whose every launch fails
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

impl Opener for RecordingOpener {
    fn open(&self, target: &str) -> Result<()> {
        if self.fail {
            return Err(Error::Launch("no display".to_string()));
        }
        self.opened.lock().unwrap().push(target.to_string());
        Ok(())
    }
}

/// Ringer that counts rings
#[derive(Clone, Default)]
pub struct RecordingRinger {
    rings: Arc<AtomicUsize>,
}

impl RecordingRinger {
    pub fn rings(&self) -> usize {
        self.rings.load(Ordering::SeqCst)
    }
}

impl AlarmRinger for RecordingRinger {
    fn ring(&self, _time: NaiveTime) -> Result<()> {
        self.rings.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Clock the test can move
#[derive(Clone)]
pub struct ManualClock {
    now: Arc<Mutex<NaiveTime>>,
}

impl ManualClock {
    pub fn at(hour: u32, minute: u32) -> Self {
        Self {
            now: Arc::new(Mutex::new(NaiveTime::from_hms_opt(hour, minute, 0).unwrap())),
        }
    }

    pub fn set(&self, hour: u32, minute: u32) {
        *self.now.lock().unwrap() = NaiveTime::from_hms_opt(hour, minute, 0).unwrap();
    }

    pub fn clock(&self) -> Clock {
        let now = Arc::clone(&self.now);
        Arc::new(move || *now.lock().unwrap())
    }
}

/// Alarm clock polling every 10ms
pub fn test_alarm(clock: &ManualClock, ringer: &RecordingRinger, max_rings: u32) -> AlarmClock {
    AlarmClock::new(
        AlarmSettings {
            poll_interval: Duration::from_millis(10),
            max_rings,
        },
        Arc::new(ringer.clone()),
        clock.clock(),
    )
}

/// Handlers with a recording opener and a fixed date/time
pub fn test_handlers(opener: &RecordingOpener, alarm: AlarmClock) -> Handlers {
    Handlers::from_config(&test_config(), Arc::new(opener.clone()), alarm)
        .expect("handlers")
        .with_clock(Arc::new(fixed_now))
}

/// Poll until `condition` holds, failing after two seconds
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Serve the same canned response to every request on a loopback port
///
/// Returns the base URL, e.g. `http://127.0.0.1:41234`.
pub async fn serve_http(status: &'static str, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                read_request(&mut stream).await;
                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            });
        }
    });

    format!("http://{addr}")
}

/// Accept connections and never answer
pub async fn serve_silence() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });

    format!("http://{addr}")
}

/// Base URL of a loopback port nothing listens on
pub fn closed_port() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

/// Read request headers and body so the client sees a clean exchange
async fn read_request(stream: &mut TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    loop {
        let Ok(n) = stream.read(&mut chunk).await else { return };
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);

        let Some(header_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let headers = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
        let body_len = headers
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        if buf.len() >= header_end + 4 + body_len {
            return;
        }
    }
}
