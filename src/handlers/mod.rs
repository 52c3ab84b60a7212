//! Command handlers
//!
//! Each [`Command`] is executed here and turned into the reply to speak.
//! Failures never escape: they become apology text.

mod chat;
mod clock;
mod files;
mod launcher;
mod wikipedia;

pub use chat::ChatClient;
pub use clock::describe as describe_time;
pub use files::{expand_path, resolve_existing};
pub use launcher::{Opener, PrintOpener, SystemOpener, search_url, website_url};
pub use wikipedia::WikipediaClient;

use std::sync::Arc;

use crate::alarm::{AlarmClock, parse_alarm_time};
use crate::config::Config;
use crate::dispatch::Command;
use crate::{Error, Result};

/// Source of the current local date and time
pub type DateTimeSource = Arc<dyn Fn() -> chrono::NaiveDateTime + Send + Sync>;

/// Executes commands against the outside world
pub struct Handlers {
    opener: Arc<dyn Opener>,
    search_url_template: String,
    wikipedia: WikipediaClient,
    chat: ChatClient,
    alarm: AlarmClock,
    now: DateTimeSource,
}

impl Handlers {
    /// Create handlers from their collaborators
    #[must_use]
    pub fn new(
        opener: Arc<dyn Opener>,
        search_url_template: String,
        wikipedia: WikipediaClient,
        chat: ChatClient,
        alarm: AlarmClock,
    ) -> Self {
        Self {
            opener,
            search_url_template,
            wikipedia,
            chat,
            alarm,
            now: Arc::new(|| chrono::Local::now().naive_local()),
        }
    }

    /// Build handlers from configuration with the given opener and alarm
    ///
    /// # Errors
    ///
    /// Returns error if an HTTP client cannot be built
    pub fn from_config(config: &Config, opener: Arc<dyn Opener>, alarm: AlarmClock) -> Result<Self> {
        Ok(Self::new(
            opener,
            config.search_url_template.clone(),
            WikipediaClient::new(&config.wikipedia)?,
            ChatClient::new(&config.chat, config.api_keys.deepseek.clone())?,
            alarm,
        ))
    }

    /// Replace the date/time source
    #[must_use]
    pub fn with_clock(mut self, now: DateTimeSource) -> Self {
        self.now = now;
        self
    }

    /// The alarm clock commands operate on
    #[must_use]
    pub const fn alarm(&self) -> &AlarmClock {
        &self.alarm
    }

    /// Execute a command and return the reply
    pub async fn handle(&self, command: Command) -> String {
        tracing::debug!(command = command.name(), "handling command");

        match command {
            Command::OpenWebsite(site) => self.open_website(&site),
            Command::OpenFile(path) => self.open_file(&path),
            Command::SetAlarm(raw) => self.set_alarm(&raw),
            Command::CancelAlarm => self.cancel_alarm(),
            Command::Wikipedia(term) => self.wikipedia(&term).await,
            Command::Search(query) => self.search(&query),
            Command::TimeAndDate => describe_time((self.now)()),
            Command::Chat(query) => self.chat.reply(&query).await,
        }
    }

    fn open_website(&self, site: &str) -> String {
        let target = website_url(site).map_or_else(
            || search_url(&self.search_url_template, site),
            String::from,
        );
        self.launch(&target);
        format!("Opening {site}")
    }

    fn search(&self, query: &str) -> String {
        self.launch(&search_url(&self.search_url_template, query));
        format!("Searching for {query}")
    }

    /// Open in the browser; a failure is logged but the reply stands
    fn launch(&self, target: &str) {
        if let Err(e) = self.opener.open(target) {
            tracing::warn!(url = target, error = %e, "failed to open browser");
        }
    }

    fn open_file(&self, raw: &str) -> String {
        let Some(path) = resolve_existing(raw) else {
            return format!("Sorry, I couldn't find the file at {raw}");
        };

        match self.opener.open(&path.to_string_lossy()) {
            Ok(()) => format!("Opening {raw}"),
            Err(e) => format!("An error occurred while trying to open the file: {e}"),
        }
    }

    fn set_alarm(&self, raw: &str) -> String {
        let Ok(time) = parse_alarm_time(raw) else {
            return "Please provide the alarm time in the correct format (HH:MM).".to_string();
        };

        match self.alarm.set(time) {
            Ok(()) => format!("Alarm set for {}", time.format("%H:%M")),
            Err(e) => {
                tracing::error!(error = %e, "failed to arm alarm");
                "Sorry, I couldn't set the alarm.".to_string()
            }
        }
    }

    fn cancel_alarm(&self) -> String {
        if self.alarm.cancel() {
            "Alarm cancelled.".to_string()
        } else {
            "No alarm is currently set.".to_string()
        }
    }

    async fn wikipedia(&self, term: &str) -> String {
        match self.wikipedia.summary(term).await {
            Ok(summary) => format!("According to Wikipedia: {summary}"),
            Err(Error::Disambiguation(_)) => {
                "Multiple results found. Please be more specific.".to_string()
            }
            Err(Error::NotFound(_)) => {
                format!("Sorry, I couldn't find any information on {term}.")
            }
            Err(e) => {
                tracing::warn!(term, error = %e, "wikipedia lookup failed");
                "An unexpected error occurred while searching Wikipedia.".to_string()
            }
        }
    }
}
