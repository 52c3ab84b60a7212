//! Keyword command routing
//!
//! Turns a spoken query into a [`Command`]. Rules are plain substring checks
//! evaluated in a fixed order; the first match wins and anything unmatched
//! falls through to the AI chat.

/// A routed user command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Open a website (or search for it when it isn't a host name)
    OpenWebsite(String),
    /// Open a local file with the system opener
    OpenFile(String),
    /// Set the alarm; holds the raw spoken time
    SetAlarm(String),
    /// Cancel or dismiss the alarm
    CancelAlarm,
    /// Wikipedia summary lookup
    Wikipedia(String),
    /// Web search in the browser
    Search(String),
    /// Speak the current time and date
    TimeAndDate,
    /// Forward to the AI chat backend
    Chat(String),
}

/// Prefixes stripped from alarm requests
const ALARM_PREFIXES: &[&str] = &["set an alarm for", "set alarm for"];

/// Phrases that cancel the alarm
const CANCEL_PHRASES: &[&str] = &["cancel alarm", "stop alarm", "dismiss alarm"];

impl Command {
    /// Route a query to a command
    #[must_use]
    pub fn parse(query: &str) -> Self {
        let query = query.trim().to_lowercase();

        let command = if query.contains("open") && query.contains("website") {
            Self::OpenWebsite(strip(&query, &["open website"]))
        } else if query.contains("open file") {
            Self::OpenFile(strip(&query, &["open file"]))
        } else if query.contains("alarm") && query.contains("set") {
            Self::SetAlarm(strip(&query, ALARM_PREFIXES))
        } else if CANCEL_PHRASES.iter().any(|p| query.contains(p)) {
            Self::CancelAlarm
        } else if query.contains("wikipedia") {
            Self::Wikipedia(strip(&query, &["wikipedia"]))
        } else if query.contains("search") {
            Self::Search(strip(&query, &["search"]))
        } else if query.contains("time") || query.contains("date") {
            Self::TimeAndDate
        } else {
            Self::Chat(query)
        };

        tracing::debug!(command = command.name(), "routed query");
        command
    }

    /// Stable label for logging
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::OpenWebsite(_) => "open_website",
            Self::OpenFile(_) => "open_file",
            Self::SetAlarm(_) => "set_alarm",
            Self::CancelAlarm => "cancel_alarm",
            Self::Wikipedia(_) => "wikipedia",
            Self::Search(_) => "search",
            Self::TimeAndDate => "time_and_date",
            Self::Chat(_) => "chat",
        }
    }
}

/// Remove every occurrence of each phrase, then trim
fn strip(query: &str, phrases: &[&str]) -> String {
    phrases
        .iter()
        .fold(query.to_string(), |acc, phrase| acc.replace(phrase, ""))
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_removes_all_occurrences() {
        assert_eq!(strip("search cats search", &["search"]), "cats");
        assert_eq!(strip("set an alarm for 7:30", ALARM_PREFIXES), "7:30");
        assert_eq!(strip("set alarm for 07:30", ALARM_PREFIXES), "07:30");
    }

    #[test]
    fn test_names_are_distinct() {
        let commands = [
            Command::OpenWebsite(String::new()),
            Command::OpenFile(String::new()),
            Command::SetAlarm(String::new()),
            Command::CancelAlarm,
            Command::Wikipedia(String::new()),
            Command::Search(String::new()),
            Command::TimeAndDate,
            Command::Chat(String::new()),
        ];
        let mut names: Vec<_> = commands.iter().map(Command::name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), commands.len());
    }
}
