//! Wake phrase matching
//!
//! Decides whether a transcribed utterance addresses the assistant, and
//! splits off a command spoken in the same breath ("hey astra, what time is it").

/// Phrases that wake the assistant when none are configured
pub const DEFAULT_WAKE_PHRASES: &[&str] = &["hey astra", "astra", "hello astra", "hi astra"];

/// Utterances that end the session once the assistant is awake
pub const EXIT_WORDS: &[&str] = &["exit", "stop", "quit", "bye"];

/// Outcome of matching an utterance against the wake phrases
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Wake {
    /// Utterance is exactly a wake phrase; the command follows separately
    Exact,
    /// Utterance starts with a wake phrase followed by a command
    WithCommand(String),
    /// Utterance does not address the assistant
    None,
}

/// Normalised set of wake phrases
#[derive(Debug, Clone)]
pub struct WakePhrases {
    /// Sorted longest first so "hey astra" wins over "astra"
    phrases: Vec<String>,
}

impl WakePhrases {
    /// Create a matcher from raw phrases (lowercased, trimmed, empties dropped)
    #[must_use]
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut phrases: Vec<String> = phrases
            .into_iter()
            .map(|p| p.as_ref().trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        phrases.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        phrases.dedup();

        tracing::debug!(phrases = ?phrases, "wake phrases configured");

        Self { phrases }
    }

    /// Match an utterance against the wake phrases
    #[must_use]
    pub fn matches(&self, utterance: &str) -> Wake {
        let normalized = utterance.trim().to_lowercase();

        for phrase in &self.phrases {
            if normalized == *phrase {
                return Wake::Exact;
            }

            let Some(rest) = normalized.strip_prefix(phrase.as_str()) else {
                continue;
            };

            // "astral projection" must not wake "astra"
            if rest.chars().next().is_some_and(char::is_alphanumeric) {
                continue;
            }

            let command = rest.trim_start_matches(|c: char| {
                c.is_whitespace() || matches!(c, ',' | '.' | '!' | '?')
            });
            if command.is_empty() {
                return Wake::Exact;
            }

            tracing::debug!(phrase, command, "wake phrase with inline command");
            return Wake::WithCommand(command.to_string());
        }

        Wake::None
    }

    /// Get the configured phrases
    #[must_use]
    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }
}

impl Default for WakePhrases {
    fn default() -> Self {
        Self::new(DEFAULT_WAKE_PHRASES)
    }
}

/// Check whether a query asks the assistant to end the session
#[must_use]
pub fn is_exit(query: &str) -> bool {
    let normalized = query.trim().to_lowercase();
    EXIT_WORDS.contains(&normalized.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_phrases() {
        let wake = WakePhrases::default();

        for phrase in DEFAULT_WAKE_PHRASES {
            assert_eq!(wake.matches(phrase), Wake::Exact, "{phrase}");
        }
        assert_eq!(wake.matches("  Hey Astra "), Wake::Exact);
        assert_eq!(wake.matches("hey astra!"), Wake::Exact);
    }

    #[test]
    fn test_inline_command() {
        let wake = WakePhrases::default();

        assert_eq!(
            wake.matches("hey astra, what time is it"),
            Wake::WithCommand("what time is it".to_string())
        );
        assert_eq!(
            wake.matches("astra search rust"),
            Wake::WithCommand("search rust".to_string())
        );
    }

    #[test]
    fn test_non_wake_utterances() {
        let wake = WakePhrases::default();

        assert_eq!(wake.matches("hello world"), Wake::None);
        assert_eq!(wake.matches("astral projection"), Wake::None);
        assert_eq!(wake.matches("i said hey astra"), Wake::None);
        assert_eq!(wake.matches(""), Wake::None);
    }

    #[test]
    fn test_normalisation_and_order() {
        let wake = WakePhrases::new(["  Nova ", "HEY NOVA", "", "nova"]);
        assert_eq!(wake.phrases(), &["hey nova", "nova"]);
        assert_eq!(
            wake.matches("hey nova open file notes.txt"),
            Wake::WithCommand("open file notes.txt".to_string())
        );
    }

    #[test]
    fn test_exit_words() {
        assert!(is_exit("bye"));
        assert!(is_exit(" Quit "));
        assert!(!is_exit("stop alarm"));
        assert!(!is_exit("goodbye astra"));
    }
}
