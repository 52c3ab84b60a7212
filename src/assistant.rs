//! The assistant session loop
//!
//! Waits for a wake phrase, takes a command, dispatches it and speaks the
//! reply, until the user says an exit word or the input closes.

use crate::dispatch::Command;
use crate::handlers::Handlers;
use crate::listener::Listener;
use crate::speaker::Speaker;
use crate::wake::{Wake, WakePhrases, is_exit};
use crate::{Error, Result};

/// Reply after a bare wake phrase
pub const ACKNOWLEDGEMENT: &str = "Yeah, I am here for you";

/// Reply to an exit word
pub const FAREWELL: &str = "Goodbye! Have a nice day...";

/// Greeting spoken when the session starts
#[must_use]
pub fn greeting(name: &str) -> String {
    format!("Hi Hello There, I am {name}. Feel free to call my name if you need any assistance!!")
}

/// A running assistant
pub struct Assistant {
    name: String,
    listener: Box<dyn Listener>,
    speaker: Box<dyn Speaker>,
    handlers: Handlers,
    wake: WakePhrases,
}

impl Assistant {
    /// Assemble an assistant
    #[must_use]
    pub fn new(
        name: String,
        listener: Box<dyn Listener>,
        speaker: Box<dyn Speaker>,
        handlers: Handlers,
        wake: WakePhrases,
    ) -> Self {
        Self {
            name,
            listener,
            speaker,
            handlers,
            wake,
        }
    }

    /// Run the session until exit or end of input
    ///
    /// Any armed alarm is cancelled when the session ends.
    ///
    /// # Errors
    ///
    /// Returns error if the audio device fails
    pub async fn run(&mut self) -> Result<()> {
        tracing::info!(name = %self.name, wake = ?self.wake.phrases(), "assistant started");
        let hello = greeting(&self.name);
        self.say(&hello).await;

        let outcome = self.session().await;

        if self.handlers.alarm().cancel() {
            tracing::debug!("alarm cancelled on shutdown");
        }

        match outcome {
            Err(Error::InputClosed) => {
                tracing::info!("input closed, ending session");
                Ok(())
            }
            other => other,
        }
    }

    /// Dispatch one query and return the reply, without waking
    pub async fn respond(&self, query: &str) -> String {
        let command = Command::parse(query);
        tracing::info!(command = command.name(), "dispatching");
        self.handlers.handle(command).await
    }

    async fn session(&mut self) -> Result<()> {
        loop {
            let Some(heard) = self.next_utterance().await? else {
                continue;
            };

            if heard == "q" && self.handlers.alarm().is_ringing() && self.handlers.alarm().cancel() {
                self.say("Alarm stopped.").await;
                continue;
            }

            let query = match self.wake.matches(&heard) {
                Wake::None => {
                    tracing::trace!(heard = %heard, "no wake phrase");
                    continue;
                }
                Wake::WithCommand(query) => query,
                Wake::Exact => {
                    self.say(ACKNOWLEDGEMENT).await;
                    let Some(query) = self.next_utterance().await? else {
                        continue;
                    };
                    query
                }
            };

            if is_exit(&query) {
                self.say(FAREWELL).await;
                return Ok(());
            }

            let reply = self.respond(&query).await;
            self.say(&reply).await;
        }
    }

    /// Listen once, absorbing recoverable failures as `None`
    async fn next_utterance(&mut self) -> Result<Option<String>> {
        match self.listener.listen().await {
            Ok(Some(text)) => Ok(Some(text)),
            Ok(None) => {
                println!("Sorry, I didn't catch that.\n");
                Ok(None)
            }
            Err(Error::Stt(e)) => {
                tracing::warn!(error = %e, "speech recognition failed");
                self.say("Speech recognition service is not available.").await;
                Ok(None)
            }
            Err(e @ (Error::InputClosed | Error::Audio(_))) => Err(e),
            Err(e) => {
                tracing::warn!(error = %e, "listen failed");
                println!("An unexpected error occurred while listening.");
                Ok(None)
            }
        }
    }

    /// Speak, printing the text if the speaker fails
    async fn say(&mut self, text: &str) {
        if let Err(e) = self.speaker.speak(text).await {
            tracing::warn!(error = %e, "speech output failed");
            println!("{}: {text}", self.name);
        }
    }
}
