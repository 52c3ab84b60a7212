//! AI chat fallback over an `OpenAI`-compatible chat completions API

use serde::{Deserialize, Serialize};

use crate::config::ChatConfig;
use crate::{Error, Result};

const SYSTEM_PROMPT: &str = "You are a helpful assistant.";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Chat completions client
pub struct ChatClient {
    client: reqwest::Client,
    api_url: String,
    model: String,
    api_key: Option<String>,
}

impl ChatClient {
    /// Create a chat client
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: &ChatConfig, api_key: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            model: config.model.clone(),
            api_key,
        })
    }

    /// Whether a key is configured
    #[must_use]
    pub const fn has_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Ask the model and return its reply, or `None` if it sent no content
    ///
    /// # Errors
    ///
    /// [`Error::Config`] without an API key, [`Error::Http`] on request failure
    /// or a non-success status
    pub async fn complete(&self, query: &str) -> Result<Option<String>> {
        let Some(ref api_key) = self.api_key else {
            return Err(Error::Config("chat API key is missing".to_string()));
        };

        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: query,
                },
            ],
        };

        tracing::debug!(model = %self.model, chars = query.len(), "chat request");

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        let body: ChatResponse = response.json().await?;
        Ok(first_content(body))
    }

    /// Ask the model, turning every failure into a spoken error message
    pub async fn reply(&self, query: &str) -> String {
        if !self.has_key() {
            return "Error: DeepSeek API key is missing.".to_string();
        }

        match self.complete(query).await {
            Ok(Some(content)) => content,
            Ok(None) => "Error: No valid response.".to_string(),
            Err(Error::Http(e)) if e.is_timeout() => {
                tracing::warn!(error = %e, "chat request timed out");
                "Error: DeepSeek API request timed out.".to_string()
            }
            Err(e) => {
                tracing::warn!(error = %e, "chat request failed");
                format!("Error: Unable to connect to DeepSeek API. {e}")
            }
        }
    }
}

fn first_content(response: ChatResponse) -> Option<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .filter(|c| !c.trim().is_empty())
}
