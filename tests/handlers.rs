//! Network-backed handler replies
//!
//! Chat and Wikipedia talk to loopback servers with canned responses, so the
//! spoken error texts are checked without reaching the real services.

use std::sync::Arc;
use std::time::Duration;

use astra::{Command, Config, Handlers};

mod common;

use common::{
    ManualClock, RecordingOpener, RecordingRinger, closed_port, serve_http, serve_silence,
    test_alarm, test_config,
};

const DISAMBIGUATION: &str = r#"{"batchcomplete":true,"query":{"pages":[{"pageid":19694,"ns":0,"title":"Mercury","index":1,"extract":"Mercury may refer to:","pageprops":{"disambiguation":""}}]}}"#;

const TWO_SENTENCES: &str = r#"{"batchcomplete":true,"query":{"pages":[{"pageid":1,"ns":0,"title":"United States Army","index":1,"extract":"The U.S. Army is the land service branch. It was founded in 1775."}]}}"#;

/// Config pointing chat at `chat_base` and Wikipedia at `wiki_base`
fn config_with(chat_base: &str, wiki_base: &str) -> Config {
    let mut config = test_config();
    config.chat.api_url = format!("{chat_base}/v1/chat/completions");
    config.chat.timeout = Duration::from_millis(200);
    config.wikipedia.api_url = format!("{wiki_base}/w/api.php");
    config.api_keys.deepseek = Some("sk-test".to_string());
    config
}

fn handlers_for(config: &Config) -> Handlers {
    Handlers::from_config(
        config,
        Arc::new(RecordingOpener::default()),
        test_alarm(&ManualClock::at(6, 0), &RecordingRinger::default(), 1),
    )
    .expect("handlers")
}

async fn chat(config: &Config) -> String {
    handlers_for(config)
        .handle(Command::Chat("tell me a joke".to_string()))
        .await
}

async fn wikipedia(config: &Config, term: &str) -> String {
    handlers_for(config)
        .handle(Command::Wikipedia(term.to_string()))
        .await
}

#[tokio::test]
async fn test_chat_reply_content() {
    let base = serve_http(
        "200 OK",
        r#"{"choices":[{"message":{"role":"assistant","content":"Why did the crab never share?"}}]}"#,
    )
    .await;

    assert_eq!(chat(&config_with(&base, &base)).await, "Why did the crab never share?");
}

#[tokio::test]
async fn test_chat_without_choices() {
    let base = serve_http("200 OK", r#"{"choices":[]}"#).await;

    assert_eq!(chat(&config_with(&base, &base)).await, "Error: No valid response.");
}

#[tokio::test]
async fn test_chat_timeout() {
    let base = serve_silence().await;

    assert_eq!(
        chat(&config_with(&base, &base)).await,
        "Error: DeepSeek API request timed out."
    );
}

#[tokio::test]
async fn test_chat_unreachable() {
    let base = closed_port();

    let reply = chat(&config_with(&base, &base)).await;
    assert!(
        reply.starts_with("Error: Unable to connect to DeepSeek API. "),
        "{reply}"
    );
}

#[tokio::test]
async fn test_chat_server_error() {
    let base = serve_http("500 Internal Server Error", r#"{"error":"boom"}"#).await;

    let reply = chat(&config_with(&base, &base)).await;
    assert!(
        reply.starts_with("Error: Unable to connect to DeepSeek API. "),
        "{reply}"
    );
}

#[tokio::test]
async fn test_wikipedia_keeps_abbreviated_sentences() {
    let base = serve_http("200 OK", TWO_SENTENCES).await;

    assert_eq!(
        wikipedia(&config_with(&base, &base), "us army").await,
        "According to Wikipedia: The U.S. Army is the land service branch. It was founded in 1775."
    );
}

#[tokio::test]
async fn test_wikipedia_disambiguation() {
    let base = serve_http("200 OK", DISAMBIGUATION).await;

    assert_eq!(
        wikipedia(&config_with(&base, &base), "mercury").await,
        "Multiple results found. Please be more specific."
    );
}

#[tokio::test]
async fn test_wikipedia_no_match() {
    let base = serve_http("200 OK", r#"{"batchcomplete":true}"#).await;

    assert_eq!(
        wikipedia(&config_with(&base, &base), "qwxzzy").await,
        "Sorry, I couldn't find any information on qwxzzy."
    );
}

#[tokio::test]
async fn test_wikipedia_server_error() {
    let base = serve_http("500 Internal Server Error", "{}").await;

    assert_eq!(
        wikipedia(&config_with(&base, &base), "rust").await,
        "An unexpected error occurred while searching Wikipedia."
    );
}

#[tokio::test]
async fn test_wikipedia_unreachable() {
    let base = closed_port();

    assert_eq!(
        wikipedia(&config_with(&base, &base), "rust").await,
        "An unexpected error occurred while searching Wikipedia."
    );
}
