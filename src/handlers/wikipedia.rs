//! Wikipedia summary lookup
//!
//! One `action=query` call: the search generator picks the best-matching
//! article and the extracts module returns its intro cut to whole sentences.
//! Sentence splitting stays on the MediaWiki side, which knows about
//! abbreviations and initials.

use serde::Deserialize;

use crate::config::WikipediaConfig;
use crate::{Error, Result};

/// Wikimedia asks API clients to identify themselves
const USER_AGENT: &str = concat!("astra/", env!("CARGO_PKG_VERSION"), " (voice assistant)");

#[derive(Debug, Deserialize)]
struct QueryResponse {
    query: Option<QueryPages>,
}

#[derive(Debug, Deserialize)]
struct QueryPages {
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    title: String,
    #[serde(default)]
    extract: String,
    #[serde(default)]
    missing: bool,
    pageprops: Option<PageProps>,
}

#[derive(Debug, Deserialize)]
struct PageProps {
    disambiguation: Option<String>,
}

/// Wikipedia client
pub struct WikipediaClient {
    client: reqwest::Client,
    api_url: String,
    sentences: usize,
}

impl WikipediaClient {
    /// Create a client for the configured API endpoint
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: &WikipediaConfig) -> Result<Self> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            sentences: config.sentences,
        })
    }

    /// Summarise the best-matching article in a few sentences
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if nothing matches, [`Error::Disambiguation`] if
    /// the match is a disambiguation page, other errors on request failure
    pub async fn summary(&self, term: &str) -> Result<String> {
        let term = term.trim();
        if term.is_empty() {
            return Err(Error::NotFound("empty search term".to_string()));
        }

        let sentences = self.sentences.to_string();
        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("action", "query"),
                ("format", "json"),
                ("formatversion", "2"),
                ("generator", "search"),
                ("gsrsearch", term),
                ("gsrlimit", "1"),
                ("prop", "extracts|pageprops"),
                ("ppprop", "disambiguation"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("exsentences", sentences.as_str()),
                ("redirects", "1"),
            ])
            .send()
            .await?
            .error_for_status()?;

        let body: QueryResponse = response.json().await?;
        let page = first_page(body).ok_or_else(|| Error::NotFound(term.to_string()))?;
        tracing::debug!(term, title = %page.title, "wikipedia match");

        page_summary(&page)
    }
}

fn first_page(response: QueryResponse) -> Option<Page> {
    response.query?.pages.into_iter().next()
}

fn page_summary(page: &Page) -> Result<String> {
    let disambiguation = page
        .pageprops
        .as_ref()
        .is_some_and(|p| p.disambiguation.is_some());
    if disambiguation {
        return Err(Error::Disambiguation(page.title.clone()));
    }

    let extract = page.extract.trim();
    if page.missing || extract.is_empty() {
        return Err(Error::NotFound(page.title.clone()));
    }
    Ok(extract.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> QueryResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_first_page() {
        let response = parse(
            r#"{"batchcomplete":true,"query":{"pages":[{"pageid":736,"ns":0,"title":"Alan Turing","index":1,"extract":"Alan Turing was a mathematician."}]}}"#,
        );
        let page = first_page(response).unwrap();
        assert_eq!(page.title, "Alan Turing");

        // No search hits: the API omits `query` entirely
        assert!(first_page(parse(r#"{"batchcomplete":true}"#)).is_none());
        assert!(first_page(parse(r#"{"query":{"pages":[]}}"#)).is_none());
    }

    #[test]
    fn test_page_summary() {
        let page = first_page(parse(
            r#"{"query":{"pages":[{"title":"Dr. Dre","extract":"Andre Young, known as Dr. Dre, is an American rapper. He founded Aftermath Entertainment."}]}}"#,
        ))
        .unwrap();
        assert_eq!(
            page_summary(&page).unwrap(),
            "Andre Young, known as Dr. Dre, is an American rapper. He founded Aftermath Entertainment."
        );
    }

    #[test]
    fn test_disambiguation_and_missing() {
        let page = first_page(parse(
            r#"{"query":{"pages":[{"title":"Mercury","extract":"Mercury may refer to:","pageprops":{"disambiguation":""}}]}}"#,
        ))
        .unwrap();
        assert!(matches!(page_summary(&page), Err(Error::Disambiguation(_))));

        let page = first_page(parse(
            r#"{"query":{"pages":[{"title":"Nowhere","missing":true}]}}"#,
        ))
        .unwrap();
        assert!(matches!(page_summary(&page), Err(Error::NotFound(_))));

        let page = first_page(parse(r#"{"query":{"pages":[{"title":"Blank","extract":"  "}]}}"#))
            .unwrap();
        assert!(matches!(page_summary(&page), Err(Error::NotFound(_))));
    }
}
