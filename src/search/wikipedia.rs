//! Wikipedia Client
//!
//! Looks topics up through the MediaWiki action API:
//! 1. `list=search` finds the best matching page titles
//! 2. `prop=extracts` fetches the plain-text intro of each page
//!
//! Results are formatted as `Page: <title>\nSummary: <intro>`, joined by a
//! blank line, and cut to a fixed character budget so the agent gets a short
//! grounding snippet rather than a whole article.

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::WikipediaConfig;
use crate::utils::truncate_chars;

/// Longest query forwarded to the search endpoint, in characters
pub const MAX_QUERY_CHARS: usize = 300;

/// Errors that can occur during a lookup
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Empty search query")]
    EmptyQuery,

    #[error("Search request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse search results: {0}")]
    ParseError(String),

    #[error("No good Wikipedia search result was found")]
    NoResults,
}

impl From<reqwest::Error> for SearchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            SearchError::ParseError(e.to_string())
        } else {
            SearchError::RequestFailed(e.to_string())
        }
    }
}

/// A page found for a query
#[derive(Debug, Clone, PartialEq)]
pub struct WikiPage {
    pub title: String,
    pub summary: String,
}

impl WikiPage {
    fn format(&self) -> String {
        format!("Page: {}\nSummary: {}", self.title, self.summary)
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    query: Option<SearchQuery>,
}

#[derive(Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Deserialize)]
struct ExtractResponse {
    query: Option<ExtractQuery>,
}

#[derive(Deserialize)]
struct ExtractQuery {
    #[serde(default)]
    pages: Vec<ExtractPage>,
}

#[derive(Deserialize)]
struct ExtractPage {
    title: String,
    #[serde(default)]
    extract: Option<String>,
    #[serde(default)]
    missing: bool,
}

/// Client for Wikipedia lookups
#[derive(Clone)]
pub struct WikipediaClient {
    client: Client,
    api_url: String,
    top_k_results: usize,
    doc_content_chars_max: usize,
}

impl WikipediaClient {
    pub fn new(config: &WikipediaConfig) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("expert-chat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SearchError::RequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            top_k_results: config.top_k_results.max(1),
            doc_content_chars_max: config.doc_content_chars_max,
        })
    }

    /// Look a query up and return the formatted, truncated result text
    pub async fn run(&self, query: &str) -> Result<String, SearchError> {
        let pages = self.search_pages(query).await?;
        let joined = pages
            .iter()
            .map(WikiPage::format)
            .collect::<Vec<_>>()
            .join("\n\n");

        Ok(truncate_chars(&joined, self.doc_content_chars_max))
    }

    /// Search and fetch the summaries of the top matching pages
    pub async fn search_pages(&self, query: &str) -> Result<Vec<WikiPage>, SearchError> {
        let query = truncate_chars(query.trim(), MAX_QUERY_CHARS);
        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        info!(query = %query, "Searching Wikipedia");

        let limit = self.top_k_results.to_string();
        let response: SearchResponse = self
            .client
            .get(&self.api_url)
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query.as_str()),
                ("srlimit", limit.as_str()),
                ("format", "json"),
                ("formatversion", "2"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let titles: Vec<String> = response
            .query
            .map(|q| q.search)
            .unwrap_or_default()
            .into_iter()
            .take(self.top_k_results)
            .map(|hit| hit.title)
            .collect();

        if titles.is_empty() {
            return Err(SearchError::NoResults);
        }

        let mut pages = Vec::new();
        for title in &titles {
            if let Some(page) = self.fetch_summary(title).await? {
                pages.push(page);
            }
        }

        if pages.is_empty() {
            return Err(SearchError::NoResults);
        }

        debug!(count = pages.len(), "Wikipedia lookup completed");
        Ok(pages)
    }

    async fn fetch_summary(&self, title: &str) -> Result<Option<WikiPage>, SearchError> {
        let response: ExtractResponse = self
            .client
            .get(&self.api_url)
            .query(&[
                ("action", "query"),
                ("prop", "extracts"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("titles", title),
                ("format", "json"),
                ("formatversion", "2"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let page = response
            .query
            .and_then(|q| q.pages.into_iter().next())
            .filter(|p| !p.missing);

        Ok(page.and_then(|p| {
            let summary = p.extract.unwrap_or_default().trim().to_string();
            if summary.is_empty() {
                None
            } else {
                Some(WikiPage {
                    title: p.title,
                    summary,
                })
            }
        }))
    }
}
