use futures::stream::{self, StreamExt, TryStreamExt};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use thiserror::Error;

use crate::category::{self, CategoryId};
use crate::news::types::{FullStory, NewsResponse, Story};
use crate::util::{validate_url, UrlError};

/// Maximum concurrent category queries during a trending fan-out.
const MAX_CONCURRENT_QUERIES: usize = 10;

/// Per-request timeout. One hung category must not wedge a whole batch.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Cap on raw story page bodies (full pages, not API responses).
const MAX_PAGE_SIZE: usize = 5 * 1024 * 1024; // 5MB

/// Trending results per category; search results per query.
const TRENDING_PAGE_SIZE: u32 = 20;
const SEARCH_PAGE_SIZE: u32 = 30;

#[derive(Debug, Error)]
pub enum NewsError {
    #[error("Request timed out after 20s")]
    Timeout,
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// The provider answered but flagged the request as failed; carries the
    /// provider's own message. Callers surface a generic retry string, never
    /// this text.
    #[error("Provider rejected the request: {0}")]
    Provider(String),
    #[error("Unknown category id {0}")]
    UnknownCategory(CategoryId),
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    #[error("Invalid UTF-8 in response")]
    InvalidUtf8,
    #[error("Invalid story URL: {0}")]
    InvalidUrl(#[from] UrlError),
}

/// What a trending fan-out does when one category's query fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// First failing category aborts the whole batch.
    Strict,
    /// Failing categories are logged and dropped; the rest merge normally.
    Partial,
}

/// Client for the news provider's article-search API.
pub struct NewsClient {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

impl NewsClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, api_key: SecretString) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key,
        }
    }

    /// Fetches trending stories for the given categories.
    ///
    /// Issues one query per category id, concurrently but merged
    /// category-major in input order, each call's internal order preserved.
    /// An empty `ids` list returns immediately without touching the network.
    pub async fn fetch_trending(
        &self,
        ids: &[CategoryId],
        page: u32,
        policy: FailurePolicy,
    ) -> Result<Vec<Story>, NewsError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let queries = stream::iter(ids.iter().copied())
            .map(|id| self.query_category(id, page))
            .buffered(MAX_CONCURRENT_QUERIES);

        let merged = match policy {
            FailurePolicy::Strict => {
                let chunks: Vec<Vec<Story>> = queries.try_collect().await?;
                chunks.into_iter().flatten().collect()
            }
            FailurePolicy::Partial => {
                let chunks: Vec<Result<Vec<Story>, NewsError>> = queries.collect().await;
                chunks
                    .into_iter()
                    .zip(ids)
                    .filter_map(|(result, id)| match result {
                        Ok(stories) => Some(stories),
                        Err(e) => {
                            tracing::warn!(category = *id, error = %e, "Dropping failed category from trending batch");
                            None
                        }
                    })
                    .flatten()
                    .collect()
            }
        };

        Ok(merged)
    }

    /// Free-text search, sorted by relevance. Results carry no category.
    pub async fn search_stories(&self, query: &str, page: u32) -> Result<Vec<Story>, NewsError> {
        self.everything(query, SEARCH_PAGE_SIZE, page, "relevancy", None)
            .await
    }

    /// Fetches raw page markup for a story URL.
    ///
    /// No parsing and no content-type validation: the body goes straight to
    /// the tidy/summarize path, which tolerates anything text-shaped.
    pub async fn get_full_story(&self, url: &str) -> Result<FullStory, NewsError> {
        let parsed = validate_url(url)?;

        let response = tokio::time::timeout(REQUEST_TIMEOUT, self.client.get(parsed).send())
            .await
            .map_err(|_| NewsError::Timeout)?
            .map_err(NewsError::Network)?;

        if !response.status().is_success() {
            return Err(NewsError::HttpStatus(response.status().as_u16()));
        }

        let html = read_limited_text(response, MAX_PAGE_SIZE).await?;
        Ok(FullStory {
            html,
            source_url: url.to_string(),
        })
    }

    async fn query_category(&self, id: CategoryId, page: u32) -> Result<Vec<Story>, NewsError> {
        let cat = category::by_id(id).ok_or(NewsError::UnknownCategory(id))?;
        self.everything(cat.keywords, TRENDING_PAGE_SIZE, page, "publishedAt", Some(id))
            .await
    }

    /// One call against the provider's `everything` endpoint.
    async fn everything(
        &self,
        q: &str,
        page_size: u32,
        page: u32,
        sort_by: &str,
        category: Option<CategoryId>,
    ) -> Result<Vec<Story>, NewsError> {
        let request = self
            .client
            .get(format!("{}/everything", self.base_url))
            .query(&[
                ("q", q.to_string()),
                ("language", "en".to_string()),
                ("pageSize", page_size.to_string()),
                ("page", page.to_string()),
                ("sortBy", sort_by.to_string()),
                ("apiKey", self.api_key.expose_secret().to_string()),
            ]);

        let response = tokio::time::timeout(REQUEST_TIMEOUT, request.send())
            .await
            .map_err(|_| NewsError::Timeout)?
            .map_err(NewsError::Network)?;

        if !response.status().is_success() {
            return Err(NewsError::HttpStatus(response.status().as_u16()));
        }

        let body: NewsResponse = response.json().await.map_err(NewsError::Network)?;
        if body.status != "ok" {
            return Err(NewsError::Provider(
                body.message.unwrap_or_else(|| body.status.clone()),
            ));
        }

        Ok(body
            .articles
            .into_iter()
            .map(|a| a.into_story(category))
            .collect())
    }
}

async fn read_limited_text(response: reqwest::Response, limit: usize) -> Result<String, NewsError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(NewsError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(NewsError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(NewsError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    String::from_utf8(bytes).map_err(|_| NewsError::InvalidUtf8)
}
