use serde::{Deserialize, Serialize};

use crate::category::CategoryId;

/// The provider's ellipsis marker denoting truncated `content` fields.
const TRUNCATION_MARKER: char = '…';

/// Normalized article record surfaced to callers.
///
/// `id` is the source URL, which doubles as identity: saved lists deduplicate
/// on it. Instances are ephemeral, recreated on every fetch, except when
/// serialized into a user's saved-article partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub url: String,
    pub image: Option<String>,
    /// `None` for search results; trending results carry the queried id.
    pub category: Option<CategoryId>,
}

/// Raw page markup for later tidying and summarization.
#[derive(Debug, Clone)]
pub struct FullStory {
    pub html: String,
    pub source_url: String,
}

// ============================================================================
// Provider wire shapes
// ============================================================================

/// One article as the news provider returns it. Every field except `url` may
/// be missing or null in practice.
#[derive(Debug, Deserialize)]
pub(crate) struct RawArticle {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub url: String,
    #[serde(rename = "urlToImage")]
    pub url_to_image: Option<String>,
}

/// Envelope of the provider's `everything` endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct NewsResponse {
    pub status: String,
    #[serde(default)]
    pub articles: Vec<RawArticle>,
    pub message: Option<String>,
}

impl RawArticle {
    /// Normalizes a raw article into a [`Story`].
    ///
    /// `title` defaults to `"Untitled"`. `summary` prefers the provider
    /// description; otherwise the prefix of `content` up to the provider's
    /// truncation marker, with the marker re-appended; otherwise empty.
    pub(crate) fn into_story(self, category: Option<CategoryId>) -> Story {
        let summary = match self.description {
            Some(d) if !d.is_empty() => d,
            _ => match self.content {
                Some(c) if !c.is_empty() => {
                    let lead = c.split(TRUNCATION_MARKER).next().unwrap_or("");
                    format!("{lead}{TRUNCATION_MARKER}")
                }
                _ => String::new(),
            },
        };

        Story {
            id: self.url.clone(),
            title: self
                .title
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "Untitled".to_string()),
            summary,
            url: self.url,
            image: self.url_to_image,
            category,
        }
    }
}
