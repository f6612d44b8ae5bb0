use thiserror::Error;
use url::Url;

/// Errors from story-URL validation.
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("URL could not be parsed")]
    Unparseable,
    #[error("URL scheme must be http or https, got {0}")]
    BadScheme(String),
    #[error("URL has no host")]
    NoHost,
}

/// Validates a story URL before a request is built from it.
///
/// Only scheme and host presence are checked: story URLs come from the news
/// provider and point at arbitrary public sites, so there is no allowlist to
/// enforce. Rejecting `javascript:`, `file:` and friends up front keeps
/// obviously broken provider data from reaching the HTTP client.
pub fn validate_url(raw: &str) -> Result<Url, UrlError> {
    let url = Url::parse(raw).map_err(|_| UrlError::Unparseable)?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(UrlError::BadScheme(other.to_string())),
    }
    if url.host_str().is_none() {
        return Err(UrlError::NoHost);
    }
    Ok(url)
}
