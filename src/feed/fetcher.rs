use crate::feed::types::FeedDocument;
use crate::util::{read_limited_bytes, BodyError};
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use thiserror::Error;
use url::Url;

/// Query parameter carrying the cache-busting timestamp.
const CACHE_BUST_PARAM: &str = "_";

/// Errors that can occur while fetching a feed document.
///
/// The proxy collapses all of them into one error response; the variants
/// exist for logging.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, timeout)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error! status: {0}")]
    HttpStatus(u16),
    /// The configured feed URL does not parse
    #[error("Invalid feed URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// Body could not be read within the size limit
    #[error("Body error: {0}")]
    Body(#[from] BodyError),
    /// Body is not a JSON feed document
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Append the cache-busting `_=<millis>` parameter to `feed_url`.
///
/// Existing query parameters are kept.
pub fn cache_busted_url(feed_url: &str, now_millis: i64) -> Result<Url, FetchError> {
    let mut url = Url::parse(feed_url)?;
    url.query_pairs_mut()
        .append_pair(CACHE_BUST_PARAM, &now_millis.to_string());
    Ok(url)
}

/// Fetch and decode a JSON feed document, bypassing upstream caches.
///
/// One attempt only: the caller decides what a failure means. The request
/// carries `Cache-Control: no-cache` and `Pragma: no-cache` and a timestamp
/// parameter so the feed generator regenerates the document instead of
/// serving a stale copy. Items without ids receive deterministic fallbacks.
///
/// # Errors
///
/// - [`FetchError::Network`] - Connection, TLS or client timeout errors
/// - [`FetchError::HttpStatus`] - Non-2xx HTTP response
/// - [`FetchError::Body`] - Body over `max_body_bytes`
/// - [`FetchError::Parse`] - Body is not a feed document
pub async fn fetch_feed(
    client: &reqwest::Client,
    feed_url: &str,
    max_body_bytes: usize,
) -> Result<FeedDocument, FetchError> {
    let url = cache_busted_url(feed_url, chrono::Utc::now().timestamp_millis())?;
    tracing::debug!(url = %url, "Fetching feed");

    let response = client
        .get(url)
        .header(CACHE_CONTROL, "no-cache")
        .header(PRAGMA, "no-cache")
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::HttpStatus(status.as_u16()));
    }

    let bytes = read_limited_bytes(response, max_body_bytes).await?;
    let mut doc: FeedDocument = serde_json::from_slice(&bytes)?;
    doc.ensure_ids();

    tracing::debug!(items = doc.items.len(), "Feed decoded");
    Ok(doc)
}
