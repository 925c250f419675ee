//! Article content from the newspaper's web pages.
//!
//! - [`extract`] - readability extraction into `{title, content, byline}`
//! - [`fragment`] - cruder main-content fragment (`main` → `article` → `body`)
//!
//! Both start from [`fetch_page`], a single size-capped GET of the target URL.

mod extract;
mod fragment;

pub use extract::{extract_article, Article};
pub use fragment::{main_fragment, ContentFragment};

use crate::util::{read_limited_text, validate_url, BodyError, UrlValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("URL rejected: {0}")]
    InvalidUrl(#[from] UrlValidationError),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("Body error: {0}")]
    Body(#[from] BodyError),
    #[error("Extraction failed: {0}")]
    Extraction(String),
    #[error("Unable to parse article")]
    NoArticle,
    #[error("Extraction task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Limits applied when fetching a page on a client's behalf.
#[derive(Debug, Clone, Copy)]
pub struct PageFetchOptions {
    pub max_body_bytes: usize,
    pub allow_private_targets: bool,
}

/// Fetch the raw HTML of `url`.
pub async fn fetch_page(
    client: &reqwest::Client,
    url: &str,
    opts: PageFetchOptions,
) -> Result<String, ContentError> {
    let target = validate_url(url, opts.allow_private_targets)?;
    tracing::debug!(url = %target, "Fetching page");

    let response = client.get(target).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ContentError::HttpStatus(status.as_u16()));
    }

    Ok(read_limited_text(response, opts.max_body_bytes).await?)
}

/// Fetch `url` and run readability extraction on it.
///
/// Parsing runs on the blocking pool; large pages take long enough to stall
/// the request loop otherwise.
pub async fn fetch_article(
    client: &reqwest::Client,
    url: &str,
    opts: PageFetchOptions,
) -> Result<Article, ContentError> {
    let html = fetch_page(client, url, opts).await?;
    let url = url.to_string();
    tokio::task::spawn_blocking(move || extract_article(&html, &url)).await?
}

/// Fetch `url` and reduce it to its main content fragment.
pub async fn fetch_fragment(
    client: &reqwest::Client,
    url: &str,
    opts: PageFetchOptions,
) -> Result<ContentFragment, ContentError> {
    let html = fetch_page(client, url, opts).await?;
    let content = tokio::task::spawn_blocking(move || main_fragment(&html)).await?;
    Ok(ContentFragment { content })
}
