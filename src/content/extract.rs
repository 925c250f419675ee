use dom_smoothie::{Config, Readability};
use serde::{Deserialize, Serialize};

use super::ContentError;

/// Readable form of a web page: what the reader view displays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    /// Cleaned HTML body.
    pub content: String,
    pub byline: Option<String>,
}

/// Run readability extraction on a raw HTML page.
///
/// `url` resolves relative links in the extracted body. A page where the
/// algorithm finds no main content is an error, not an empty article.
pub fn extract_article(html: &str, url: &str) -> Result<Article, ContentError> {
    let cfg = Config {
        max_elements_to_parse: 9000,
        ..Default::default()
    };

    let mut readability = Readability::new(html, Some(url), Some(cfg))
        .map_err(|e| ContentError::Extraction(e.to_string()))?;
    let article = readability
        .parse()
        .map_err(|e| ContentError::Extraction(e.to_string()))?;

    let content = article.content.to_string();
    if content.trim().is_empty() {
        return Err(ContentError::NoArticle);
    }

    Ok(Article {
        title: article.title.trim().to_string(),
        content,
        byline: article
            .byline
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty()),
    })
}
