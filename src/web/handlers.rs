//! Proxy endpoint handlers.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::content::{fetch_article, fetch_fragment, Article, ContentFragment};
use crate::feed::{fetch_feed, mark_obituaries, FeedDocument};
use crate::web::error::ApiError;
use crate::web::state::AppState;

pub const RSS_ERROR: &str = "Error fetching RSS";
pub const OBITUARIES_ERROR: &str = "Error fetching obituaries";
pub const READABILITY_ERROR: &str = "Error fetching or parsing content";
pub const FETCH_CONTENT_ERROR: &str = "Error fetching content";
pub const URL_REQUIRED: &str = "URL is required";

/// `?url=` of the page endpoints.
#[derive(Debug, Deserialize)]
pub struct UrlQuery {
    pub url: Option<String>,
}

impl UrlQuery {
    fn required(self) -> Result<String, ApiError> {
        self.url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ApiError::bad_request(URL_REQUIRED))
    }
}

/// GET /api/rss - Articles feed document, relayed as decoded.
pub async fn rss(State(state): State<Arc<AppState>>) -> Result<Json<FeedDocument>, ApiError> {
    let doc = fetch_feed(
        &state.client,
        &state.config.articles_feed_url,
        state.config.max_body_bytes,
    )
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch articles feed");
        ApiError::internal(RSS_ERROR)
    })?;

    Ok(Json(doc))
}

/// GET /api/obituaries - Obituary feed with titles stripped and items flagged.
pub async fn obituaries(
    State(state): State<Arc<AppState>>,
) -> Result<Json<FeedDocument>, ApiError> {
    let mut doc = fetch_feed(
        &state.client,
        &state.config.obituaries_feed_url,
        state.config.max_body_bytes,
    )
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch obituaries feed");
        ApiError::internal(OBITUARIES_ERROR)
    })?;

    mark_obituaries(&mut doc, &state.config.obituary_title_prefix);
    Ok(Json(doc))
}

/// GET /api/readability?url= - Readable article extracted from a page.
pub async fn readability(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UrlQuery>,
) -> Result<Json<Article>, ApiError> {
    let url = query.required()?;

    let article = fetch_article(&state.client, &url, state.page_options())
        .await
        .map_err(|e| {
            tracing::error!(url = %url, error = %e, "Failed to extract article");
            ApiError::internal(READABILITY_ERROR)
        })?;

    Ok(Json(article))
}

/// GET /api/fetch-content?url= - Main content fragment of a page.
pub async fn fetch_content(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UrlQuery>,
) -> Result<Json<ContentFragment>, ApiError> {
    let url = query.required()?;

    let fragment = fetch_fragment(&state.client, &url, state.page_options())
        .await
        .map_err(|e| {
            tracing::error!(url = %url, error = %e, "Failed to fetch content");
            ApiError::internal(FETCH_CONTENT_ERROR)
        })?;

    Ok(Json(fragment))
}

/// GET /health
pub async fn health() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_query_required() {
        let ok = UrlQuery {
            url: Some(" https://www.autun-infos.com/a ".to_string()),
        };
        assert_eq!(ok.required().unwrap(), "https://www.autun-infos.com/a");

        for missing in [None, Some(String::new()), Some("   ".to_string())] {
            let err = UrlQuery { url: missing }.required().unwrap_err();
            assert_eq!(err.message(), URL_REQUIRED);
            assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
        }
    }
}
