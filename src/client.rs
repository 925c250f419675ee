//! Typed client of the proxy endpoints, used by the terminal reader.

use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use crate::content::{Article, ContentFragment};
use crate::feed::FeedDocument;
use crate::web::ErrorBody;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// Non-2xx answer; `message` is the proxy's `error` field when present.
    #[error("HTTP {status}: {message}")]
    Api { status: u16, message: String },
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
}

impl ApiClient {
    /// Client for the proxy rooted at `base_url` (e.g. `http://127.0.0.1:3000`).
    pub fn new(http: reqwest::Client, base_url: &str) -> Result<Self, ClientError> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { http, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub async fn articles(&self) -> Result<FeedDocument, ClientError> {
        self.get_json("api/rss", None).await
    }

    pub async fn obituaries(&self) -> Result<FeedDocument, ClientError> {
        self.get_json("api/obituaries", None).await
    }

    pub async fn article(&self, url: &str) -> Result<Article, ClientError> {
        self.get_json("api/readability", Some(url)).await
    }

    pub async fn content(&self, url: &str) -> Result<ContentFragment, ClientError> {
        self.get_json("api/fetch-content", Some(url)).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        target: Option<&str>,
    ) -> Result<T, ClientError> {
        let mut url = self.base.join(endpoint)?;
        if let Some(target) = target {
            url.query_pairs_mut().append_pair("url", target);
        }

        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ErrorBody>().await {
                Ok(body) => body.error,
                Err(_) => status.canonical_reason().unwrap_or("error").to_string(),
            };
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}
