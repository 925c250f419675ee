use reqwest::redirect::Policy;

use crate::config::Config;
use crate::content::PageFetchOptions;
use crate::util::validate_url;

/// Maximum redirects followed for one upstream request.
const MAX_REDIRECTS: usize = 3;

/// Shared, read-only state of the proxy handlers.
pub struct AppState {
    pub config: Config,
    pub client: reqwest::Client,
}

impl AppState {
    /// Build the upstream HTTP client from the configuration.
    ///
    /// No request timeout unless `upstream_timeout_secs` is set.
    pub fn new(config: Config) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .redirect(redirect_policy(config.allow_private_targets));
        if let Some(timeout) = config.upstream_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        Ok(Self { config, client })
    }

    pub fn page_options(&self) -> PageFetchOptions {
        PageFetchOptions {
            max_body_bytes: self.config.max_body_bytes,
            allow_private_targets: self.config.allow_private_targets,
        }
    }
}

/// Redirect policy of the upstream client.
///
/// Every hop is validated like the initial target, so a public page cannot
/// bounce the proxy onto an internal host. At most [`MAX_REDIRECTS`] hops,
/// loops are refused.
fn redirect_policy(allow_private: bool) -> Policy {
    Policy::custom(move |attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            return attempt.error(format!("Too many redirects (max {})", MAX_REDIRECTS));
        }

        let url = attempt.url();
        if attempt.previous().iter().any(|prev| prev == url) {
            return attempt.error("Redirect loop detected");
        }

        if let Err(e) = validate_url(url.as_str(), allow_private) {
            tracing::warn!(to = %url, error = %e, "Refusing redirect");
            return attempt.error(e);
        }

        tracing::debug!(
            from = %attempt.previous().last().map(|u| u.as_str()).unwrap_or("initial"),
            to = %url,
            hop = attempt.previous().len() + 1,
            "Following redirect"
        );
        attempt.follow()
    })
}
