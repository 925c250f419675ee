//! Configuration file parser for ~/.config/gazette/config.toml.
//!
//! The config file is optional — a missing file yields `Config::default()`.
//! Unknown keys are accepted by serde but logged as warnings, since they are
//! most likely typos.
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid bind address '{0}'")]
    InvalidBind(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Upstream JSON feed generating the newspaper's article list.
pub const DEFAULT_ARTICLES_FEED_URL: &str = "https://politepol.com/fd/Nf0d2zuxXs0H.json";

/// Upstream JSON feed generating the obituary list.
pub const DEFAULT_OBITUARIES_FEED_URL: &str = "https://politepol.com/fd/rY91oXqaJXTF.json";

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address the proxy listens on in `serve` mode.
    pub bind: String,

    /// Upstream feed for the Articles tab.
    pub articles_feed_url: String,

    /// Upstream feed for the Obituaries tab.
    pub obituaries_feed_url: String,

    /// Title prefix removed from obituary items ("Avis de décès : Jean X" → "Jean X").
    pub obituary_title_prefix: String,

    /// User-Agent sent to upstream servers.
    pub user_agent: String,

    /// Maximum accepted upstream response size in bytes.
    pub max_body_bytes: usize,

    /// Upstream request timeout in seconds. 0 = no timeout.
    pub upstream_timeout_secs: u64,

    /// Let `readability` / `fetch-content` fetch loopback and private hosts.
    pub allow_private_targets: bool,

    /// Proxy used by the terminal client. None = start an embedded proxy.
    pub api_base_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
            articles_feed_url: DEFAULT_ARTICLES_FEED_URL.to_string(),
            obituaries_feed_url: DEFAULT_OBITUARIES_FEED_URL.to_string(),
            obituary_title_prefix: "Avis de décès".to_string(),
            user_agent: concat!("gazette/", env!("CARGO_PKG_VERSION")).to_string(),
            max_body_bytes: 10 * 1024 * 1024,
            upstream_timeout_secs: 0,
            allow_private_targets: false,
            api_base_url: None,
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 9] = [
        "bind",
        "articles_feed_url",
        "obituaries_feed_url",
        "obituary_title_prefix",
        "user_agent",
        "max_body_bytes",
        "upstream_timeout_secs",
        "allow_private_targets",
        "api_base_url",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(path = %path.display(), bind = %config.bind, "Loaded configuration");
        Ok(config)
    }

    /// Parsed form of [`Config::bind`].
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .parse()
            .map_err(|_| ConfigError::InvalidBind(self.bind.clone()))
    }

    /// Upstream timeout, or `None` when requests may wait indefinitely.
    pub fn upstream_timeout(&self) -> Option<Duration> {
        (self.upstream_timeout_secs > 0).then(|| Duration::from_secs(self.upstream_timeout_secs))
    }
}

// ============================================================================
// Tests
// ============================================================================
