//! HTTP server hosting the proxy.

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{Config, ConfigError};

use super::router::create_router;
use super::state::AppState;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Web server for the proxy endpoints.
pub struct WebServer {
    addr: SocketAddr,
    app_state: Arc<AppState>,
}

impl WebServer {
    /// Server bound to the configured `bind` address.
    pub fn new(config: Config) -> Result<Self, ServerError> {
        let addr = config.bind_addr()?;
        Self::with_addr(config, addr)
    }

    /// Server bound to `addr`, ignoring the configured address.
    pub fn with_addr(config: Config, addr: SocketAddr) -> Result<Self, ServerError> {
        Ok(Self {
            addr,
            app_state: Arc::new(AppState::new(config)?),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Run the server until the listener fails.
    pub async fn run(self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!("Proxy listening on http://{}", local_addr);

        axum::serve(listener, create_router(self.app_state)).await?;
        Ok(())
    }

    /// Bind, serve in a background task and return the bound address.
    ///
    /// Binding to port 0 picks a free port, which is how the terminal reader
    /// embeds its own proxy.
    pub async fn spawn(self) -> Result<SocketAddr, ServerError> {
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;
        tracing::debug!("Embedded proxy listening on http://{}", local_addr);

        let router = create_router(self.app_state);
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!(error = %e, "Proxy server error");
            }
        });

        Ok(local_addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_bad_bind() {
        let config = Config {
            bind: "not an address".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            WebServer::new(config),
            Err(ServerError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_spawn_serves_health() {
        let server = WebServer::with_addr(Config::default(), ([127, 0, 0, 1], 0).into()).unwrap();
        let addr = server.spawn().await.unwrap();
        assert_ne!(addr.port(), 0);

        let body = reqwest::get(format!("http://{}/health", addr))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "OK");
    }
}
