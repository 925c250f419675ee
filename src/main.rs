use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

use gazette::app::{App, AppEvent};
use gazette::client::ApiClient;
use gazette::config::Config;
use gazette::status::StatusBook;
use gazette::store::SqliteStore;
use gazette::ui;
use gazette::view::parse_reader_path;
use gazette::web::WebServer;

/// Get the config directory path (~/.config/gazette/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("gazette"))
}

fn ensure_private_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory '{}'", dir.display()))?;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        match std::fs::metadata(dir) {
            Ok(metadata) => {
                let mut perms = metadata.permissions();
                perms.set_mode(0o700);
                if let Err(e) = std::fs::set_permissions(dir, perms) {
                    tracing::warn!(
                        path = %dir.display(),
                        error = %e,
                        "Failed to set directory permissions to 0700"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(path = %dir.display(), error = %e, "Failed to read directory metadata");
            }
        }
    }
    Ok(())
}

#[derive(Parser, Debug)]
#[command(name = "gazette", about = "Autun Infos reader: JSON proxy and terminal client")]
struct Cli {
    /// Configuration file (default: ~/.config/gazette/config.toml)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Client state database (default: ~/.config/gazette/state.db)
    #[arg(long, value_name = "FILE", global = true)]
    state: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Browse the feeds in the terminal (default)
    Read {
        /// Proxy base URL; an embedded proxy is started when absent
        #[arg(long, value_name = "URL")]
        api: Option<String>,

        /// Open this article on start, as a URL or a /reader/... path
        #[arg(long, value_name = "TARGET")]
        open: Option<String>,
    },
    /// Run the JSON proxy
    Serve {
        /// Listen address, overriding the config file
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_dir = get_config_dir()?;
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));

    match cli.command {
        Some(Commands::Serve { bind }) => {
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
                )
                .init();

            let mut config = Config::load(&config_path)
                .with_context(|| format!("Failed to load config '{}'", config_path.display()))?;
            if let Some(bind) = bind {
                config.bind = bind;
            }
            WebServer::new(config)
                .context("Failed to configure proxy")?
                .run()
                .await
                .context("Proxy server failed")?;
            Ok(())
        }
        command => {
            // The terminal owns stdout; logs go to stderr and only on request.
            if std::env::var_os("RUST_LOG").is_some() {
                tracing_subscriber::fmt()
                    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
                    .with_writer(std::io::stderr)
                    .init();
            }

            let (api, open) = match command {
                Some(Commands::Read { api, open }) => (api, open),
                _ => (None, None),
            };
            let config = Config::load(&config_path)
                .with_context(|| format!("Failed to load config '{}'", config_path.display()))?;
            let state_path = match cli.state {
                Some(path) => path,
                None => {
                    ensure_private_dir(&config_dir)?;
                    config_dir.join("state.db")
                }
            };
            read(config, &state_path, api, open).await
        }
    }
}

async fn read(
    config: Config,
    state_path: &Path,
    api: Option<String>,
    open: Option<String>,
) -> Result<()> {
    let base_url = match api.or_else(|| config.api_base_url.clone()) {
        Some(url) => url,
        None => {
            let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, 0));
            let local = WebServer::with_addr(config.clone(), addr)
                .context("Failed to configure embedded proxy")?
                .spawn()
                .await
                .context("Failed to start embedded proxy")?;
            format!("http://{}/", local)
        }
    };

    let http = reqwest::Client::builder()
        .user_agent(config.user_agent.as_str())
        .build()
        .context("Failed to build HTTP client")?;
    let api = ApiClient::new(http, &base_url)
        .with_context(|| format!("Invalid proxy URL '{}'", base_url))?;

    let state_path = state_path
        .to_str()
        .context("State path is not valid UTF-8")?;
    let store = SqliteStore::open(state_path)
        .await
        .with_context(|| format!("Failed to open state database '{}'", state_path))?;
    let status = StatusBook::load(store.clone())
        .await
        .context("Failed to load client state")?;

    let mut app = App::new(api, store, status);
    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(64);

    ui::spawn_visit(&mut app, &event_tx);

    if let Some(target) = open {
        let url = if target.starts_with('/') {
            parse_reader_path(&target)
                .with_context(|| format!("Not a reader path: '{}'", target))?
        } else {
            target
        };
        ui::spawn_article_load(&mut app, &url, &event_tx);
    }

    ui::run(&mut app, event_tx, event_rx).await
}
