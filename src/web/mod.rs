//! JSON proxy in front of the feed generator and the newspaper's pages.
//!
//! | Route | Success body | Error |
//! |---|---|---|
//! | `GET /api/rss` | articles feed document | 500 `Error fetching RSS` |
//! | `GET /api/obituaries` | obituary feed, titles stripped | 500 `Error fetching obituaries` |
//! | `GET /api/readability?url=` | `{title, content, byline}` | 400 `URL is required`, 500 `Error fetching or parsing content` |
//! | `GET /api/fetch-content?url=` | `{content}` | 400 `URL is required`, 500 `Error fetching content` |
//!
//! Handlers share no mutable state.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;

pub use error::{ApiError, ErrorBody};
pub use router::create_router;
pub use server::{ServerError, WebServer};
pub use state::AppState;
