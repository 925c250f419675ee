//! Feed documents from the upstream feed generator.
//!
//! - [`types`] - `FeedItem` / `FeedDocument` with pass-through of unknown fields
//! - [`fetcher`] - cache-busting fetch of a JSON feed document
//! - [`obituary`] - title prefix stripping and obituary flagging

mod fetcher;
mod obituary;
mod types;

pub use fetcher::{cache_busted_url, fetch_feed, FetchError};
pub use obituary::{mark_obituaries, strip_title_prefix};
pub use types::{parse_published, ExtraFields, FeedDocument, FeedItem};
