//! Utility functions shared by the proxy and the terminal client.
//!
//! - **URL validation**: scheme and host checks before fetching or opening a URL
//! - **Body limits**: size-capped reading of upstream HTTP responses
//! - **Text processing**: sanitizing upstream text and width-aware truncation

mod body;
mod text;
mod url_validator;

pub use body::{read_limited_bytes, read_limited_text, BodyError};
pub use text::{collapse_whitespace, sanitize_text, truncate_to_width};
pub use url_validator::{validate_url, validate_url_for_open, UrlValidationError};

/// Maximum allowed search query length in the feed view.
pub const MAX_SEARCH_QUERY_LENGTH: usize = 256;
