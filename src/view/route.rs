//! Deep-link paths of the reader view.

use url::form_urlencoded;

const READER_PREFIX: &str = "/reader/";

/// `/reader/<url-encoded article URL>`
pub fn reader_path(article_url: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(article_url.as_bytes()).collect();
    format!("{READER_PREFIX}{encoded}")
}

/// Inverse of [`reader_path`]. `None` for other paths or an empty target.
pub fn parse_reader_path(path: &str) -> Option<String> {
    let encoded = path.strip_prefix(READER_PREFIX)?;
    if encoded.is_empty() {
        return None;
    }
    // The encoded segment carries no raw '&' or '=', so it decodes as a
    // single bare key.
    let (decoded, _) = form_urlencoded::parse(encoded.as_bytes()).next()?;
    Some(decoded.into_owned()).filter(|url| !url.is_empty())
}
