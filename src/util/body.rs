use encoding_rs::{Encoding, UTF_8};
use futures::StreamExt;
use regex::bytes::Regex;
use reqwest::header::CONTENT_TYPE;
use std::sync::LazyLock;
use thiserror::Error;

/// Errors raised while reading an upstream response body.
#[derive(Debug, Error)]
pub enum BodyError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Response too large (exceeds {0} bytes)")]
    TooLarge(usize),
}

/// `<meta charset="...">` or the `http-equiv` form, within the sniffed prefix.
static META_CHARSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?([a-z0-9_.:\-]+)"#).expect("static regex")
});

/// How much of an HTML body is searched for a `<meta>` charset.
const META_SNIFF_BYTES: usize = 1024;

/// Read a response body into memory, failing once it exceeds `limit` bytes.
///
/// The `Content-Length` header is checked first so oversized bodies are
/// rejected before any chunk is read; the streamed size is enforced as well
/// because the header can be absent or wrong.
pub async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, BodyError> {
    if let Some(len) = response.content_length() {
        if len > limit as u64 {
            return Err(BodyError::TooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(BodyError::TooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}

/// Like [`read_limited_bytes`], decoding the body to text.
///
/// The charset comes from the `Content-Type` header, else from a `<meta>`
/// tag near the top of the document, else UTF-8. Malformed sequences become
/// U+FFFD instead of failing the request.
pub async fn read_limited_text(
    response: reqwest::Response,
    limit: usize,
) -> Result<String, BodyError> {
    let header_charset = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(charset_param)
        .map(str::to_owned);
    let bytes = read_limited_bytes(response, limit).await?;
    Ok(decode_text(&bytes, header_charset.as_deref()))
}

/// `charset` parameter of a `Content-Type` value.
fn charset_param(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(|c: char| c == '"' || c == '\''))
            .filter(|v| !v.is_empty())
    })
}

/// Decode `bytes` using `charset`, a sniffed `<meta>` charset, or UTF-8.
///
/// A byte-order mark wins over all of them.
pub fn decode_text(bytes: &[u8], charset: Option<&str>) -> String {
    let sniffed = || {
        let head = &bytes[..bytes.len().min(META_SNIFF_BYTES)];
        META_CHARSET
            .captures(head)
            .and_then(|caps| Encoding::for_label(&caps[1]))
    };
    let encoding = charset
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .or_else(sniffed)
        .unwrap_or(UTF_8);

    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::debug!(encoding = used.name(), "Replaced malformed sequences in body");
    }
    text.into_owned()
}
