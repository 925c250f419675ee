use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256};

/// Upstream fields we do not model are carried through untouched.
pub type ExtraFields = serde_json::Map<String, serde_json::Value>;

/// One syndicated entry (article or obituary) from a JSON feed document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_html: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub date_published: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_obituary: bool,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl FeedItem {
    /// Minimal item, mostly useful in tests.
    pub fn new(id: &str, title: &str, url: &str, date_published: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            url: url.to_string(),
            content_html: None,
            date_published: date_published.to_string(),
            is_obituary: false,
            extra: ExtraFields::new(),
        }
    }

    /// Parsed publication time, if `date_published` is a full date.
    pub fn published_at(&self) -> Option<DateTime<FixedOffset>> {
        parse_published(&self.date_published)
    }
}

/// A JSON feed document as served by the feed generator: `{items: [...]}`
/// plus whatever metadata the generator adds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedDocument {
    #[serde(default)]
    pub items: Vec<FeedItem>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl FeedDocument {
    /// Give every item without a usable id a deterministic one.
    ///
    /// Ids feed the persisted favorite/read sets, so the fallback must be
    /// stable across fetches: it hashes `url|title|date_published`.
    pub fn ensure_ids(&mut self) {
        for item in &mut self.items {
            if item.id.trim().is_empty() {
                item.id = fallback_id(&item.url, &item.title, &item.date_published);
            } else if item.id.len() != item.id.trim().len() {
                item.id = item.id.trim().to_string();
            }
        }
    }
}

fn fallback_id(url: &str, title: &str, date_published: &str) -> String {
    let input = format!("{}|{}|{}", url, title, date_published);
    format!("{:x}", Sha256::digest(input.as_bytes()))
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Formats accepted for dates without an offset, read as local time.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M",
    "%d/%m/%Y %Hh%M",
];

const NAIVE_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];

/// Parse a full publication date.
///
/// RFC 3339 and RFC 2822 keep their offset; the common naive layouts the
/// feed generator emits are interpreted in the local time zone. Relative
/// fragments such as `14h05` or `03/05` are not full dates and yield `None`.
pub fn parse_published(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt);
    }

    let naive = NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NAIVE_DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.fixed_offset())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_deserialize_upstream_item_keeps_unknown_fields() {
        let json = r#"{
            "id": "a",
            "title": "Foo",
            "url": "https://www.autun-infos.com/foo",
            "content_html": "10h30",
            "date_published": "2024-01-01T10:00:00Z",
            "author": {"name": "Rédaction"}
        }"#;
        let item: FeedItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.id, "a");
        assert_eq!(item.content_html.as_deref(), Some("10h30"));
        assert!(!item.is_obituary);
        assert!(item.extra.contains_key("author"));

        let back = serde_json::to_value(&item).unwrap();
        assert_eq!(back["author"]["name"], "Rédaction");
        assert!(back.get("is_obituary").is_none());
    }

    #[test]
    fn test_null_and_missing_fields_become_empty() {
        let item: FeedItem = serde_json::from_str(r#"{"title": null}"#).unwrap();
        assert_eq!(item.title, "");
        assert_eq!(item.id, "");
        assert_eq!(item.date_published, "");
    }

    #[test]
    fn test_document_keeps_metadata() {
        let json = r#"{"version": "https://jsonfeed.org/version/1", "title": "Autun Infos", "items": []}"#;
        let doc: FeedDocument = serde_json::from_str(json).unwrap();
        assert!(doc.items.is_empty());
        assert_eq!(doc.extra["title"], "Autun Infos");
    }

    #[test]
    fn test_ensure_ids_is_deterministic() {
        let mut a = FeedDocument {
            items: vec![FeedItem::new("", "Titre", "https://x/1", "2024-01-01")],
            extra: ExtraFields::new(),
        };
        let mut b = a.clone();
        a.ensure_ids();
        b.ensure_ids();
        assert_eq!(a.items[0].id.len(), 64);
        assert_eq!(a.items[0].id, b.items[0].id);
    }

    #[test]
    fn test_ensure_ids_keeps_existing_ids() {
        let mut doc = FeedDocument {
            items: vec![FeedItem::new("  abc ", "T", "u", "")],
            extra: ExtraFields::new(),
        };
        doc.ensure_ids();
        assert_eq!(doc.items[0].id, "abc");
    }

    #[test]
    fn test_parse_published_rfc3339_and_rfc2822() {
        let a = parse_published("2024-01-01T10:00:00Z").unwrap();
        let b = parse_published("Mon, 01 Jan 2024 10:00:00 +0000").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_parse_published_naive_formats() {
        let expected = Local
            .with_ymd_and_hms(2024, 3, 5, 14, 30, 0)
            .earliest()
            .unwrap()
            .fixed_offset();
        assert_eq!(parse_published("2024-03-05 14:30:00"), Some(expected));
        assert_eq!(parse_published("05/03/2024 14:30"), Some(expected));
        assert!(parse_published("05/03/2024").is_some());
    }

    #[test]
    fn test_parse_published_rejects_fragments() {
        assert_eq!(parse_published(""), None);
        assert_eq!(parse_published("14h05"), None);
        assert_eq!(parse_published("03/05"), None);
        assert_eq!(parse_published("hier"), None);
    }
}
