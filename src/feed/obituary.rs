use super::types::FeedDocument;

/// Characters allowed between the obituary prefix and the name.
fn is_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, ':' | '-' | '–' | '—' | ',')
}

/// Remove `prefix` (case-insensitive) and any following separators from
/// `title`. Titles that do not start with the prefix, or that would become
/// empty, are returned unchanged.
pub fn strip_title_prefix(title: &str, prefix: &str) -> String {
    let prefix = prefix.trim();
    if prefix.is_empty() {
        return title.to_string();
    }

    let trimmed = title.trim_start();
    let mut title_chars = trimmed.char_indices();
    let mut matched_end = 0;

    for p in prefix.chars() {
        match title_chars.next() {
            Some((idx, c)) if c.to_lowercase().eq(p.to_lowercase()) => {
                matched_end = idx + c.len_utf8();
            }
            _ => return title.to_string(),
        }
    }

    let rest = trimmed[matched_end..].trim_start_matches(is_separator).trim_end();
    if rest.is_empty() {
        title.to_string()
    } else {
        rest.to_string()
    }
}

/// Reshape an obituary feed: strip the title prefix and flag every item.
pub fn mark_obituaries(doc: &mut FeedDocument, prefix: &str) {
    for item in &mut doc.items {
        item.title = strip_title_prefix(&item.title, prefix);
        item.is_obituary = true;
    }
}
