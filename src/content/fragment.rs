use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Best-effort main content of a page, as returned by `/api/fetch-content`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentFragment {
    pub content: String,
}

static STRIPPED: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script, style, iframe, img").expect("static selector"));

/// Containers tried in order; the first non-empty one wins.
static CONTAINERS: LazyLock<[Selector; 3]> = LazyLock::new(|| {
    ["main", "article", "body"].map(|css| Selector::parse(css).expect("static selector"))
});

/// Strip scripts, styles, iframes and images, then return the inner HTML of
/// `main`, falling back to `article`, then to `body`. Only a missing or
/// completely empty container falls through; whitespace counts as content.
pub fn main_fragment(html: &str) -> String {
    let mut document = Html::parse_document(html);

    let doomed: Vec<_> = document.select(&STRIPPED).map(|el| el.id()).collect();
    for id in doomed {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }

    CONTAINERS
        .iter()
        .filter_map(|sel| document.select(sel).next())
        .map(|el| el.inner_html())
        .find(|inner| !inner.is_empty())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefers_main() {
        let html = "<html><body><nav>menu</nav><main><p>Corps</p></main><article>autre</article></body></html>";
        let fragment = main_fragment(html);
        assert_eq!(fragment.trim(), "<p>Corps</p>");
    }

    #[test]
    fn test_falls_back_to_article() {
        let html = "<html><body><main></main><article><p>Texte</p></article></body></html>";
        assert_eq!(main_fragment(html).trim(), "<p>Texte</p>");
    }

    #[test]
    fn test_whitespace_main_does_not_fall_through() {
        let html = "<html><body><main>  </main><article><p>Texte</p></article></body></html>";
        assert_eq!(main_fragment(html), "  ");
    }

    #[test]
    fn test_falls_back_to_body() {
        let html = "<html><body><div>Seul contenu</div></body></html>";
        assert!(main_fragment(html).contains("Seul contenu"));
    }

    #[test]
    fn test_strips_unwanted_elements() {
        let html = r#"<html><head><style>p{}</style></head><body><main>
            <script>alert(1)</script><p>Bonjour</p><img src="a.png">
            <iframe src="https://ads.test"></iframe><style>.x{}</style>
        </main></body></html>"#;
        let fragment = main_fragment(html);
        assert!(fragment.contains("Bonjour"));
        assert!(!fragment.contains("script"));
        assert!(!fragment.contains("<img"));
        assert!(!fragment.contains("iframe"));
        assert!(!fragment.contains("style"));
    }

    #[test]
    fn test_main_emptied_by_stripping_falls_back() {
        let html = "<html><body><main><img src=x></main><article>Reste</article></body></html>";
        assert_eq!(main_fragment(html).trim(), "Reste");
    }
}
