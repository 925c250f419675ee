//! Article HTML preparation for the reader: furniture removal, link
//! classification and link/image rewriting.

use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use std::sync::LazyLock;
use url::Url;

use crate::util::collapse_whitespace;

pub const LOADING_TEXT: &str = "Chargement de l'article...";
pub const FAILURE_TEXT: &str = "Impossible de charger l'article.";

pub const IMAGE_CLASS: &str = "rounded-lg shadow-lg my-4 mx-auto";
pub const IMAGE_STYLE: &str = "max-width: 100%";
pub const BUTTON_CLASS: &str = "styled-button";

/// Page furniture of the newspaper's article template, removed in order.
static FURNITURE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\d{2}/\d{2}/\d{4} \d{2}:\d{2}",
        r"\d+ lectures?",
        r"\*\*IMPRIMER L'ARTICLE",
        r"> [^<>]+ > [^<>]+",
        r"Pour nous rejoindre\.",
        r"https://www\.autun-infos\.com/img/home-blue\.png",
        r"https://www\.autun-infos\.com/img/icon_print\.png",
        r"IMPRIMER L'ARTICLE",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("static regex"))
    .collect()
});

static ANCHORS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a").expect("static selector"));

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Strip known page furniture from extracted article HTML.
pub fn clean_article_html(raw: &str) -> String {
    FURNITURE
        .iter()
        .fold(raw.to_string(), |html, re| re.replace_all(&html, "").into_owned())
}

/// Where following a link leads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    /// Re-fetched and shown in the reader.
    InApp(Url),
    /// Handed to the system browser.
    External(Url),
}

impl LinkTarget {
    pub fn url(&self) -> &Url {
        match self {
            LinkTarget::InApp(url) | LinkTarget::External(url) => url,
        }
    }
}

/// An anchor of the article with its visible text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleLink {
    pub text: String,
    pub target: LinkTarget,
}

/// "Cliquez ici pour lire la suite" style links point at the full article on
/// the same site and are followed in place.
pub fn is_in_app_text(text: &str) -> bool {
    let text = collapse_whitespace(text).to_lowercase();
    text.contains("cliquez ici pour") || text.contains("cliquez-ici pour")
}

fn resolve(href: &str, base: Option<&Url>) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    match base {
        Some(base) => base.join(href).ok(),
        None => Url::parse(href).ok(),
    }
}

fn classify(anchor: ElementRef<'_>, base: Option<&Url>) -> Option<ArticleLink> {
    let url = resolve(anchor.value().attr("href")?, base)?;
    let text = collapse_whitespace(&anchor.text().collect::<String>());
    let target = if is_in_app_text(&text) {
        LinkTarget::InApp(url)
    } else {
        LinkTarget::External(url)
    };
    Some(ArticleLink { text, target })
}

/// Every anchor with a usable `href`, in document order. Relative hrefs are
/// resolved against `base`.
pub fn classify_links(html: &str, base: Option<&Url>) -> Vec<ArticleLink> {
    let fragment = Html::parse_fragment(html);
    fragment
        .select(&ANCHORS)
        .filter_map(|anchor| classify(anchor, base))
        .collect()
}

/// Rewrite links and images for display.
///
/// In-app anchors keep their text and gain `data-reader-href`; other anchors
/// become `button.styled-button` elements carrying the anchor's content and
/// `data-open-href`; images get the reader's class and width cap. Anchors
/// without a usable `href` are unwrapped to their content.
pub fn present_article_html(html: &str, base: Option<&Url>) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::with_capacity(html.len() + html.len() / 8);
    write_children(fragment.root_element(), base, &mut out);
    out
}

fn write_children(element: ElementRef<'_>, base: Option<&Url>, out: &mut String) {
    for child in element.children() {
        if let Some(child) = ElementRef::wrap(child) {
            write_element(child, base, out);
        } else if let Node::Text(text) = child.value() {
            escape_into(text, false, out);
        }
    }
}

fn sorted_attrs<'a>(element: ElementRef<'a>) -> Vec<(&'a str, &'a str)> {
    let mut attrs: Vec<_> = element.value().attrs().collect();
    attrs.sort_unstable();
    attrs
}

fn write_element(element: ElementRef<'_>, base: Option<&Url>, out: &mut String) {
    let name = element.value().name();
    match name {
        "a" => match classify(element, base) {
            Some(ArticleLink {
                target: LinkTarget::InApp(url),
                ..
            }) => {
                out.push_str("<a href=\"");
                escape_into(url.as_str(), true, out);
                out.push_str("\" data-reader-href=\"");
                escape_into(url.as_str(), true, out);
                out.push_str("\">");
                write_children(element, base, out);
                out.push_str("</a>");
            }
            Some(ArticleLink {
                target: LinkTarget::External(url),
                ..
            }) => {
                out.push_str("<button class=\"");
                out.push_str(BUTTON_CLASS);
                out.push_str("\" data-open-href=\"");
                escape_into(url.as_str(), true, out);
                out.push_str("\">");
                write_children(element, base, out);
                out.push_str("</button>");
            }
            None => write_children(element, base, out),
        },
        "img" => {
            out.push_str("<img");
            for (attr, value) in sorted_attrs(element) {
                if attr == "class" || attr == "style" {
                    continue;
                }
                write_attr(attr, value, out);
            }
            write_attr("class", IMAGE_CLASS, out);
            write_attr("style", IMAGE_STYLE, out);
            out.push('>');
        }
        _ => {
            out.push('<');
            out.push_str(name);
            for (attr, value) in sorted_attrs(element) {
                write_attr(attr, value, out);
            }
            out.push('>');
            if VOID_ELEMENTS.contains(&name) {
                return;
            }
            write_children(element, base, out);
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
    }
}

fn write_attr(name: &str, value: &str, out: &mut String) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    escape_into(value, true, out);
    out.push('"');
}

fn escape_into(s: &str, attribute: bool, out: &mut String) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
}

/// Clean then present, the full pipeline applied to extracted content.
pub fn prepare_article_html(raw: &str, base: Option<&Url>) -> String {
    present_article_html(&clean_article_html(raw), base)
}
