use crate::app::{App, ContentState, ReaderLink, MAX_SCROLL};
use crate::store::KeyValueStore;
use crate::util::sanitize_text;
use crate::view::{LinkTarget, FAILURE_TEXT, LOADING_TEXT};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use scraper::{ElementRef, Html, Node};
use std::borrow::Cow;
use url::Url;

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Render the article reader view
pub fn render<S: KeyValueStore + Clone>(f: &mut Frame, app: &mut App<S>, area: Rect) {
    // Layout may produce zero-sized rects during extreme terminal resizes
    if area.width < 3 || area.height < 3 {
        return;
    }

    app.reader_visible_lines = area.height.saturating_sub(2) as usize;
    app.clamp_reader_scroll();

    let (header, content_lines): (Vec<Line<'static>>, Cow<'_, [Line<'static>]>) =
        match &app.content_state {
            ContentState::Idle => (Vec::new(), Cow::Owned(Vec::new())),
            ContentState::Loading { .. } => (
                Vec::new(),
                Cow::Owned(vec![Line::from(format!(
                    "{} {}",
                    SPINNER[app.spinner_frame % SPINNER.len()],
                    LOADING_TEXT
                ))]),
            ),
            ContentState::Failed { .. } => (
                Vec::new(),
                Cow::Owned(vec![Line::from(Span::styled(
                    FAILURE_TEXT,
                    Style::default().fg(Color::Red),
                ))]),
            ),
            ContentState::Loaded {
                title,
                byline,
                rendered_lines,
                ..
            } => (
                article_header(title, byline.as_deref()),
                Cow::Borrowed(rendered_lines.as_slice()),
            ),
        };

    let text = Text::from_iter(header.into_iter().chain(content_lines.iter().cloned()));

    let paragraph = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title("Article"))
        .wrap(Wrap { trim: false })
        .scroll((app.scroll_offset.min(MAX_SCROLL) as u16, 0));

    f.render_widget(paragraph, area);
}

/// Title and byline lines shown above the article body.
fn article_header(title: &str, byline: Option<&str>) -> Vec<Line<'static>> {
    let mut header = vec![Line::from(Span::styled(
        sanitize_text(title).into_owned(),
        Style::default().add_modifier(Modifier::BOLD),
    ))];
    if let Some(byline) = byline {
        header.push(Line::from(Span::styled(
            sanitize_text(byline).into_owned(),
            Style::default().fg(Color::DarkGray),
        )));
    }
    header.push(Line::from(""));
    header
}

/// Line builder for the HTML walk.
#[derive(Default)]
struct Builder {
    lines: Vec<Line<'static>>,
    spans: Vec<Span<'static>>,
    links: Vec<ReaderLink>,
    bold: u32,
    italic: u32,
    heading: u32,
    link: u32,
}

impl Builder {
    fn style(&self) -> Style {
        let mut style = Style::default();
        if self.heading > 0 {
            style = style.fg(Color::Cyan).add_modifier(Modifier::BOLD);
        }
        if self.bold > 0 {
            style = style.add_modifier(Modifier::BOLD);
        }
        if self.italic > 0 {
            style = style.add_modifier(Modifier::ITALIC);
        }
        if self.link > 0 {
            style = style.fg(Color::Yellow).add_modifier(Modifier::UNDERLINED);
        }
        style
    }

    fn flush(&mut self) {
        if !self.spans.is_empty() {
            self.lines.push(Line::from(std::mem::take(&mut self.spans)));
        }
    }

    /// End the current line and leave one empty line, never two.
    fn blank(&mut self) {
        self.flush();
        if self.lines.last().is_some_and(|l| l.width() > 0) {
            self.lines.push(Line::from(""));
        }
    }

    fn text(&mut self, raw: &str) {
        let clean = sanitize_text(raw);
        let mut collapsed = String::with_capacity(clean.len());
        let mut in_space = self.spans.is_empty();
        for c in clean.chars() {
            if c.is_whitespace() {
                if !in_space {
                    collapsed.push(' ');
                    in_space = true;
                }
            } else {
                collapsed.push(c);
                in_space = false;
            }
        }
        if !collapsed.is_empty() {
            let style = self.style();
            self.spans.push(Span::styled(collapsed, style));
        }
    }

    fn finish(mut self) -> (Vec<Line<'static>>, Vec<ReaderLink>) {
        self.flush();
        while self.lines.last().is_some_and(|l| l.width() == 0) {
            self.lines.pop();
        }
        (self.lines, self.links)
    }
}

/// Convert prepared article HTML into styled lines and the list of links in
/// document order.
///
/// Links are recognised by the attributes set during presentation:
/// `data-reader-href` (followed in the reader) and `data-open-href` (opened in
/// the browser). Each link is suffixed with its number.
pub fn render_html(html: &str) -> (Vec<Line<'static>>, Vec<ReaderLink>) {
    let fragment = Html::parse_fragment(html);
    let mut builder = Builder::default();
    walk(fragment.root_element(), &mut builder);
    builder.finish()
}

fn walk(element: ElementRef<'_>, b: &mut Builder) {
    for child in element.children() {
        if let Some(child) = ElementRef::wrap(child) {
            visit(child, b);
        } else if let Node::Text(text) = child.value() {
            b.text(text);
        }
    }
}

fn visit(element: ElementRef<'_>, b: &mut Builder) {
    let name = element.value().name();
    match name {
        "script" | "style" | "noscript" | "head" => {}
        "br" => b.flush(),
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            b.blank();
            b.heading += 1;
            walk(element, b);
            b.heading -= 1;
            b.blank();
        }
        "p" | "blockquote" | "figure" | "pre" | "table" => {
            b.blank();
            walk(element, b);
            b.blank();
        }
        "li" => {
            b.flush();
            b.spans.push(Span::raw("  • "));
            walk(element, b);
            b.flush();
        }
        "div" | "section" | "article" | "header" | "footer" | "main" | "ul" | "ol" | "tr"
        | "figcaption" | "hr" => {
            b.flush();
            walk(element, b);
            b.flush();
        }
        "strong" | "b" => {
            b.bold += 1;
            walk(element, b);
            b.bold -= 1;
        }
        "em" | "i" => {
            b.italic += 1;
            walk(element, b);
            b.italic -= 1;
        }
        "img" => {
            let alt = element
                .value()
                .attr("alt")
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .unwrap_or("image");
            b.spans.push(Span::styled(
                format!("[Image : {}]", sanitize_text(alt)),
                Style::default().fg(Color::Blue),
            ));
        }
        "a" => match link_url(element, "data-reader-href") {
            Some(url) => link(element, LinkTarget::InApp(url), b),
            None => walk(element, b),
        },
        "button" => match link_url(element, "data-open-href") {
            Some(url) => link(element, LinkTarget::External(url), b),
            None => walk(element, b),
        },
        _ => walk(element, b),
    }
}

fn link_url(element: ElementRef<'_>, attr: &str) -> Option<Url> {
    Url::parse(element.value().attr(attr)?).ok()
}

fn link(element: ElementRef<'_>, target: LinkTarget, b: &mut Builder) {
    let text: String = element.text().collect();
    let label = crate::util::collapse_whitespace(&sanitize_text(&text));
    let label = if label.is_empty() {
        target.url().to_string()
    } else {
        label
    };

    b.link += 1;
    walk(element, b);
    b.link -= 1;

    let marker = match target {
        LinkTarget::InApp(_) => format!(" [{}]", b.links.len() + 1),
        LinkTarget::External(_) => format!(" [{}↗]", b.links.len() + 1),
    };
    b.spans
        .push(Span::styled(marker, Style::default().fg(Color::DarkGray)));
    b.links.push(ReaderLink { label, target });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::prepare_article_html;
    use pretty_assertions::assert_eq;

    fn plain(lines: &[Line<'_>]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn test_paragraphs_and_headings() {
        let (lines, links) = render_html("<h2>Titre</h2><p>Premier   paragraphe</p><p>Second<br>ligne</p>");
        assert_eq!(
            plain(&lines),
            ["Titre", "", "Premier paragraphe", "", "Second", "ligne"]
        );
        assert!(links.is_empty());
    }

    #[test]
    fn test_list_items() {
        let (lines, _) = render_html("<ul><li>un</li><li>deux</li></ul>");
        assert_eq!(plain(&lines), ["  • un", "  • deux"]);
    }

    #[test]
    fn test_links_numbered_in_order() {
        let base = Url::parse("https://www.autun-infos.com/news/a.html").unwrap();
        let html = prepare_article_html(
            r#"<p>Texte <a href="suite.html">Cliquez ici pour la suite</a>
               et <a href="https://example.org/">Voir la source</a></p>"#,
            Some(&base),
        );
        let (lines, links) = render_html(&html);

        assert_eq!(links.len(), 2);
        assert_eq!(links[0].label, "Cliquez ici pour la suite");
        assert!(matches!(links[0].target, LinkTarget::InApp(_)));
        assert_eq!(
            links[0].target.url().as_str(),
            "https://www.autun-infos.com/news/suite.html"
        );
        assert_eq!(links[1].label, "Voir la source");
        assert!(matches!(links[1].target, LinkTarget::External(_)));

        assert_eq!(
            plain(&lines),
            ["Texte Cliquez ici pour la suite [1] et Voir la source [2↗]"]
        );
    }

    #[test]
    fn test_images_become_placeholders() {
        let (lines, _) = render_html(r#"<p><img src="a.jpg" alt="La mairie"><img src="b.jpg"></p>"#);
        assert_eq!(plain(&lines), ["[Image : La mairie][Image : image]"]);
    }

    #[test]
    fn test_control_sequences_are_stripped() {
        let (lines, _) = render_html("<p>a\x1b[31mb</p>");
        assert_eq!(plain(&lines), ["ab"]);
    }

    #[test]
    fn test_header_strips_control_sequences() {
        let header = article_header("Titre\x1b[2J piégé", Some("Par\x07 la rédaction"));
        assert_eq!(plain(&header), ["Titre piégé", "Par la rédaction", ""]);
    }

    #[test]
    fn test_empty_input() {
        let (lines, links) = render_html("");
        assert!(lines.is_empty());
        assert!(links.is_empty());
    }
}
