use crate::app::{App, ContentState, View};
use crate::store::KeyValueStore;
use crate::util::truncate_to_width;
use crate::view::{reader_path, LinkTarget};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};
use std::borrow::Cow;

const READER_HINTS: &str = "[b]retour [j/k]défiler [n/p]lien [Entrée]suivre [o]uvrir [q]uitter";

/// Render the status bar
pub fn render<S: KeyValueStore + Clone>(f: &mut Frame, app: &App<S>, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }

    let text: Cow<'_, str> = if let Some((msg, _)) = &app.status_message {
        Cow::Borrowed(msg.as_ref())
    } else {
        match app.view {
            View::Feed => {
                if app.search_mode {
                    Cow::Borrowed("Tapez pour chercher | ESC effacer | ENTRÉE garder")
                } else {
                    Cow::Borrowed(
                        "[Tab/1-3]onglet [/]chercher [f]avori [Entrée]lire [o]uvrir [r]echarger [?]aide [q]uitter",
                    )
                }
            }
            View::Reader => match (app.selected_reader_link(), &app.content_state) {
                (Some(link), ContentState::Loaded { links, .. }) => {
                    let kind = match link.target {
                        LinkTarget::InApp(_) => "lire",
                        LinkTarget::External(_) => "navigateur",
                    };
                    Cow::Owned(format!(
                        "Lien {}/{} ({}) : {} → {}",
                        app.selected_link.map_or(0, |i| i + 1),
                        links.len(),
                        kind,
                        link.label,
                        link.target.url()
                    ))
                }
                (_, state) => match state.url() {
                    Some(url) => Cow::Owned(format!("{} {}", READER_HINTS, reader_path(url))),
                    None => Cow::Borrowed(READER_HINTS),
                },
            },
        }
    };

    let text = truncate_to_width(&text, area.width as usize).into_owned();
    let style = Style::default().bg(Color::DarkGray).fg(Color::White);
    f.render_widget(Paragraph::new(text).style(style), area);
}
