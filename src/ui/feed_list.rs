use crate::app::App;
use crate::feed::FeedItem;
use crate::status::StatusBook;
use crate::store::KeyValueStore;
use crate::util::{sanitize_text, truncate_to_width};
use crate::view::{format_published, Tab};
use chrono::{DateTime, FixedOffset, Local};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Tabs},
    Frame,
};
use unicode_width::UnicodeWidthStr;

/// Render the tab bar and the item list of the current tab.
pub fn render<S: KeyValueStore + Clone>(f: &mut Frame, app: &App<S>, area: Rect) {
    if area.width < 3 || area.height < 4 {
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(area);

    let tabs = Tabs::new(Tab::ALL.iter().map(|t| t.title()))
        .select(app.tab.index())
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );
    f.render_widget(tabs, chunks[0]);

    let list_area = chunks[1];
    let visible = app.visible_items();
    let now = Local::now().fixed_offset();
    // Inside the borders.
    let title_width = list_area.width.saturating_sub(2) as usize;

    let items: Vec<ListItem> = if visible.is_empty() {
        let msg = if app.feeds_loading {
            "Chargement..."
        } else if !app.search_query.is_empty() {
            "Aucun résultat"
        } else if app.tab == Tab::Favorites {
            "Aucun favori"
        } else {
            "Aucun élément"
        };
        vec![ListItem::new(Span::styled(msg, Style::default().fg(Color::DarkGray)))]
    } else {
        visible
            .iter()
            .map(|item| ListItem::new(item_line(item, &app.status, now, title_width)))
            .collect()
    };

    let title = if app.search_mode {
        format!("Recherche : {}_", app.search_query)
    } else if !app.search_query.is_empty() {
        format!("{} (filtre : {})", app.tab.title(), app.search_query)
    } else {
        format!("{} ({})", app.tab.title(), visible.len())
    };

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(title),
        )
        .highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White));

    let mut state = ListState::default();
    if !visible.is_empty() {
        state.select(Some(app.selected));
    }
    f.render_stateful_widget(list, list_area, &mut state);
}

/// One list row: favorite and new markers, title, formatted date.
fn item_line<S: KeyValueStore>(
    item: &FeedItem,
    status: &StatusBook<S>,
    now: DateTime<FixedOffset>,
    width: usize,
) -> Line<'static> {
    let mut spans = Vec::with_capacity(4);

    if status.is_favorite(&item.id) {
        spans.push(Span::styled("★ ", Style::default().fg(Color::Yellow)));
    } else {
        spans.push(Span::raw("  "));
    }
    if status.is_new(&item.id) {
        spans.push(Span::styled("● ", Style::default().fg(Color::Green)));
    } else {
        spans.push(Span::raw("  "));
    }

    let date = format_published(&item.date_published, now);
    let room = width.saturating_sub(4 + 2 + date.width());

    let title_style = if status.is_read(&item.id) {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    let title = sanitize_text(&item.title);
    spans.push(Span::styled(
        truncate_to_width(&title, room).into_owned(),
        title_style,
    ));
    spans.push(Span::styled(
        format!("  {}", date),
        Style::default().fg(Color::DarkGray),
    ));

    Line::from(spans)
}
