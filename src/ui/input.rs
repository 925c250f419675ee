//! Keyboard input handling for the feed list, search and reader modes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyModifiers};
use tokio::sync::mpsc;

use crate::app::{App, AppEvent, View};
use crate::store::KeyValueStore;
use crate::util::MAX_SEARCH_QUERY_LENGTH;
use crate::view::{LinkTarget, Tab};

use super::loop_runner::Action;
use super::tasks::{open_in_browser, spawn_article_load, spawn_visit};

/// Handle one key press.
pub(super) async fn handle_input<S>(
    app: &mut App<S>,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action>
where
    S: KeyValueStore + Clone + 'static,
{
    if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
        return Ok(Action::Quit);
    }

    if app.show_help {
        app.show_help = false;
        return Ok(Action::Continue);
    }

    match app.view {
        View::Feed if app.search_mode => {
            handle_search_input(app, code);
            Ok(Action::Continue)
        }
        View::Feed => handle_feed_input(app, code, event_tx).await,
        View::Reader => Ok(handle_reader_input(app, code, event_tx)),
    }
}

fn handle_search_input<S: KeyValueStore + Clone>(app: &mut App<S>, code: KeyCode) {
    match code {
        KeyCode::Esc => {
            app.search_mode = false;
            app.search_query.clear();
            app.selected = 0;
        }
        KeyCode::Enter => {
            app.search_mode = false;
        }
        KeyCode::Backspace => {
            app.search_query.pop();
            app.selected = 0;
        }
        KeyCode::Char(c) => {
            if app.search_query.chars().count() < MAX_SEARCH_QUERY_LENGTH {
                app.search_query.push(c);
                app.selected = 0;
            } else {
                app.set_status(format!(
                    "Recherche trop longue (max {} caractères)",
                    MAX_SEARCH_QUERY_LENGTH
                ));
            }
        }
        _ => {}
    }
}

async fn handle_feed_input<S>(
    app: &mut App<S>,
    code: KeyCode,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action>
where
    S: KeyValueStore + Clone + 'static,
{
    match code {
        KeyCode::Char('q') => return Ok(Action::Quit),
        KeyCode::Tab => app.switch_tab(app.tab.next()),
        KeyCode::Char('1') => app.switch_tab(Tab::Articles),
        KeyCode::Char('2') => app.switch_tab(Tab::Obituaries),
        KeyCode::Char('3') => app.switch_tab(Tab::Favorites),
        KeyCode::Char('j') | KeyCode::Down => app.select_next(),
        KeyCode::Char('k') | KeyCode::Up => app.select_prev(),
        KeyCode::Char('/') => app.search_mode = true,
        KeyCode::Esc => {
            if !app.search_query.is_empty() {
                app.search_query.clear();
                app.selected = 0;
            }
        }
        KeyCode::Char('?') => app.show_help = true,
        KeyCode::Char('r') => spawn_visit(app, event_tx),
        KeyCode::Char('f') => {
            if let Some(id) = app.selected_item().map(|item| item.id.clone()) {
                let now_favorite = app.status.toggle_favorite(&id).await?;
                app.set_status(if now_favorite {
                    "Ajouté aux favoris"
                } else {
                    "Retiré des favoris"
                });
                app.clamp_selection();
            }
        }
        KeyCode::Char('o') => {
            if let Some(url) = app.selected_item().map(|item| item.url.clone()) {
                open_in_browser(app, &url);
            }
        }
        KeyCode::Enter => {
            if let Some((id, url)) = app
                .selected_item()
                .map(|item| (item.id.clone(), item.url.clone()))
            {
                if url.is_empty() {
                    app.set_status("Cet élément n'a pas de lien");
                } else {
                    spawn_article_load(app, &url, event_tx);
                    if let Err(e) = app.status.mark_read(&id).await {
                        tracing::warn!(id = %id, error = %e, "Failed to persist read status");
                    }
                }
            }
        }
        _ => {}
    }
    Ok(Action::Continue)
}

fn handle_reader_input<S: KeyValueStore + Clone>(
    app: &mut App<S>,
    code: KeyCode,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Action {
    let page = app.reader_visible_lines.max(1) as isize;
    match code {
        KeyCode::Char('q') => return Action::Quit,
        KeyCode::Char('b') | KeyCode::Esc | KeyCode::Backspace => app.exit_reader(),
        KeyCode::Char('j') | KeyCode::Down => app.scroll_by(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_by(-1),
        KeyCode::PageDown | KeyCode::Char(' ') => app.scroll_by(page),
        KeyCode::PageUp => app.scroll_by(-page),
        KeyCode::Home => app.scroll_offset = 0,
        KeyCode::Char('n') => app.cycle_link(true),
        KeyCode::Char('p') => app.cycle_link(false),
        KeyCode::Char('?') => app.show_help = true,
        KeyCode::Enter => match app.selected_reader_link().map(|l| l.target.clone()) {
            Some(LinkTarget::InApp(url)) => spawn_article_load(app, url.as_str(), event_tx),
            Some(LinkTarget::External(url)) => open_in_browser(app, url.as_str()),
            None => app.set_status("Aucun lien sélectionné (n/p pour choisir)"),
        },
        KeyCode::Char('o') => {
            if let Some(url) = app.content_state.url().map(str::to_string) {
                open_in_browser(app, &url);
            }
        }
        _ => {}
    }
    Action::Continue
}
