use chrono::Utc;
use ratatui::text::Line;
use std::borrow::Cow;
use tokio::time::Instant;

use crate::client::{ApiClient, ClientError};
use crate::content::Article;
use crate::feed::FeedItem;
use crate::status::{IdSet, StatusBook};
use crate::store::{KeyValueStore, StoreError};
use crate::view::{tab_items, LinkTarget, Tab};

/// Maximum scroll offset for the reader view (ratatui u16 limit).
pub const MAX_SCROLL: usize = u16::MAX as usize;

/// Current view mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Feed,   // Tabbed item list
    Reader, // Full-screen article reader
}

/// A followable link of the article shown in the reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderLink {
    pub label: String,
    pub target: LinkTarget,
}

/// Content loading state for the article reader
#[derive(Debug, Clone)]
pub enum ContentState {
    Idle,
    Loading {
        url: String,
    },
    Loaded {
        url: String,
        title: String,
        byline: Option<String>,
        rendered_lines: Vec<Line<'static>>,
        links: Vec<ReaderLink>,
    },
    Failed {
        url: String,
    },
}

impl ContentState {
    pub fn url(&self) -> Option<&str> {
        match self {
            ContentState::Idle => None,
            ContentState::Loading { url }
            | ContentState::Loaded { url, .. }
            | ContentState::Failed { url } => Some(url),
        }
    }
}

/// Both feeds of one visit, after the new set was computed and the marker
/// written.
pub struct VisitOutcome {
    pub articles: Result<Vec<FeedItem>, ClientError>,
    pub obituaries: Result<Vec<FeedItem>, ClientError>,
    pub new: IdSet,
}

/// Run one visit: pin the previous marker, fetch both feeds concurrently,
/// absorb whatever arrived, then write the new marker.
///
/// A failed feed contributes no items but does not stop the marker write.
pub async fn run_visit<S: KeyValueStore>(
    api: &ApiClient,
    store: S,
) -> Result<VisitOutcome, StoreError> {
    let mut visit = StatusBook::begin_visit(store).await?;

    let (articles, obituaries) = tokio::join!(api.articles(), api.obituaries());
    let articles = articles.map(|doc| doc.items);
    let obituaries = obituaries.map(|doc| doc.items);

    for (feed, result) in [("articles", &articles), ("obituaries", &obituaries)] {
        match result {
            Ok(items) => {
                let added = visit.absorb(items);
                tracing::debug!(feed, items = items.len(), new = added, "Feed absorbed");
            }
            Err(e) => tracing::warn!(feed, error = %e, "Feed fetch failed"),
        }
    }

    let book = visit.commit(Utc::now()).await;
    Ok(VisitOutcome {
        articles,
        obituaries,
        new: book.new_items().clone(),
    })
}

/// Events from background tasks
pub enum AppEvent {
    /// A visit finished (both feeds settled, marker written).
    VisitComplete(VisitOutcome),
    /// The visit could not read the persisted state.
    VisitFailed { error: String },
    /// Article fetched for the reader.
    ///
    /// Fields:
    /// - `url`: The article URL that was requested
    /// - `generation`: The generation counter when this load was spawned
    /// - `result`: The article or error message
    ArticleLoaded {
        url: String,
        generation: u64,
        result: Result<Article, String>,
    },
    /// A background task panicked.
    TaskPanicked { task: &'static str, error: String },
}

pub struct App<S> {
    pub api: ApiClient,
    pub store: S,
    pub status: StatusBook<S>,

    pub articles: Vec<FeedItem>,
    pub obituaries: Vec<FeedItem>,
    pub feeds_loading: bool,

    pub view: View,
    pub tab: Tab,
    pub selected: usize,
    pub search_mode: bool,
    pub search_query: String,
    pub show_help: bool,

    pub content_state: ContentState,
    /// Incremented for every reader load; results from older loads are dropped.
    pub content_generation: u64,
    pub scroll_offset: usize,
    pub reader_visible_lines: usize,
    pub selected_link: Option<usize>,
    pub spinner_frame: usize,

    pub status_message: Option<(Cow<'static, str>, Instant)>,
    pub needs_redraw: bool,
}

impl<S: KeyValueStore + Clone> App<S> {
    pub fn new(api: ApiClient, store: S, status: StatusBook<S>) -> Self {
        Self {
            api,
            store,
            status,
            articles: Vec::new(),
            obituaries: Vec::new(),
            feeds_loading: false,
            view: View::Feed,
            tab: Tab::default(),
            selected: 0,
            search_mode: false,
            search_query: String::new(),
            show_help: false,
            content_state: ContentState::Idle,
            content_generation: 0,
            scroll_offset: 0,
            reader_visible_lines: 0,
            selected_link: None,
            spinner_frame: 0,
            status_message: None,
            needs_redraw: true,
        }
    }

    /// Items of the current tab, search applied.
    pub fn visible_items(&self) -> Vec<&FeedItem> {
        tab_items(
            self.tab,
            &self.articles,
            &self.obituaries,
            self.status.favorites(),
            &self.search_query,
        )
    }

    pub fn selected_item(&self) -> Option<&FeedItem> {
        self.visible_items().get(self.selected).copied()
    }

    pub fn select_next(&mut self) {
        let len = self.visible_items().len();
        if len > 0 && self.selected + 1 < len {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Keep the selection inside the visible list after it changed.
    pub fn clamp_selection(&mut self) {
        let len = self.visible_items().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    pub fn switch_tab(&mut self, tab: Tab) {
        if self.tab != tab {
            self.tab = tab;
            self.selected = 0;
        }
    }

    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), Instant::now()));
    }

    /// Clear status message if expired (older than 3 seconds)
    /// Returns true if a message was actually cleared
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed().as_secs() >= 3 {
                self.status_message = None;
                return true;
            }
        }
        false
    }

    /// Install the result of a visit. A failed feed keeps its previous items.
    pub fn apply_visit(&mut self, outcome: VisitOutcome) {
        self.feeds_loading = false;
        self.status.replace_new(outcome.new);

        let mut failures = Vec::new();
        match outcome.articles {
            Ok(items) => self.articles = items,
            Err(e) => {
                tracing::warn!(error = %e, "Articles unavailable");
                failures.push("articles");
            }
        }
        match outcome.obituaries {
            Ok(items) => self.obituaries = items,
            Err(e) => {
                tracing::warn!(error = %e, "Obituaries unavailable");
                failures.push("avis de décès");
            }
        }

        if failures.is_empty() {
            let count = self.status.new_items().len();
            if count > 0 {
                self.set_status(format!("{} nouveaux depuis la dernière visite", count));
            }
        } else {
            self.set_status(format!("Chargement impossible : {}", failures.join(", ")));
        }
        self.clamp_selection();
    }

    /// Switch to the reader for `url` and return the generation of the load
    /// the caller must spawn.
    pub fn begin_reader(&mut self, url: &str) -> u64 {
        self.content_generation = self.content_generation.wrapping_add(1);
        self.view = View::Reader;
        self.content_state = ContentState::Loading {
            url: url.to_string(),
        };
        self.scroll_offset = 0;
        self.selected_link = None;
        self.spinner_frame = 0;
        self.content_generation
    }

    pub fn exit_reader(&mut self) {
        self.view = View::Feed;
        self.content_state = ContentState::Idle;
        self.scroll_offset = 0;
        self.selected_link = None;
    }

    pub fn reader_links(&self) -> &[ReaderLink] {
        match &self.content_state {
            ContentState::Loaded { links, .. } => links,
            _ => &[],
        }
    }

    pub fn selected_reader_link(&self) -> Option<&ReaderLink> {
        self.selected_link.and_then(|i| self.reader_links().get(i))
    }

    /// Move the link cursor, wrapping at both ends.
    pub fn cycle_link(&mut self, forward: bool) {
        let len = self.reader_links().len();
        if len == 0 {
            self.selected_link = None;
            return;
        }
        self.selected_link = Some(match (self.selected_link, forward) {
            (None, true) => 0,
            (None, false) => len - 1,
            (Some(i), true) => (i + 1) % len,
            (Some(i), false) => (i + len - 1) % len,
        });
    }

    /// Number of content lines in the reader (header included).
    pub fn reader_line_count(&self) -> usize {
        match &self.content_state {
            ContentState::Loaded { rendered_lines, .. } => rendered_lines.len() + 3,
            _ => 3,
        }
    }

    pub fn clamp_reader_scroll(&mut self) {
        let max = self
            .reader_line_count()
            .saturating_sub(self.reader_visible_lines.max(1))
            .min(MAX_SCROLL);
        if self.scroll_offset > max {
            self.scroll_offset = max;
        }
    }

    pub fn scroll_by(&mut self, delta: isize) {
        self.scroll_offset = self.scroll_offset.saturating_add_signed(delta);
        self.clamp_reader_scroll();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    async fn test_app() -> App<MemoryStore> {
        let store = MemoryStore::new();
        let api = ApiClient::new(reqwest::Client::new(), "http://127.0.0.1:9").unwrap();
        let status = StatusBook::load(store.clone()).await.unwrap();
        let mut app = App::new(api, store, status);
        app.articles = vec![
            FeedItem::new("a1", "Travaux avenue Charles de Gaulle", "https://x/a1", ""),
            FeedItem::new("a2", "Fête de la musique", "https://x/a2", ""),
        ];
        app.obituaries = vec![FeedItem::new("o1", "Jean Dupont", "https://x/o1", "")];
        app
    }

    #[tokio::test]
    async fn test_selection_stays_in_bounds() {
        let mut app = test_app().await;
        app.select_prev();
        assert_eq!(app.selected, 0);
        app.select_next();
        app.select_next();
        assert_eq!(app.selected, 1);
        assert_eq!(app.selected_item().unwrap().id, "a2");

        app.switch_tab(Tab::Obituaries);
        assert_eq!(app.selected, 0);
        assert_eq!(app.selected_item().unwrap().id, "o1");
    }

    #[tokio::test]
    async fn test_search_narrows_and_clamps() {
        let mut app = test_app().await;
        app.selected = 1;
        app.search_query = "TRAVAUX".to_string();
        app.clamp_selection();
        assert_eq!(app.selected, 0);
        assert_eq!(app.selected_item().unwrap().id, "a1");
    }

    #[tokio::test]
    async fn test_favorites_tab_follows_status() {
        let mut app = test_app().await;
        app.status.toggle_favorite("o1").await.unwrap();
        app.status.toggle_favorite("a2").await.unwrap();
        app.switch_tab(Tab::Favorites);

        let ids: Vec<&str> = app.visible_items().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["a2", "o1"]);
    }

    #[tokio::test]
    async fn test_apply_visit_keeps_items_of_failed_feed() {
        let mut app = test_app().await;
        app.feeds_loading = true;
        let new: IdSet = ["n1".to_string()].into_iter().collect();
        app.apply_visit(VisitOutcome {
            articles: Ok(vec![FeedItem::new("n1", "Nouveau", "https://x/n1", "")]),
            obituaries: Err(ClientError::Api {
                status: 500,
                message: "Error fetching obituaries".to_string(),
            }),
            new,
        });

        assert!(!app.feeds_loading);
        assert_eq!(app.articles.len(), 1);
        assert_eq!(app.obituaries.len(), 1);
        assert!(app.status.is_new("n1"));
        assert!(app.status_message.is_some());
    }

    #[tokio::test]
    async fn test_begin_reader_bumps_generation() {
        let mut app = test_app().await;
        let first = app.begin_reader("https://x/a1");
        let second = app.begin_reader("https://x/a2");
        assert_eq!(second, first + 1);
        assert_eq!(app.view, View::Reader);
        assert_eq!(app.content_state.url(), Some("https://x/a2"));

        app.exit_reader();
        assert_eq!(app.view, View::Feed);
        assert!(matches!(app.content_state, ContentState::Idle));
    }

    #[tokio::test]
    async fn test_cycle_link_wraps() {
        let mut app = test_app().await;
        let link = |label: &str| ReaderLink {
            label: label.to_string(),
            target: LinkTarget::External(url::Url::parse("https://example.org/").unwrap()),
        };
        app.content_state = ContentState::Loaded {
            url: "https://x/a1".to_string(),
            title: "T".to_string(),
            byline: None,
            rendered_lines: Vec::new(),
            links: vec![link("un"), link("deux")],
        };

        app.cycle_link(true);
        assert_eq!(app.selected_reader_link().unwrap().label, "un");
        app.cycle_link(true);
        app.cycle_link(true);
        assert_eq!(app.selected_reader_link().unwrap().label, "un");
        app.cycle_link(false);
        assert_eq!(app.selected_reader_link().unwrap().label, "deux");
    }

    #[tokio::test]
    async fn test_scroll_is_clamped_to_content() {
        let mut app = test_app().await;
        app.content_state = ContentState::Loaded {
            url: "https://x/a1".to_string(),
            title: "T".to_string(),
            byline: None,
            rendered_lines: vec![Line::from("x"); 20],
            links: Vec::new(),
        };
        app.reader_visible_lines = 10;
        app.scroll_by(100);
        assert_eq!(app.scroll_offset, 13);
        app.scroll_by(-100);
        assert_eq!(app.scroll_offset, 0);
    }
}
