//! Background task event processing.

use url::Url;

use crate::app::{App, AppEvent, ContentState};
use crate::content::Article;
use crate::store::KeyValueStore;
use crate::view::prepare_article_html;

use super::reader::render_html;

/// Apply one background event to the application state.
pub(super) fn handle_app_event<S: KeyValueStore + Clone>(app: &mut App<S>, event: AppEvent) {
    match event {
        AppEvent::VisitComplete(outcome) => app.apply_visit(outcome),
        AppEvent::VisitFailed { error } => {
            app.feeds_loading = false;
            app.set_status(format!("État local illisible : {}", error));
        }
        AppEvent::ArticleLoaded {
            url,
            generation,
            result,
        } => handle_article_loaded(app, url, generation, result),
        AppEvent::TaskPanicked { task, error } => {
            tracing::error!(task, error, "Background task panicked");
            if task == "visit" {
                app.feeds_loading = false;
            }
            app.set_status(format!("Erreur interne ({})", task));
        }
    }
}

fn handle_article_loaded<S: KeyValueStore + Clone>(
    app: &mut App<S>,
    url: String,
    generation: u64,
    result: Result<Article, String>,
) {
    // A newer load was started since; the last issued one wins.
    if generation != app.content_generation {
        tracing::debug!(
            expected = app.content_generation,
            got = generation,
            url = %url,
            "Ignoring stale article load (generation mismatch)"
        );
        return;
    }
    if !matches!(app.content_state, ContentState::Loading { .. }) {
        return;
    }

    match result {
        Ok(article) => {
            let base = Url::parse(&url).ok();
            let html = prepare_article_html(&article.content, base.as_ref());
            let (rendered_lines, links) = render_html(&html);
            tracing::debug!(url = %url, lines = rendered_lines.len(), links = links.len(), "Article loaded");
            app.content_state = ContentState::Loaded {
                url,
                title: article.title,
                byline: article.byline,
                rendered_lines,
                links,
            };
        }
        Err(e) => {
            tracing::warn!(url = %url, error = %e, "Article load failed");
            app.content_state = ContentState::Failed { url };
        }
    }
    app.scroll_offset = 0;
    app.selected_link = None;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ApiClient;
    use crate::status::StatusBook;
    use crate::store::MemoryStore;

    async fn test_app() -> App<MemoryStore> {
        let store = MemoryStore::new();
        let api = ApiClient::new(reqwest::Client::new(), "http://127.0.0.1:9").unwrap();
        let status = StatusBook::load(store.clone()).await.unwrap();
        App::new(api, store, status)
    }

    fn article() -> Article {
        Article {
            title: "Le marché rouvre".to_string(),
            content: r#"<p>12/03/2024 14:30</p><p>Texte.</p><a href="https://example.org/">Source</a>"#
                .to_string(),
            byline: None,
        }
    }

    #[tokio::test]
    async fn test_stale_generation_is_dropped() {
        let mut app = test_app().await;
        let old = app.begin_reader("https://www.autun-infos.com/a");
        let _new = app.begin_reader("https://www.autun-infos.com/b");

        handle_app_event(
            &mut app,
            AppEvent::ArticleLoaded {
                url: "https://www.autun-infos.com/a".to_string(),
                generation: old,
                result: Ok(article()),
            },
        );
        assert!(matches!(app.content_state, ContentState::Loading { .. }));
    }

    #[tokio::test]
    async fn test_loaded_article_is_cleaned_and_rendered() {
        let mut app = test_app().await;
        let generation = app.begin_reader("https://www.autun-infos.com/a");

        handle_app_event(
            &mut app,
            AppEvent::ArticleLoaded {
                url: "https://www.autun-infos.com/a".to_string(),
                generation,
                result: Ok(article()),
            },
        );

        match &app.content_state {
            ContentState::Loaded {
                title,
                rendered_lines,
                links,
                ..
            } => {
                assert_eq!(title, "Le marché rouvre");
                let text: Vec<String> = rendered_lines.iter().map(|l| l.to_string()).collect();
                assert!(!text.iter().any(|l| l.contains("12/03/2024")));
                assert!(text.iter().any(|l| l.contains("Texte.")));
                assert_eq!(links.len(), 1);
            }
            other => panic!("expected loaded article, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failed_load_shows_failure() {
        let mut app = test_app().await;
        let generation = app.begin_reader("https://www.autun-infos.com/a");
        handle_app_event(
            &mut app,
            AppEvent::ArticleLoaded {
                url: "https://www.autun-infos.com/a".to_string(),
                generation,
                result: Err("HTTP 500".to_string()),
            },
        );
        assert!(matches!(app.content_state, ContentState::Failed { .. }));
    }
}
