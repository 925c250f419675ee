//! Background tasks spawned by the UI.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use tokio::sync::mpsc;

use crate::app::{run_visit, App, AppEvent};
use crate::store::KeyValueStore;
use crate::util::validate_url_for_open;

/// Catch panics in spawned tasks and convert them to error messages.
///
/// The event loop would otherwise wait forever for an event the dead task
/// never sends.
pub(super) async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: std::future::Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            }
        })
}

async fn send(tx: &mpsc::Sender<AppEvent>, event: AppEvent, name: &'static str) {
    if tx.send(event).await.is_err() {
        tracing::warn!(event = name, "Channel send failed (receiver dropped)");
    }
}

/// Start a visit (both feeds) unless one is already running.
pub fn spawn_visit<S>(app: &mut App<S>, tx: &mpsc::Sender<AppEvent>)
where
    S: KeyValueStore + Clone + 'static,
{
    if app.feeds_loading {
        return;
    }
    app.feeds_loading = true;
    app.set_status("Chargement des flux...");

    let api = app.api.clone();
    let store = app.store.clone();
    let tx = tx.clone();

    tokio::spawn(async move {
        match catch_task_panic(run_visit(&api, store)).await {
            Ok(Ok(outcome)) => send(&tx, AppEvent::VisitComplete(outcome), "VisitComplete").await,
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Visit failed");
                let event = AppEvent::VisitFailed {
                    error: e.to_string(),
                };
                send(&tx, event, "VisitFailed").await;
            }
            Err(panic_msg) => {
                tracing::error!(task = "visit", error = %panic_msg, "Background task panicked");
                let event = AppEvent::TaskPanicked {
                    task: "visit",
                    error: panic_msg,
                };
                send(&tx, event, "TaskPanicked").await;
            }
        }
    });
}

/// Open the reader on `url` and fetch the article in the background.
///
/// Earlier loads are not aborted; their results carry an older generation and
/// are dropped on arrival.
pub fn spawn_article_load<S>(app: &mut App<S>, url: &str, tx: &mpsc::Sender<AppEvent>)
where
    S: KeyValueStore + Clone,
{
    let generation = app.begin_reader(url);
    let api = app.api.clone();
    let url = url.to_string();
    let tx = tx.clone();

    tracing::debug!(url = %url, generation, "Spawning article load");

    tokio::spawn(async move {
        let load = async { api.article(&url).await.map_err(|e| e.to_string()) };
        match catch_task_panic(load).await {
            Ok(result) => {
                let event = AppEvent::ArticleLoaded {
                    url,
                    generation,
                    result,
                };
                send(&tx, event, "ArticleLoaded").await;
            }
            Err(panic_msg) => {
                tracing::error!(task = "article_load", error = %panic_msg, "Background task panicked");
                let event = AppEvent::TaskPanicked {
                    task: "article_load",
                    error: panic_msg,
                };
                send(&tx, event, "TaskPanicked").await;
            }
        }
    });
}

/// Hand `url` to the system browser after validating it.
pub fn open_in_browser<S>(app: &mut App<S>, url: &str)
where
    S: KeyValueStore + Clone,
{
    // Validate before open::that() so no argument reaches the opener unchecked.
    match validate_url_for_open(url) {
        Err(e) => app.set_status(format!("Lien invalide : {}", e)),
        Ok(valid) => {
            if let Err(e) = open::that(valid.as_str()) {
                tracing::warn!(url = %valid, error = %e, "Failed to open browser");
                app.set_status(format!("Ouverture impossible : {}", e));
            } else {
                app.set_status("Ouvert dans le navigateur");
            }
        }
    }
}
