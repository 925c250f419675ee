//! Integration tests for a visit: fetch both feeds through the proxy client,
//! compute the new set against the stored marker, persist the new marker.
//!
//! The proxy is a mock server; state lives in a fresh in-memory store per
//! test.

use chrono::{DateTime, Utc};
use pretty_assertions::assert_eq;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gazette::app::run_visit;
use gazette::client::ApiClient;
use gazette::status::StatusBook;
use gazette::store::{KeyValueStore, MemoryStore, StateKey};

async fn mount_feed(server: &MockServer, endpoint: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(endpoint))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.to_string(), "application/json"))
        .mount(server)
        .await;
}

fn api_for(server: &MockServer) -> ApiClient {
    ApiClient::new(reqwest::Client::new(), &server.uri()).unwrap()
}

async fn stored_marker(store: &MemoryStore) -> DateTime<Utc> {
    let raw = store.get(StateKey::LastVisit).await.unwrap().unwrap();
    let value: String = serde_json::from_str(&raw).unwrap();
    DateTime::parse_from_rfc3339(&value).unwrap().with_timezone(&Utc)
}

#[tokio::test]
async fn test_first_visit_marks_dated_items_new_and_writes_marker() {
    let server = MockServer::start().await;
    mount_feed(
        &server,
        "/api/rss",
        r#"{"items":[
            {"id":"a","title":"A","url":"https://x/a","date_published":"2024-01-01T10:00:00Z"},
            {"id":"b","title":"B","url":"https://x/b","date_published":"14h05"}
        ]}"#,
    )
    .await;
    mount_feed(
        &server,
        "/api/obituaries",
        r#"{"items":[{"id":"o","title":"O","url":"https://x/o","date_published":"2024-01-02T09:00:00+01:00","is_obituary":true}]}"#,
    )
    .await;

    let store = MemoryStore::new();
    let before = Utc::now();
    let outcome = run_visit(&api_for(&server), store.clone()).await.unwrap();

    assert_eq!(outcome.articles.as_ref().unwrap().len(), 2);
    assert_eq!(outcome.obituaries.as_ref().unwrap().len(), 1);
    // "14h05" carries no full date and is never new.
    assert_eq!(outcome.new.as_slice(), ["a".to_string(), "o".to_string()]);

    let marker = stored_marker(&store).await;
    assert!(marker >= before - chrono::Duration::seconds(1));
}

#[tokio::test]
async fn test_only_items_strictly_after_marker_are_new() {
    let server = MockServer::start().await;
    mount_feed(
        &server,
        "/api/rss",
        r#"{"items":[
            {"id":"old","title":"Old","url":"https://x/old","date_published":"2024-01-01T09:59:59Z"},
            {"id":"same","title":"Same","url":"https://x/same","date_published":"2024-01-01T10:00:00Z"},
            {"id":"later","title":"Later","url":"https://x/later","date_published":"2024-01-01T12:00:00+01:00"}
        ]}"#,
    )
    .await;
    mount_feed(&server, "/api/obituaries", r#"{"items":[]}"#).await;

    let store = MemoryStore::new();
    store
        .set(StateKey::LastVisit, r#""2024-01-01T10:00:00+00:00""#)
        .await
        .unwrap();

    let outcome = run_visit(&api_for(&server), store.clone()).await.unwrap();

    assert_eq!(outcome.new.as_slice(), ["later".to_string()]);
    assert!(stored_marker(&store).await.timestamp() > 1_704_103_200);
}

#[tokio::test]
async fn test_failed_feed_still_advances_marker() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/rss"))
        .respond_with(
            ResponseTemplate::new(500).set_body_raw(r#"{"error":"Error fetching RSS"}"#, "application/json"),
        )
        .mount(&server)
        .await;
    mount_feed(
        &server,
        "/api/obituaries",
        r#"{"items":[{"id":"o","title":"O","url":"https://x/o","date_published":"2024-03-01T08:00:00Z"}]}"#,
    )
    .await;

    let store = MemoryStore::new();
    let outcome = run_visit(&api_for(&server), store.clone()).await.unwrap();

    let err = outcome.articles.unwrap_err();
    assert!(err.to_string().contains("Error fetching RSS"), "{err}");
    assert_eq!(outcome.new.as_slice(), ["o".to_string()]);
    assert!(store.get(StateKey::LastVisit).await.unwrap().is_some());
}

#[tokio::test]
async fn test_second_visit_without_new_items_has_empty_new_set() {
    let server = MockServer::start().await;
    mount_feed(
        &server,
        "/api/rss",
        r#"{"items":[{"id":"a","title":"A","url":"https://x/a","date_published":"2024-01-01T10:00:00Z"}]}"#,
    )
    .await;
    mount_feed(&server, "/api/obituaries", r#"{"items":[]}"#).await;

    let store = MemoryStore::new();
    let api = api_for(&server);

    let first = run_visit(&api, store.clone()).await.unwrap();
    assert_eq!(first.new.len(), 1);

    let second = run_visit(&api, store.clone()).await.unwrap();
    assert!(second.new.is_empty());
}

#[tokio::test]
async fn test_favorites_and_read_survive_visits() {
    let server = MockServer::start().await;
    mount_feed(&server, "/api/rss", r#"{"items":[]}"#).await;
    mount_feed(&server, "/api/obituaries", r#"{"items":[]}"#).await;

    let store = MemoryStore::new();
    let mut book = StatusBook::load(store.clone()).await.unwrap();
    assert!(book.toggle_favorite("a").await.unwrap());
    assert!(book.mark_read("a").await.unwrap());

    run_visit(&api_for(&server), store.clone()).await.unwrap();

    let reloaded = StatusBook::load(store).await.unwrap();
    assert!(reloaded.is_favorite("a"));
    assert!(reloaded.is_read("a"));
}
