use std::time::Duration;

use reqwest::Client;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shortform_factory::trends::TrendSource;

fn source_for(server: &MockServer) -> TrendSource {
    TrendSource::with_base_url(
        Client::new(),
        "test-key".to_string(),
        server.uri(),
        10,
        Duration::from_secs(600),
    )
}

#[tokio::test]
async fn trending_titles_are_cleaned_and_cached() {
    let server = MockServer::start().await;
    let body = json!({
        "items": [
            {"snippet": {"title": "AI takes over!! #shorts"}},
            {"snippet": {"title": "abc"}},
            {"snippet": {"title": "the quiet rise of rust"}}
        ]
    });
    Mock::given(method("GET"))
        .and(path("/videos"))
        .and(query_param("chart", "mostPopular"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let source = source_for(&server);
    let first = source.fetch("US", None, 5).await;
    assert_eq!(first, vec!["Ai Takes Over", "The Quiet Rise Of Rust"]);

    let second = source.fetch("US", None, 5).await;
    assert_eq!(second, first);
    // Second fetch came out of the cache.
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn topic_search_hits_the_search_endpoint() {
    let server = MockServer::start().await;
    let body = json!({
        "items": [{"snippet": {"title": "Rust async explained"}}]
    });
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "rust"))
        .and(query_param("order", "viewCount"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let source = source_for(&server);
    let titles = source.fetch("US", Some("rust"), 5).await;
    assert_eq!(titles, vec!["Rust Async Explained"]);
}

#[tokio::test]
async fn lookup_failure_yields_a_sentinel_entry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/videos"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let source = source_for(&server);
    let titles = source.fetch("US", None, 5).await;
    assert_eq!(titles.len(), 1);
    assert!(titles[0].starts_with("Error fetching trends:"));
}

#[tokio::test]
async fn different_regions_are_cached_separately() {
    let server = MockServer::start().await;
    let body = json!({
        "items": [{"snippet": {"title": "something trending"}}]
    });
    Mock::given(method("GET"))
        .and(path("/videos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let source = source_for(&server);
    source.fetch("US", None, 5).await;
    source.fetch("GB", None, 5).await;
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}
