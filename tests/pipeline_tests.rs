//! End-to-end tests for the crawl-reconcile-notify pipeline
//!
//! These tests run the coordinator against wiremock servers standing in for
//! both the listing source and the webhook endpoint, then assert on the
//! stored listings and the delivered payloads.

use homewatch::config::{
    Config, NotifyConfig, SearchCriteria, SelectorSet, SourceEntry, StoreConfig, WatcherConfig,
};
use homewatch::crawler::Coordinator;
use homewatch::store::{ListingStore, SqliteStore};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_selectors() -> SelectorSet {
    SelectorSet {
        item: "div.listing".to_string(),
        link: "a.listing-link".to_string(),
        title: Some("h2".to_string()),
        price: Some("span.price".to_string()),
        next_page: Some("a.next".to_string()),
        detail_title: Some("h1".to_string()),
        detail_price: Some("strong.price".to_string()),
        detail_description: Some("div.description".to_string()),
        detail_images: Some("img.gallery".to_string()),
    }
}

fn test_config(
    source_uri: &str,
    webhook_url: Option<String>,
    db_path: &str,
    tracked_fields: Vec<String>,
) -> Config {
    Config {
        watcher: WatcherConfig {
            page_cap: 5,
            request_timeout_secs: 5,
        },
        store: StoreConfig {
            database_path: db_path.to_string(),
        },
        notify: NotifyConfig {
            webhook_url,
            min_send_interval_ms: 100,
            max_send_attempts: 0,
            tracked_fields,
        },
        search: SearchCriteria::default(),
        sources: vec![SourceEntry {
            name: "MockSource".to_string(),
            kind: "selector".to_string(),
            list_url: Some(format!("{}/listings?page={{page}}", source_uri)),
            selectors: Some(test_selectors()),
        }],
    }
}

/// Index page with one item per (href, title, price) triple
fn index_html(items: &[(&str, &str, &str)], has_next: bool) -> String {
    let mut html = String::from("<html><body>");
    for (href, title, price) in items {
        html.push_str(&format!(
            r#"<div class="listing">
                <a class="listing-link" href="{}">{}</a>
                <h2>{}</h2>
                <span class="price">{}</span>
            </div>"#,
            href, title, title, price
        ));
    }
    if has_next {
        html.push_str(r#"<a class="next" href="?page=2">next</a>"#);
    }
    html.push_str("</body></html>");
    html
}

fn detail_html(title: &str, price: &str, description: &str, images: u32) -> String {
    let mut html = format!(
        r#"<html><body>
            <h1>{}</h1>
            <strong class="price">{}</strong>
            <div class="description">{}</div>"#,
        title, price, description
    );
    for i in 0..images {
        html.push_str(&format!(
            r#"<img class="gallery" src="https://img.example.com/{}.jpg">"#,
            i
        ));
    }
    html.push_str("</body></html>");
    html
}

async fn mount_index(server: &MockServer, page: &str, body: String) {
    Mock::given(method("GET"))
        .and(path("/listings"))
        .and(query_param("page", page))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_detail(server: &MockServer, offer_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(offer_path))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn webhook_bodies(server: &MockServer) -> Vec<serde_json::Value> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.method.to_string().eq_ignore_ascii_case("post"))
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect()
}

#[tokio::test]
async fn test_new_listings_are_stored_and_notified() {
    let source = MockServer::start().await;
    let webhook = MockServer::start().await;

    mount_index(
        &source,
        "1",
        index_html(
            &[
                ("/offer/1", "Cozy flat", "300 000"),
                ("/offer/2", "Sunny flat", "420 000"),
            ],
            false,
        ),
    )
    .await;
    mount_detail(
        &source,
        "/offer/1",
        detail_html("Cozy flat", "300 000", "Near the park", 3),
    )
    .await;
    mount_detail(
        &source,
        "/offer/2",
        detail_html("Sunny flat", "420 000", "Top floor", 5),
    )
    .await;

    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(204))
        .expect(2)
        .mount(&webhook)
        .await;

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("listings.db");
    let config = test_config(
        &source.uri(),
        Some(format!("{}/hook", webhook.uri())),
        db_path.to_str().unwrap(),
        vec!["price".to_string()],
    );

    let mut coordinator = Coordinator::new(config).unwrap();
    coordinator.run().await.unwrap();
    drop(coordinator);

    // Both listings persisted with their detail fields
    let store = SqliteStore::new(&db_path).unwrap();
    assert_eq!(store.count_total().unwrap(), 2);

    let reference = format!("{}/offer/1", source.uri());
    let stored = store.get_by_reference(&reference).unwrap().unwrap();
    assert_eq!(stored.source_name, "MockSource");
    assert_eq!(stored.title.as_deref(), Some("Cozy flat"));
    assert_eq!(stored.description.as_deref(), Some("Near the park"));
    assert_eq!(stored.image_count, Some(3));
    assert!(stored.full_record.contains("Near the park"));

    // Both webhook payloads are "new listing" embeds
    let bodies = webhook_bodies(&webhook).await;
    assert_eq!(bodies.len(), 2);
    for body in &bodies {
        let title = body["embeds"][0]["title"].as_str().unwrap();
        assert!(title.contains("New listing"), "unexpected embed: {}", title);
    }
}

#[tokio::test]
async fn test_tracked_change_notifies_untracked_change_does_not() {
    let source = MockServer::start().await;
    let webhook = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&webhook)
        .await;

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("listings.db");
    let config = test_config(
        &source.uri(),
        Some(format!("{}/hook", webhook.uri())),
        db_path.to_str().unwrap(),
        vec!["price".to_string()],
    );
    let reference = format!("{}/offer/1", source.uri());

    // First pass: the listing is new
    mount_index(
        &source,
        "1",
        index_html(&[("/offer/1", "Cozy flat", "300000")], false),
    )
    .await;
    mount_detail(
        &source,
        "/offer/1",
        detail_html("Cozy flat", "300000", "Original text", 3),
    )
    .await;

    Coordinator::new(config.clone())
        .unwrap()
        .run()
        .await
        .unwrap();
    assert_eq!(webhook_bodies(&webhook).await.len(), 1);

    // Second pass: the price dropped (tracked field)
    source.reset().await;
    mount_index(
        &source,
        "1",
        index_html(&[("/offer/1", "Cozy flat", "295000")], false),
    )
    .await;
    mount_detail(
        &source,
        "/offer/1",
        detail_html("Cozy flat", "295000", "Original text", 3),
    )
    .await;

    Coordinator::new(config.clone())
        .unwrap()
        .run()
        .await
        .unwrap();

    let bodies = webhook_bodies(&webhook).await;
    assert_eq!(bodies.len(), 2);
    let update = &bodies[1]["embeds"][0];
    assert!(update["title"]
        .as_str()
        .unwrap()
        .contains("Updated listing"));
    let description = update["description"].as_str().unwrap();
    assert!(
        description.contains("`300000` → `295000`"),
        "unexpected change description: {}",
        description
    );

    // Third pass: only the description changed, and it is not tracked
    source.reset().await;
    mount_index(
        &source,
        "1",
        index_html(&[("/offer/1", "Cozy flat", "295000")], false),
    )
    .await;
    mount_detail(
        &source,
        "/offer/1",
        detail_html("Cozy flat", "295000", "Rewritten text", 3),
    )
    .await;

    Coordinator::new(config).unwrap().run().await.unwrap();

    // No new webhook call, but the stored record reflects the new text
    assert_eq!(webhook_bodies(&webhook).await.len(), 2);
    let store = SqliteStore::new(&db_path).unwrap();
    let stored = store.get_by_reference(&reference).unwrap().unwrap();
    assert_eq!(stored.description.as_deref(), Some("Rewritten text"));
    assert!(stored.full_record.contains("Rewritten text"));
}

#[tokio::test]
async fn test_pagination_visits_every_page_until_last() {
    let source = MockServer::start().await;

    mount_index(
        &source,
        "1",
        index_html(&[("/offer/1", "One", "100")], true),
    )
    .await;
    mount_index(
        &source,
        "2",
        index_html(&[("/offer/2", "Two", "200")], false),
    )
    .await;
    mount_detail(&source, "/offer/1", detail_html("One", "100", "d1", 1)).await;
    mount_detail(&source, "/offer/2", detail_html("Two", "200", "d2", 1)).await;

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("listings.db");
    let config = test_config(&source.uri(), None, db_path.to_str().unwrap(), vec![]);

    Coordinator::new(config).unwrap().run().await.unwrap();

    let store = SqliteStore::new(&db_path).unwrap();
    assert_eq!(store.count_total().unwrap(), 2);

    // Exactly two index requests: page 3 was never asked for
    let index_requests = source
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/listings")
        .count();
    assert_eq!(index_requests, 2);
}

#[tokio::test]
async fn test_detail_failure_skips_unknown_and_touches_known() {
    let source = MockServer::start().await;

    // First pass: offer/1 resolves, offer/2's detail page errors out
    mount_index(
        &source,
        "1",
        index_html(
            &[("/offer/1", "One", "100"), ("/offer/2", "Two", "200")],
            false,
        ),
    )
    .await;
    mount_detail(&source, "/offer/1", detail_html("One", "100", "d1", 1)).await;
    Mock::given(method("GET"))
        .and(path("/offer/2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&source)
        .await;

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("listings.db");
    let config = test_config(&source.uri(), None, db_path.to_str().unwrap(), vec![]);
    let reference = format!("{}/offer/1", source.uri());

    Coordinator::new(config.clone())
        .unwrap()
        .run()
        .await
        .unwrap();

    // The failed unknown listing was skipped silently
    let store = SqliteStore::new(&db_path).unwrap();
    assert_eq!(store.count_total().unwrap(), 1);
    let first = store.get_by_reference(&reference).unwrap().unwrap();
    drop(store);

    // Second pass: now offer/1's detail page fails too
    source.reset().await;
    mount_index(
        &source,
        "1",
        index_html(&[("/offer/1", "One", "100")], false),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/offer/1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&source)
        .await;

    Coordinator::new(config).unwrap().run().await.unwrap();

    // Known listing: last_checked advanced, nothing else moved
    let store = SqliteStore::new(&db_path).unwrap();
    let second = store.get_by_reference(&reference).unwrap().unwrap();
    let parse = |s: &str| chrono::DateTime::parse_from_rfc3339(s).unwrap();
    assert!(parse(&second.last_checked) > parse(&first.last_checked));
    assert_eq!(second.last_updated, first.last_updated);
    assert_eq!(second.price, first.price);
}

#[tokio::test]
async fn test_dead_source_aborts_without_failing_the_run() {
    let source = MockServer::start().await;

    // Page 1 returns an empty shell: a hard failure for the source
    mount_index(&source, "1", "<html><body></body></html>".to_string()).await;

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("listings.db");
    let config = test_config(&source.uri(), None, db_path.to_str().unwrap(), vec![]);

    // The run completes despite the source producing nothing
    Coordinator::new(config).unwrap().run().await.unwrap();

    let store = SqliteStore::new(&db_path).unwrap();
    assert_eq!(store.count_total().unwrap(), 0);
}
