//! Integration tests for the shipped HTTP fetcher and HTML extractor
//!
//! These tests use wiremock to serve a miniature legal-code site and run
//! the real adapters against it, end to end through the walker.

use statute_loom::config::{CrawlConfig, UserAgentConfig};
use statute_loom::extract::HtmlExtractor;
use statute_loom::fetch::{HttpFetcher, PageFetcher};
use statute_loom::store::SnapshotStore;
use statute_loom::walker::Walker;
use statute_loom::FetchError;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_user_agent() -> UserAgentConfig {
    UserAgentConfig {
        crawler_name: "TestBot".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: "https://example.com/contact".to_string(),
        contact_email: "test@example.com".to_string(),
    }
}

fn test_crawl_config(base_url: &str) -> CrawlConfig {
    CrawlConfig {
        base_url: format!("{}/code/index", base_url),
        max_retries: 2,
        retry_delay_ms: 10,
        step_timeout_ms: 2000,
        pace_delay_ms: 1,
    }
}

async fn html(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_http_fetcher_returns_page_body() {
    let server = MockServer::start().await;
    html(
        &server,
        "/page",
        "<html><body>Hello</body></html>".to_string(),
    )
    .await;

    let fetcher = HttpFetcher::new(&test_user_agent()).unwrap();
    let page = fetcher
        .fetch(&format!("{}/page", server.uri()), Duration::from_secs(5))
        .await
        .unwrap();

    assert!(page.body.contains("Hello"));
    assert!(page.url.ends_with("/page"));
}

#[tokio::test]
async fn test_http_fetcher_maps_error_status_to_navigation() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(&test_user_agent()).unwrap();
    let result = fetcher
        .fetch(&format!("{}/missing", server.uri()), Duration::from_secs(5))
        .await;

    match result {
        Err(FetchError::Navigation { message, .. }) => assert!(message.contains("404")),
        other => panic!("expected Navigation error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_http_fetcher_maps_deadline_to_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("late")
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(&test_user_agent()).unwrap();
    let result = fetcher
        .fetch(
            &format!("{}/slow", server.uri()),
            Duration::from_millis(100),
        )
        .await;

    assert!(matches!(result, Err(FetchError::Timeout { .. })));
}

/// Serves a one-part, one-title, one-chapter, two-section site in the
/// markup the HTML extractor expects.
async fn mount_mini_site(server: &MockServer) {
    let base = server.uri();

    html(
        server,
        "/code/index",
        format!(
            r#"<html><body><ol class="code-parts">
                <li><a class="part-link" href="{base}/parts/I">Part I General Provisions Chapters. 1-24</a></li>
            </ol></body></html>"#
        ),
    )
    .await;

    html(
        server,
        "/parts/I",
        format!(
            r#"<html><body><ul>
                <li class="title-node" data-chapters-url="{base}/ajax/chapters-I-I">Title I Administration</li>
            </ul></body></html>"#
        ),
    )
    .await;

    html(
        server,
        "/ajax/chapters-I-I",
        format!(
            r#"<ul><li><a class="chapter-link" href="{base}/chapters/1">Chapter 1 General</a></li></ul>"#
        ),
    )
    .await;

    html(
        server,
        "/chapters/1",
        format!(
            r#"<html><body><table class="section-list">
                <tr><td><a class="section-link" href="{base}/sections/1-101">§ 1-101. Definitions.</a></td></tr>
                <tr><td><a class="section-link" href="{base}/sections/1-102">§ 1-102. Repealed.</a></td></tr>
            </table></body></html>"#
        ),
    )
    .await;

    html(
        server,
        "/sections/1-101",
        r#"<html><body>
            <h2 class="section-heading">§ 1-101. Definitions.</h2>
            <div class="section-text"><p>Words mean things.</p><p>Unless they do not.</p></div>
        </body></html>"#
            .to_string(),
    )
    .await;

    html(
        server,
        "/sections/1-102",
        r#"<html><body>
            <h2 class="section-heading">§ 1-102. Repealed.</h2>
            <div class="section-text"></div>
        </body></html>"#
            .to_string(),
    )
    .await;
}

#[tokio::test]
async fn test_end_to_end_crawl_with_real_adapters() {
    let server = MockServer::start().await;
    mount_mini_site(&server).await;

    let dir = TempDir::new().unwrap();
    let snapshot = dir.path().join("snapshot.json");

    let fetcher = HttpFetcher::new(&test_user_agent()).unwrap();
    let extractor = HtmlExtractor::new(fetcher.client().clone(), Duration::from_secs(2));
    let store = SnapshotStore::new(&snapshot);

    let mut walker = Walker::new(fetcher, extractor, store, test_crawl_config(&server.uri()));
    let stats = walker.run(false).await.unwrap();

    assert_eq!(stats.parts_processed, 1);
    assert_eq!(stats.titles_processed, 1);
    assert_eq!(stats.chapters_processed, 1);
    assert_eq!(stats.sections_fetched, 2);

    let doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&snapshot).unwrap()).unwrap();
    assert_eq!(doc["parts"][0]["part"], "I");
    assert_eq!(doc["parts"][0]["part_title"], "General Provisions");

    let chapter = &doc["parts"][0]["titles"][0]["chapters"][0];
    assert_eq!(chapter["chapter"], "1");
    assert_eq!(chapter["chapter_title"], "General");

    let sections = chapter["sections"].as_array().unwrap();
    assert_eq!(sections.len(), 2);
    assert_eq!(sections[0]["section"], "1-101");
    assert_eq!(
        sections[0]["full_text"],
        "Words mean things.\n\nUnless they do not."
    );
    // Repealed stub: empty body, terminal title
    assert_eq!(sections[1]["section"], "1-102");
    assert_eq!(sections[1]["section_title"], "Repealed.");
    assert_eq!(sections[1]["full_text"], "");
}

#[tokio::test]
async fn test_end_to_end_second_run_skips_satisfied_chapter() {
    let server = MockServer::start().await;
    mount_mini_site(&server).await;

    let dir = TempDir::new().unwrap();
    let snapshot = dir.path().join("snapshot.json");
    let config = test_crawl_config(&server.uri());

    let fetcher = HttpFetcher::new(&test_user_agent()).unwrap();
    let extractor = HtmlExtractor::new(fetcher.client().clone(), Duration::from_secs(2));
    let mut walker = Walker::new(
        fetcher,
        extractor,
        SnapshotStore::new(&snapshot),
        config.clone(),
    );
    walker.run(false).await.unwrap();
    let first_bytes = std::fs::read(&snapshot).unwrap();

    // 1-101 has text, 1-102 is a repealed stub: both complete, so the
    // second run re-reads only structural pages
    let fetcher = HttpFetcher::new(&test_user_agent()).unwrap();
    let extractor = HtmlExtractor::new(fetcher.client().clone(), Duration::from_secs(2));
    let mut walker = Walker::new(
        fetcher,
        extractor,
        SnapshotStore::new(&snapshot),
        config,
    );
    let stats = walker.run(false).await.unwrap();

    assert_eq!(stats.chapters_skipped, 1);
    assert_eq!(stats.sections_fetched, 0);
    assert_eq!(std::fs::read(&snapshot).unwrap(), first_bytes);
}
