mod common;

use axum_test::TestServer;
use sink::config::AppEnv;

use common::{RecordingAnalytics, create_test_context, create_test_state, link, test_app, test_config};

#[tokio::test]
async fn test_redirect_success() {
    let ctx = create_test_state();
    ctx.links.insert(link("abc", "https://example.com/target"));
    let server = TestServer::new(test_app(ctx.state)).unwrap();

    let response = server.get("/abc").await;

    assert_eq!(response.status_code(), 301);
    assert_eq!(response.header("location"), "https://example.com/target");
}

#[tokio::test]
async fn test_redirect_succeeds_when_sink_write_fails() {
    let ctx = create_test_context(
        &test_config(AppEnv::Production),
        RecordingAnalytics::failing(),
    );
    ctx.links.insert(link("abc", "https://example.com/target"));
    let server = TestServer::new(test_app(ctx.state)).unwrap();

    let response = server.get("/abc").await;

    assert_eq!(response.status_code(), 301);
    assert_eq!(response.header("location"), "https://example.com/target");

    assert_eq!(ctx.analytics.wait_for_attempts(1).await, 1);
    assert!(ctx.analytics.writes().is_empty());

    // A failed write leaves later redirects unaffected.
    let response = server.get("/abc").await;
    assert_eq!(response.status_code(), 301);
    assert_eq!(ctx.analytics.wait_for_attempts(2).await, 2);
}

#[tokio::test]
async fn test_redirect_uses_configured_status() {
    let mut config = test_config(AppEnv::Production);
    config.redirect_status_code = 307;
    let ctx = create_test_context(&config, RecordingAnalytics::default());
    ctx.links.insert(link("abc", "https://example.com"));
    let server = TestServer::new(test_app(ctx.state)).unwrap();

    let response = server.get("/abc").await;

    assert_eq!(response.status_code(), 307);
}

#[tokio::test]
async fn test_redirect_not_found() {
    let ctx = create_test_state();
    let server = TestServer::new(test_app(ctx.state)).unwrap();

    let response = server.get("/missing").await;

    response.assert_status_not_found();
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["error"]["code"], "not_found");
    assert!(ctx.analytics.writes().is_empty());
}

#[tokio::test]
async fn test_expired_link_is_not_found() {
    let ctx = create_test_state();
    let mut expired = link("old", "https://example.com");
    expired.expiration = Some(1_000);
    ctx.links.insert(expired);
    let server = TestServer::new(test_app(ctx.state)).unwrap();

    server.get("/old").await.assert_status_not_found();
}

#[tokio::test]
async fn test_slug_lookup_is_case_insensitive_by_default() {
    let ctx = create_test_state();
    ctx.links.insert(link("abc", "https://example.com"));
    let server = TestServer::new(test_app(ctx.state)).unwrap();

    let response = server.get("/ABC").await;

    assert_eq!(response.status_code(), 301);
}

#[tokio::test]
async fn test_redirect_records_access_log() {
    let ctx = create_test_state();
    ctx.links.insert(link("abc", "https://example.com/target"));
    let server = TestServer::new(test_app(ctx.state)).unwrap();

    let response = server
        .get("/abc?utm_source=newsletter&utm_medium=email")
        .add_header(
            "User-Agent",
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        )
        .add_header("Referer", "https://news.ycombinator.com/item?id=1")
        .add_header("Accept-Language", "de-DE,de;q=0.9,en;q=0.8")
        .add_header("X-Forwarded-For", "203.0.113.9, 10.0.0.1")
        .add_header("cf-ipcountry", "DE")
        .add_header("cf-ipcity", "Berlin")
        .await;
    assert_eq!(response.status_code(), 301);

    let writes = ctx.analytics.wait_for_writes(1).await;
    assert_eq!(writes.len(), 1);

    let (index, blobs) = &writes[0];
    assert_eq!(index, "id-abc");
    assert_eq!(blobs.len(), 20);
    assert_eq!(blobs[0], "abc");
    assert_eq!(blobs[1], "https://example.com/target");
    assert!(blobs[2].starts_with("Mozilla/5.0"));
    assert_eq!(blobs[3], "203.0.113.9");
    assert_eq!(blobs[4], "news.ycombinator.com");
    assert_eq!(blobs[5], "DE");
    assert_eq!(blobs[7], "Berlin");
    assert_eq!(blobs[9], "de-DE");
    assert_eq!(blobs[11], "Chrome");
    assert_eq!(blobs[14], "");
    assert_eq!(blobs[15], "newsletter");
    assert_eq!(blobs[16], "email");
    assert_eq!(blobs[17], "");
}

#[tokio::test]
async fn test_untrusted_proxy_headers_use_peer_address() {
    let mut config = test_config(AppEnv::Production);
    config.behind_proxy = false;
    let ctx = create_test_context(&config, RecordingAnalytics::default());
    ctx.links.insert(link("abc", "https://example.com"));
    let server = TestServer::new(test_app(ctx.state)).unwrap();

    server
        .get("/abc")
        .add_header("X-Forwarded-For", "203.0.113.9")
        .await;

    let writes = ctx.analytics.wait_for_writes(1).await;
    assert_eq!(writes[0].1[3], "127.0.0.1");
}

#[tokio::test]
async fn test_development_does_not_persist_access_log() {
    let ctx = create_test_context(
        &test_config(AppEnv::Development),
        RecordingAnalytics::default(),
    );
    ctx.links.insert(link("abc", "https://example.com"));
    let server = TestServer::new(test_app(ctx.state)).unwrap();

    let response = server.get("/abc").await;
    assert_eq!(response.status_code(), 301);

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert!(ctx.analytics.writes().is_empty());
}
