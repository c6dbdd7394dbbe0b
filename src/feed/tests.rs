//! Unit tests for the feed client

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::testing::spawn_server;
    use axum::extract::Query;
    use axum::http::{HeaderMap as AxumHeaders, StatusCode};
    use axum::routing::get;
    use axum::Router;
    use std::collections::HashMap;

    const TOKEN: &str = "aaaabbbbccccddddeeeeffff00001111";

    const FEED_BODY: &str = r#"[
        {"title":"Non-Farm Employment Change","country":"USD","date":"2026-03-06T08:30:00-05:00","impact":"High","forecast":"180K","previous":"150K"},
        {"title":"Bank Holiday","country":"JPY","date":"2026-03-06T00:00:00-05:00","impact":"Holiday","forecast":"","previous":""}
    ]"#;

    fn config_for(base: &str, resolve_version: bool) -> FeedConfig {
        FeedConfig {
            calendar_url: format!("{}/calendar", base),
            feed_url: format!("{}/ff_calendar_thisweek.json", base),
            resolve_version,
            landing_timeout_secs: 2,
            fetch_timeout_secs: 2,
        }
    }

    async fn feed(Query(params): Query<HashMap<String, String>>) -> (StatusCode, String) {
        // Only the versioned URL returns data, so tests can tell which was used
        match params.get("version").map(String::as_str) {
            Some(TOKEN) => (StatusCode::OK, FEED_BODY.to_string()),
            _ => (StatusCode::OK, "[]".to_string()),
        }
    }

    #[test]
    fn test_decode_events_skips_malformed_entries() {
        let body = r#"[{"title":"A","impact":"High"}, {"title": 5}, {"title":"B","impact":"low"}]"#;
        let events = decode_events(body).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].title.as_deref(), Some("A"));
        assert_eq!(events[1].title.as_deref(), Some("B"));
    }

    #[test]
    fn test_decode_events_keeps_entry_with_country_and_currency() {
        let body = r#"[{"id":"1","impact":"High","country":"US","currency":"USD",
            "title":"NFP","date":"2026-03-06T12:30:00Z","forecast":"180K","previous":"150K"}]"#;
        let events = decode_events(body).unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].currency_code(), Some("USD"));
    }

    #[test]
    fn test_decode_events_rejects_non_array() {
        assert!(matches!(decode_events(r#"{"error":"blocked"}"#), Err(BotError::Json(_))));
        assert!(matches!(decode_events("<html>"), Err(BotError::Json(_))));
    }

    #[test]
    fn test_browser_headers() {
        let headers = browser_headers();
        assert!(headers["user-agent"].to_str().unwrap().contains("Chrome/130"));
        assert_eq!(headers["referer"], "https://www.google.com/");
        assert!(headers.get("accept-encoding").is_none());
    }

    #[tokio::test]
    async fn test_fetch_resolves_version() {
        let landing = format!(
            "<html><script>var feed = 'ff_calendar_thisweek.json?version={}';</script></html>",
            TOKEN
        );
        let app = Router::new()
            .route("/calendar", get(move || async move { landing }))
            .route("/ff_calendar_thisweek.json", get(feed));
        let base = spawn_server(app).await;

        let client = FeedClient::new(config_for(&base, true)).unwrap();
        assert_eq!(
            client.resolve_feed_url().await,
            format!("{}/ff_calendar_thisweek.json?version={}", base, TOKEN)
        );

        let events = client.fetch_events().await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].country.as_deref(), Some("USD"));
        assert!(events[0].is_high_impact());
    }

    #[tokio::test]
    async fn test_fetch_falls_back_without_token() {
        let app = Router::new()
            .route("/calendar", get(|| async { "<html>nothing here</html>" }))
            .route("/ff_calendar_thisweek.json", get(feed));
        let base = spawn_server(app).await;

        let client = FeedClient::new(config_for(&base, true)).unwrap();
        assert_eq!(
            client.resolve_feed_url().await,
            format!("{}/ff_calendar_thisweek.json", base)
        );
        assert!(client.fetch_events().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_falls_back_when_landing_page_fails() {
        let app = Router::new()
            .route("/calendar", get(|| async { StatusCode::FORBIDDEN }))
            .route("/ff_calendar_thisweek.json", get(feed));
        let base = spawn_server(app).await;

        let client = FeedClient::new(config_for(&base, true)).unwrap();
        assert_eq!(
            client.resolve_feed_url().await,
            format!("{}/ff_calendar_thisweek.json", base)
        );
    }

    #[tokio::test]
    async fn test_resolution_disabled_skips_landing_page() {
        // No /calendar route at all: a request there would 404 but never happens
        let app = Router::new().route("/ff_calendar_thisweek.json", get(feed));
        let base = spawn_server(app).await;

        let client = FeedClient::new(config_for(&base, false)).unwrap();
        assert_eq!(
            client.resolve_feed_url().await,
            format!("{}/ff_calendar_thisweek.json", base)
        );
    }

    #[tokio::test]
    async fn test_fetch_sends_browser_headers() {
        let app = Router::new().route(
            "/ff_calendar_thisweek.json",
            get(|headers: AxumHeaders| async move {
                let ua = headers
                    .get("user-agent")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default();
                if ua.contains("Mozilla/5.0") {
                    (StatusCode::OK, "[]")
                } else {
                    (StatusCode::FORBIDDEN, "bot detected")
                }
            }),
        );
        let base = spawn_server(app).await;

        let client = FeedClient::new(config_for(&base, false)).unwrap();
        assert!(client.fetch_events().await.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_non_success_status() {
        let app = Router::new().route(
            "/ff_calendar_thisweek.json",
            get(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
        );
        let base = spawn_server(app).await;

        let client = FeedClient::new(config_for(&base, false)).unwrap();
        match client.fetch_events().await {
            Err(BotError::Status { status, .. }) => {
                assert_eq!(status, reqwest::StatusCode::TOO_MANY_REQUESTS)
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_malformed_body() {
        let app = Router::new().route(
            "/ff_calendar_thisweek.json",
            get(|| async { "<html>maintenance</html>" }),
        );
        let base = spawn_server(app).await;

        let client = FeedClient::new(config_for(&base, false)).unwrap();
        assert!(matches!(client.fetch_events().await, Err(BotError::Json(_))));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let client = FeedClient::new(config_for(&base, true)).unwrap();
        assert!(matches!(client.fetch_events().await, Err(BotError::Http(_))));
    }
}
