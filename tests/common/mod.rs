//! Shared test utilities and fixtures
//!
//! Mock posts endpoints for integration tests.

#![allow(dead_code)]

use std::time::Duration;

use feedview_engine::{App, FeedSettings, UiOptions};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const POSTS_PATH: &str = "/posts";

/// Start a mock server standing in for the posts API.
pub async fn start_posts_mock() -> MockServer {
    MockServer::start().await
}

pub fn posts_url(server: &MockServer) -> String {
    format!("{}{POSTS_PATH}", server.uri())
}

/// Mount a 200 response carrying `body` as JSON.
pub async fn mount_posts(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(POSTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Mount a bare status response with no body.
pub async fn mount_status(server: &MockServer, status: u16) {
    Mock::given(method("GET"))
        .and(path(POSTS_PATH))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Mount a response that only arrives after `delay`.
pub async fn mount_delayed_posts(server: &MockServer, body: serde_json::Value, delay: Duration) {
    Mock::given(method("GET"))
        .and(path(POSTS_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(body)
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

/// Mount the view against the mock with the given timeout.
pub fn app_for(server: &MockServer, timeout: Duration) -> App {
    let settings = FeedSettings {
        endpoint: posts_url(server),
        timeout,
    };
    App::with_settings(settings, UiOptions::default())
}

/// Tick `app` until it leaves `Loading` or `limit` elapses.
pub async fn settle(app: &mut App, limit: Duration) {
    let deadline = tokio::time::Instant::now() + limit;
    while app.is_loading() && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(5)).await;
        app.tick();
    }
}
