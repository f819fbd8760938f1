//! Posts view driven against a mock posts API

use std::time::Duration;

use feedview_engine::{App, FeedSettings, Post, PostsState, UiOptions};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::ResponseTemplate;
use wiremock::matchers::{method, path};

use crate::common::{
    POSTS_PATH, app_for, mount_delayed_posts, mount_posts, mount_status, settle,
    start_posts_mock,
};

const SETTLE_LIMIT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn loads_posts_from_endpoint() {
    let server = start_posts_mock().await;
    mount_posts(&server, json!([{"id": 1, "title": "Test"}])).await;

    let mut app = app_for(&server, Duration::from_secs(5));
    assert!(app.is_loading());
    settle(&mut app, SETTLE_LIMIT).await;

    assert_eq!(app.state(), &PostsState::Loaded(vec![Post::new(1, "Test")]));
}

#[tokio::test]
async fn http_failure_becomes_error_message() {
    let server = start_posts_mock().await;
    mount_status(&server, 500).await;

    let mut app = app_for(&server, Duration::from_secs(5));
    settle(&mut app, SETTLE_LIMIT).await;

    assert_eq!(app.state().error(), Some("HTTP error! status: 500"));
}

#[tokio::test]
async fn slow_endpoint_times_out() {
    let server = start_posts_mock().await;
    mount_delayed_posts(&server, json!([]), Duration::from_secs(10)).await;

    let mut app = app_for(&server, Duration::from_millis(100));
    settle(&mut app, SETTLE_LIMIT).await;

    assert_eq!(app.state().error(), Some("Request timeout or cancelled"));
}

#[tokio::test]
async fn unexpected_shape_fails() {
    let server = start_posts_mock().await;
    mount_posts(&server, json!({"posts": []})).await;

    let mut app = app_for(&server, Duration::from_secs(5));
    settle(&mut app, SETTLE_LIMIT).await;

    assert!(app.state().error().is_some());
    assert!(app.state().posts().is_empty());
}

#[tokio::test]
async fn fetches_exactly_once_per_mount() {
    let server = start_posts_mock().await;
    wiremock::Mock::given(method("GET"))
        .and(path(POSTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let mut app = app_for(&server, Duration::from_secs(5));
    settle(&mut app, SETTLE_LIMIT).await;
    for _ in 0..10 {
        tokio::time::sleep(Duration::from_millis(5)).await;
        app.tick();
    }

    assert_eq!(app.state(), &PostsState::Loaded(Vec::new()));
}

#[tokio::test]
async fn relative_endpoint_is_rejected_without_io() {
    let settings = FeedSettings {
        endpoint: "/posts".to_string(),
        timeout: Duration::from_secs(5),
    };
    let mut app = App::with_settings(settings, UiOptions::default());
    settle(&mut app, SETTLE_LIMIT).await;

    let message = app.state().error().unwrap_or_default();
    assert!(message.starts_with("invalid endpoint"), "{message}");
}
