//! Fetcher tests against a mock posts API

use std::time::{Duration, Instant};

use feedview_fetch::{AbortHandle, FetchError, FetchOptions, fetch_json};
use feedview_types::Post;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common::{POSTS_PATH, mount_delayed_posts, mount_posts, posts_url, start_posts_mock};

#[tokio::test]
async fn decodes_full_post_records() {
    let server = start_posts_mock().await;
    mount_posts(
        &server,
        json!([
            {"userId": 1, "id": 1, "title": "sunt aut facere", "body": "quia et suscipit"},
            {"userId": 1, "id": 2, "title": "qui est esse", "body": "est rerum tempore"}
        ]),
    )
    .await;

    let posts: Vec<Post> = fetch_json(&posts_url(&server), FetchOptions::new())
        .await
        .unwrap();

    assert_eq!(
        posts,
        vec![
            Post::new(1, "sunt aut facere")
                .with_body("quia et suscipit")
                .with_user_id(1),
            Post::new(2, "qui est esse")
                .with_body("est rerum tempore")
                .with_user_id(1),
        ]
    );
}

#[tokio::test]
async fn identical_calls_hit_the_server_independently() {
    let server = start_posts_mock().await;
    Mock::given(method("GET"))
        .and(path(POSTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 7, "title": "t"}])))
        .expect(2)
        .mount(&server)
        .await;

    let url = posts_url(&server);
    let first: Vec<Post> = fetch_json(&url, FetchOptions::new()).await.unwrap();
    let second: Vec<Post> = fetch_json(&url, FetchOptions::new()).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first, vec![Post::new(7, "t")]);
}

#[tokio::test]
async fn not_found_reports_status() {
    let server = start_posts_mock().await;
    // Nothing mounted: wiremock answers 404.
    let err = fetch_json::<Vec<Post>>(&posts_url(&server), FetchOptions::new())
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(404));
    assert_eq!(err.to_string(), "HTTP error! status: 404");
}

#[tokio::test]
async fn timeout_fires_well_before_slow_server() {
    let server = start_posts_mock().await;
    mount_delayed_posts(&server, json!([]), Duration::from_secs(10)).await;

    let started = Instant::now();
    let err = fetch_json::<Vec<Post>>(
        &posts_url(&server),
        FetchOptions::new().with_timeout_ms(100),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, FetchError::TimeoutOrCancelled));
    assert_eq!(err.to_string(), "Request timeout or cancelled");
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn caller_abort_cancels_in_flight_request() {
    let server = start_posts_mock().await;
    mount_delayed_posts(&server, json!([]), Duration::from_secs(10)).await;

    let (handle, registration) = AbortHandle::new_pair();
    let url = posts_url(&server);
    let request = tokio::spawn(async move {
        fetch_json::<Vec<Post>>(&url, FetchOptions::new().with_signal(registration)).await
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    handle.abort();

    let err = tokio::time::timeout(Duration::from_secs(5), request)
        .await
        .expect("abort should settle the request")
        .unwrap()
        .unwrap_err();
    assert!(err.is_cancellation());
}
