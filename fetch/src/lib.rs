//! Single-attempt JSON fetching with a deadline and cooperative cancellation.
//!
//! # Overview
//!
//! [`fetch_data`] performs one HTTP GET and decodes the body as JSON. The
//! request future is wrapped in [`Abortable`], so it can be stopped either by
//! an internal deadline or by an [`AbortHandle`] the caller owns:
//!
//! | Caller passes a signal | Who cancels |
//! |------------------------|-------------|
//! | no  | internal deadline task after `timeout` |
//! | yes | only the caller's `AbortHandle` |
//!
//! The deadline task is owned by a guard and aborted on every exit path, so
//! no timer outlives the call.
//!
//! # Errors
//!
//! All failures are reported as [`FetchError`]. There are no retries.

mod error;
mod options;

pub use error::FetchError;
pub use futures_util::future::{AbortHandle, AbortRegistration};
pub use options::{DEFAULT_TIMEOUT, FetchOptions};

use std::sync::OnceLock;
use std::time::{Duration, Instant};

use futures_util::future::{Abortable, Aborted};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;
use url::Url;

const CONNECT_TIMEOUT_SECS: u64 = 30;
const TCP_KEEPALIVE_SECS: u64 = 60;

/// Shared client for the process. Timeouts are applied per call, not here.
pub fn http_client() -> &'static reqwest::Client {
    static CLIENT: OnceLock<reqwest::Client> = OnceLock::new();
    CLIENT.get_or_init(|| {
        base_client_builder().build().unwrap_or_else(|e| {
            tracing::error!("Failed to build HTTP client: {e}. Falling back to defaults.");
            reqwest::Client::new()
        })
    })
}

fn base_client_builder() -> reqwest::ClientBuilder {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    reqwest::Client::builder()
        .user_agent(concat!("feedview/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .tcp_keepalive(Some(Duration::from_secs(TCP_KEEPALIVE_SECS)))
        // Pooled connections must not outlive the runtime that opened them.
        .pool_max_idle_per_host(0)
        .default_headers(default_headers)
}

/// Fetch `endpoint` with the shared [`http_client`].
pub async fn fetch_json<T>(endpoint: &str, options: FetchOptions) -> Result<T, FetchError>
where
    T: DeserializeOwned,
{
    fetch_data(http_client(), endpoint, options).await
}

/// GET `endpoint` and decode the body as `T`.
///
/// Resolves only for 2xx responses whose body parses as `T`. The body's shape
/// is checked by `T`'s `Deserialize` impl and nothing else.
pub async fn fetch_data<T>(
    client: &reqwest::Client,
    endpoint: &str,
    options: FetchOptions,
) -> Result<T, FetchError>
where
    T: DeserializeOwned,
{
    let url = parse_endpoint(endpoint)?;
    let FetchOptions { timeout, signal } = options;

    let external = signal.is_some();
    let (registration, deadline) = match signal {
        Some(registration) => (registration, None),
        None => {
            let (handle, registration) = AbortHandle::new_pair();
            (registration, Some(Deadline::arm(handle, timeout)))
        }
    };

    tracing::debug!(
        %url,
        timeout_ms = timeout.as_millis() as u64,
        external_signal = external,
        "Fetching"
    );
    let started = Instant::now();

    let request = async {
        let response = client
            .get(url.clone())
            .send()
            .await
            .map_err(FetchError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(FetchError::from_transport)?;
        serde_json::from_slice::<T>(&bytes).map_err(FetchError::Decode)
    };

    let outcome = Abortable::new(request, registration).await;
    let fired = deadline.is_some_and(|d| d.disarm());
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match outcome {
        Ok(Ok(value)) => {
            tracing::debug!(%url, elapsed_ms, "Fetch complete");
            Ok(value)
        }
        Ok(Err(err)) => {
            tracing::debug!(%url, elapsed_ms, error = %err, "Fetch failed");
            Err(err)
        }
        Err(Aborted) => {
            if fired {
                tracing::warn!(%url, elapsed_ms, "Fetch timed out");
            } else {
                tracing::debug!(%url, elapsed_ms, "Fetch cancelled");
            }
            Err(FetchError::TimeoutOrCancelled)
        }
    }
}

fn parse_endpoint(endpoint: &str) -> Result<Url, FetchError> {
    let invalid = |reason: String| FetchError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason,
    };

    if endpoint.trim().is_empty() {
        return Err(invalid("endpoint is empty".to_string()));
    }
    let url = Url::parse(endpoint.trim()).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(invalid(format!("unsupported scheme '{scheme}'"))),
    }
}

/// Timer task that aborts a request once `timeout` elapses.
///
/// Dropping or disarming the guard cancels the timer.
struct Deadline {
    timer: JoinHandle<()>,
    handle: AbortHandle,
}

impl Deadline {
    fn arm(handle: AbortHandle, timeout: Duration) -> Self {
        let fire = handle.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            fire.abort();
        });
        Self { timer, handle }
    }

    /// Stop the timer; returns whether it had already fired.
    fn disarm(self) -> bool {
        self.handle.is_aborted()
    }
}

impl Drop for Deadline {
    fn drop(&mut self) {
        self.timer.abort();
    }
}


#[cfg(test)]
mod integration_tests {
    use super::*;
    use feedview_types::Post;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_posts() -> serde_json::Value {
        serde_json::json!([
            { "id": 1, "title": "Test", "body": "Test body", "userId": 1 },
            { "id": 2, "title": "Second", "body": "More", "userId": 1 }
        ])
    }

    async fn mount_posts(server: &MockServer, template: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path("/posts"))
            .respond_with(template)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn resolves_with_decoded_body() {
        let server = MockServer::start().await;
        mount_posts(&server, ResponseTemplate::new(200).set_body_json(sample_posts())).await;

        let url = format!("{}/posts", server.uri());
        let posts: Vec<Post> = fetch_data(&reqwest::Client::new(), &url, FetchOptions::default())
            .await
            .unwrap();

        assert_eq!(
            posts,
            vec![
                Post::new(1, "Test").with_body("Test body").with_user_id(1),
                Post::new(2, "Second").with_body("More").with_user_id(1),
            ]
        );
    }

    #[tokio::test]
    async fn untyped_value_is_structurally_equal() {
        let server = MockServer::start().await;
        mount_posts(&server, ResponseTemplate::new(200).set_body_json(sample_posts())).await;

        let url = format!("{}/posts", server.uri());
        let value: serde_json::Value = fetch_json(&url, FetchOptions::default()).await.unwrap();
        assert_eq!(value, sample_posts());
    }

    #[tokio::test]
    async fn non_ok_status_reports_code() {
        let server = MockServer::start().await;
        mount_posts(&server, ResponseTemplate::new(404)).await;

        let url = format!("{}/posts", server.uri());
        let err = fetch_data::<Vec<Post>>(&reqwest::Client::new(), &url, FetchOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Http { status: 404 }));
        assert_eq!(err.to_string(), "HTTP error! status: 404");
    }

    #[tokio::test]
    async fn server_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/posts"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/posts", server.uri());
        let err = fetch_data::<Vec<Post>>(&reqwest::Client::new(), &url, FetchOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(503));
        server.verify().await;
    }

    #[tokio::test]
    async fn times_out_when_server_stalls() {
        let server = MockServer::start().await;
        mount_posts(
            &server,
            ResponseTemplate::new(200)
                .set_body_json(sample_posts())
                .set_delay(Duration::from_secs(10)),
        )
        .await;

        let url = format!("{}/posts", server.uri());
        let started = Instant::now();
        let err = fetch_data::<Vec<Post>>(
            &reqwest::Client::new(),
            &url,
            FetchOptions::new().with_timeout_ms(100),
        )
        .await
        .unwrap_err();

        assert!(err.is_cancellation());
        assert_eq!(err.to_string(), "Request timeout or cancelled");
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn external_abort_cancels_request() {
        let server = MockServer::start().await;
        mount_posts(
            &server,
            ResponseTemplate::new(200)
                .set_body_json(sample_posts())
                .set_delay(Duration::from_secs(10)),
        )
        .await;

        let url = format!("{}/posts", server.uri());
        let (handle, registration) = AbortHandle::new_pair();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            handle.abort();
        });

        let err = fetch_data::<Vec<Post>>(
            &reqwest::Client::new(),
            &url,
            FetchOptions::new().with_signal(registration),
        )
        .await
        .unwrap_err();

        assert_eq!(err.to_string(), "Request timeout or cancelled");
    }

    #[tokio::test]
    async fn already_aborted_signal_fails_fast() {
        let server = MockServer::start().await;
        mount_posts(&server, ResponseTemplate::new(200).set_body_json(sample_posts())).await;

        let url = format!("{}/posts", server.uri());
        let (handle, registration) = AbortHandle::new_pair();
        handle.abort();

        let err = fetch_data::<Vec<Post>>(
            &reqwest::Client::new(),
            &url,
            FetchOptions::new().with_signal(registration),
        )
        .await
        .unwrap_err();

        assert!(err.is_cancellation());
    }

    #[tokio::test]
    async fn external_signal_disables_internal_deadline() {
        let server = MockServer::start().await;
        mount_posts(
            &server,
            ResponseTemplate::new(200)
                .set_body_json(sample_posts())
                .set_delay(Duration::from_millis(200)),
        )
        .await;

        let url = format!("{}/posts", server.uri());
        let (_handle, registration) = AbortHandle::new_pair();
        let posts: Vec<Post> = fetch_data(
            &reqwest::Client::new(),
            &url,
            FetchOptions::new()
                .with_timeout_ms(10)
                .with_signal(registration),
        )
        .await
        .unwrap();

        assert_eq!(posts.len(), 2);
    }

    #[tokio::test]
    async fn malformed_body_is_decode_error() {
        let server = MockServer::start().await;
        mount_posts(&server, ResponseTemplate::new(200).set_body_string("not json")).await;

        let url = format!("{}/posts", server.uri());
        let err = fetch_data::<Vec<Post>>(&reqwest::Client::new(), &url, FetchOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[tokio::test]
    async fn connection_refused_is_transport_error() {
        // Bind then drop to get a port with nothing listening.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let url = format!("http://127.0.0.1:{port}/posts");

        let err = fetch_data::<Vec<Post>>(&reqwest::Client::new(), &url, FetchOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Transport(_)));
    }

    #[tokio::test]
    async fn repeated_calls_are_independent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/posts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_posts()))
            .expect(2)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/posts", server.uri());
        let first: Vec<Post> = fetch_data(&client, &url, FetchOptions::default())
            .await
            .unwrap();
        let second: Vec<Post> = fetch_data(&client, &url, FetchOptions::default())
            .await
            .unwrap();

        assert_eq!(first, second);
        server.verify().await;
    }
}
