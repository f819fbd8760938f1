//! Core engine for feedview - the posts view state machine.
//!
//! This crate contains the App state without TUI dependencies. The TUI
//! reads it through accessors and drives it with `tick()` and the scroll
//! commands.
//!
//! ```text
//! App::load ──spawn──> fetch task ──(JoinHandle)──> App::tick ──> PostsState
//!                                                     Loading -> Loaded | Failed
//! ```

use std::future::Future;

use futures_util::FutureExt;
use tokio::task::JoinHandle;

pub use feedview_fetch::{FetchError, FetchOptions};
pub use feedview_types::{Post, UiOptions};

mod config;
pub use config::{
    AppConfig, ConfigError, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_MS, FeedConfig, FeedSettings,
    FeedviewConfig, config_path, expand_env_vars,
};


/// What the posts view is showing.
///
/// `Loaded` and `Failed` are terminal: nothing moves the view back to
/// `Loading` for the lifetime of an [`App`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostsState {
    Loading,
    Loaded(Vec<Post>),
    Failed(String),
}

impl PostsState {
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, PostsState::Loading)
    }

    #[must_use]
    pub fn posts(&self) -> &[Post] {
        match self {
            PostsState::Loaded(posts) => posts,
            _ => &[],
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            PostsState::Failed(message) => Some(message),
            _ => None,
        }
    }
}

type FetchResult = Result<Vec<Post>, FetchError>;

pub struct App {
    state: PostsState,
    pending: Option<JoinHandle<FetchResult>>,
    endpoint: Option<String>,
    ui_options: UiOptions,
    notice: Option<String>,
    scroll: usize,
    viewport_rows: usize,
    tick: usize,
    should_quit: bool,
}

impl App {
    /// Load config from disk and start fetching.
    ///
    /// A broken config file is not fatal: defaults are used and the problem
    /// is surfaced through [`App::notice`]. Must be called inside a tokio
    /// runtime.
    pub fn load() -> Self {
        let (config, config_error) = match FeedviewConfig::load() {
            Ok(config) => (config, None),
            Err(err) => (None, Some(err)),
        };
        let settings = FeedSettings::resolve(config.as_ref());
        let ui_options = config::ui_options_from_config(config.as_ref());

        let mut app = Self::with_settings(settings, ui_options);
        if let Some(err) = config_error {
            app.notice = Some(format!("{err}. Using defaults."));
        }
        app
    }

    /// Start fetching the posts list described by `settings`.
    pub fn with_settings(settings: FeedSettings, ui_options: UiOptions) -> Self {
        let FeedSettings { endpoint, timeout } = settings;
        let url = endpoint.clone();
        let fetch = async move {
            let options = FetchOptions::new().with_timeout(timeout);
            feedview_fetch::fetch_json::<Vec<Post>>(&url, options).await
        };
        let mut app = Self::with_fetch(fetch, ui_options);
        app.endpoint = Some(endpoint);
        app
    }

    /// Mount the view over an arbitrary fetch future.
    ///
    /// The future is spawned immediately and polled exactly once to
    /// completion; its outcome decides the terminal state.
    pub fn with_fetch<F>(fetch: F, ui_options: UiOptions) -> Self
    where
        F: Future<Output = FetchResult> + Send + 'static,
    {
        Self {
            state: PostsState::Loading,
            pending: Some(tokio::spawn(fetch)),
            endpoint: None,
            ui_options,
            notice: None,
            scroll: 0,
            viewport_rows: 1,
            tick: 0,
            should_quit: false,
        }
    }

    /// Advance animation and pick up a finished fetch, if any.
    pub fn tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);

        let Some(handle) = self.pending.as_mut() else {
            return;
        };
        let Some(joined) = handle.now_or_never() else {
            return;
        };
        self.pending = None;

        let outcome = joined.unwrap_or_else(|join_err| {
            tracing::error!("Fetch task ended abnormally: {join_err}");
            Err(FetchError::Unknown)
        });
        self.apply_fetch_result(outcome);
    }

    fn apply_fetch_result(&mut self, outcome: FetchResult) {
        self.state = match outcome {
            Ok(posts) => {
                tracing::info!(count = posts.len(), "Fetched posts");
                PostsState::Loaded(posts)
            }
            Err(err) => {
                tracing::error!("Error fetching data: {err}");
                PostsState::Failed(err.to_string())
            }
        };
        self.scroll = 0;
    }

    pub fn state(&self) -> &PostsState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading()
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    pub fn ui_options(&self) -> UiOptions {
        self.ui_options
    }

    /// One-line message about startup problems (e.g. unreadable config).
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn tick_count(&self) -> usize {
        self.tick
    }

    // ========================================================================
    // Scrolling
    // ========================================================================

    /// Index of the first visible post.
    pub fn scroll(&self) -> usize {
        self.scroll
    }

    /// Record how many post rows fit on screen; re-clamps the offset.
    pub fn set_viewport_rows(&mut self, rows: usize) {
        self.viewport_rows = rows.max(1);
        self.scroll = self.scroll.min(self.max_scroll());
    }

    pub fn viewport_rows(&self) -> usize {
        self.viewport_rows
    }

    fn max_scroll(&self) -> usize {
        self.state
            .posts()
            .len()
            .saturating_sub(self.viewport_rows)
    }

    pub fn scroll_down(&mut self, rows: usize) {
        self.scroll = self.scroll.saturating_add(rows).min(self.max_scroll());
    }

    pub fn scroll_up(&mut self, rows: usize) {
        self.scroll = self.scroll.saturating_sub(rows);
    }

    pub fn page_down(&mut self) {
        self.scroll_down(self.viewport_rows);
    }

    pub fn page_up(&mut self) {
        self.scroll_up(self.viewport_rows);
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll = 0;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll = self.max_scroll();
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    pub fn request_quit(&mut self) {
        self.should_quit = true;
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }
}

impl Drop for App {
    fn drop(&mut self) {
        // Unmount: a fetch still in flight has nobody left to report to.
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}
