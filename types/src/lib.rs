//! Core domain types for feedview.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application.

mod sanitize;
pub use sanitize::sanitize_terminal_text;

use serde::{Deserialize, Serialize};

// ============================================================================
// Post
// ============================================================================

/// A single feed item as served by a JSONPlaceholder-style `/posts` endpoint.
///
/// `id` is server-assigned and used as the row key when rendering. `body`
/// and `user_id` fall back to their defaults when the server omits them, so
/// a minimal `{ "id": 1, "title": "..." }` object still decodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub user_id: u64,
}

impl Post {
    pub fn new(id: u64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            body: String::new(),
            user_id: 0,
        }
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    #[must_use]
    pub fn with_user_id(mut self, user_id: u64) -> Self {
        self.user_id = user_id;
        self
    }
}

// ============================================================================
// UI options
// ============================================================================

/// UI configuration options derived from config/environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UiOptions {
    pub ascii_only: bool,
    pub high_contrast: bool,
    pub reduced_motion: bool,
}
