use thiserror::Error;

/// Every way a single fetch can fail.
///
/// The `Display` strings of `Http`, `TimeoutOrCancelled` and `Unknown` are
/// user-facing and stable; the UI shows them verbatim.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Response arrived with a status outside 200-299.
    #[error("HTTP error! status: {status}")]
    Http { status: u16 },

    /// The deadline fired or the caller's abort handle was triggered.
    #[error("Request timeout or cancelled")]
    TimeoutOrCancelled,

    /// Connection, TLS or body-read failure before a usable response.
    #[error(transparent)]
    Transport(reqwest::Error),

    /// Body was not valid JSON for the requested type.
    #[error(transparent)]
    Decode(serde_json::Error),

    #[error("invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// The fetch ended without producing an error value (task panicked or
    /// was dropped before reporting).
    #[error("An unknown error occurred")]
    Unknown,
}

impl FetchError {
    /// HTTP status for `Http` errors.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Http { status } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_cancellation(&self) -> bool {
        matches!(self, FetchError::TimeoutOrCancelled)
    }

    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        // A connect timeout inside the transport is still a timeout to callers.
        if err.is_timeout() {
            FetchError::TimeoutOrCancelled
        } else {
            FetchError::Transport(err)
        }
    }
}
