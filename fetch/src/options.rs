use std::time::Duration;

use futures_util::future::AbortRegistration;

/// Default request deadline when the caller does not pick one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Per-call options for [`fetch_data`](crate::fetch_data).
///
/// `signal` is the registration half of a
/// [`futures_util::future::AbortHandle::new_pair`]; the caller keeps the
/// handle and may abort the request at any time. When a signal is supplied it
/// is the only thing that cancels the request: `timeout` is not armed.
#[derive(Debug)]
pub struct FetchOptions {
    pub timeout: Duration,
    pub signal: Option<AbortRegistration>,
}

impl FetchOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_timeout_ms(self, millis: u64) -> Self {
        self.with_timeout(Duration::from_millis(millis))
    }

    pub fn with_signal(mut self, signal: AbortRegistration) -> Self {
        self.signal = Some(signal);
        self
    }
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            signal: None,
        }
    }
}
