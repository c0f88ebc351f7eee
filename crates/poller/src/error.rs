//! Fetch failure taxonomy.
//!
//! None of these escape a poller: every one is logged, turns the account's
//! status to `Warning`, and is retried with backoff.

use ghnotify_transport::TransportError;

/// Longest slice of an error body kept for logging.
const MAX_BODY_LOG: usize = 200;

/// Why a fetch did not produce a fresh notification list.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("login or token missing")]
    ConfigurationIncomplete,

    #[error("unauthorized, check login and token")]
    AuthenticationFailed,

    #[error("remote error {status}: {message}")]
    RemoteError { status: u16, message: String },

    #[error("transport failure: {0}")]
    TransportFailure(String),
}

impl From<TransportError> for FetchError {
    fn from(e: TransportError) -> Self {
        Self::TransportFailure(e.to_string())
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        Self::TransportFailure(format!("invalid notification list: {e}"))
    }
}

impl FetchError {
    /// Builds a [`FetchError::RemoteError`] from a status and raw body.
    pub fn remote(status: u16, body: &[u8]) -> Self {
        let text = String::from_utf8_lossy(body);
        let text = text.trim();
        let message = if text.is_empty() {
            "empty body".to_string()
        } else {
            text.chars().take(MAX_BODY_LOG).collect()
        };
        Self::RemoteError { status, message }
    }
}
