//! Request and response types shared by all transports.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use ghnotify_settings::{AccountConfig, ReasonFilter};

/// Characters escaped inside the `query` parameter value.
const QUERY_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'&')
    .add(b'+')
    .add(b':')
    .add(b'=')
    .add(b'?');

/// Errors that keep a response from arriving at all.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request timed out")]
    Timeout,

    #[error("invalid credentials for basic auth")]
    InvalidCredentials,
}

/// Basic-auth credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub login: String,
    pub token: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("token", &"***")
            .finish()
    }
}

/// A single authenticated GET against the notifications endpoint.
#[derive(Debug, Clone)]
pub struct NotificationRequest {
    pub url: String,
    pub credentials: Credentials,
    /// Sent as `If-Modified-Since` when set.
    pub if_modified_since: Option<String>,
}

/// What came back from the server, whatever the status.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    /// Raw `Last-Modified` header.
    pub last_modified: Option<String>,
    /// Raw `X-Poll-Interval` header.
    pub poll_interval: Option<String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Returns `X-Poll-Interval` in seconds, if present and numeric.
    pub fn poll_interval_secs(&self) -> Option<u64> {
        let raw = self.poll_interval.as_deref()?;
        match raw.trim().parse::<u64>() {
            Ok(secs) => Some(secs),
            Err(_) => {
                tracing::debug!(value = raw, "ignoring non-numeric X-Poll-Interval");
                None
            }
        }
    }
}

/// A boxed future returned by [`Transport::get`].
pub type TransportFuture<'a> =
    Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + Send + 'a>>;

/// Issues authenticated GET requests.
///
/// Non-2xx statuses are not errors at this level; only failures that keep a
/// response from arriving are.
pub trait Transport: Send + Sync + 'static {
    fn get<'a>(&'a self, request: &'a NotificationRequest) -> TransportFuture<'a>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn get<'a>(&'a self, request: &'a NotificationRequest) -> TransportFuture<'a> {
        (**self).get(request)
    }
}

/// API endpoint polled for an account.
///
/// `https://api.<domain>/notifications`, with `?query=reason%3A<filter>`
/// appended unless the filter is `none`.
pub fn notifications_url(domain: &str, filter: ReasonFilter) -> String {
    with_filter(format!("https://api.{domain}/notifications"), filter)
}

/// Web page that lists the same notifications in a browser.
pub fn browser_url(domain: &str, filter: ReasonFilter) -> String {
    with_filter(format!("https://{domain}/notifications"), filter)
}

fn with_filter(url: String, filter: ReasonFilter) -> String {
    if !filter.is_active() {
        return url;
    }
    let value = format!("reason:{}", filter.as_str());
    format!("{url}?query={}", utf8_percent_encode(&value, QUERY_VALUE))
}

impl NotificationRequest {
    /// Builds the request for an account, or `None` if it lacks credentials.
    pub fn for_account(account: &AccountConfig) -> Option<Self> {
        if !account.has_credentials() {
            return None;
        }
        Some(Self {
            url: notifications_url(account.domain.trim(), account.filter),
            credentials: Credentials {
                login: account.login.trim().to_string(),
                token: account.token.trim().to_string(),
            },
            if_modified_since: None,
        })
    }
}
