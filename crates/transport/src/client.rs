//! `reqwest`-backed transport with Basic authentication.

use std::time::Duration;

use reqwest::header::{HeaderMap, IF_MODIFIED_SINCE, LAST_MODIFIED};

use crate::types::{HttpResponse, NotificationRequest, Transport, TransportError, TransportFuture};

const USER_AGENT: &str = concat!("ghnotify/", env!("CARGO_PKG_VERSION"));

const X_POLL_INTERVAL: &str = "x-poll-interval";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP transport over a shared `reqwest` connection pool.
#[derive(Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { http })
    }

    async fn send(&self, request: &NotificationRequest) -> Result<HttpResponse, TransportError> {
        let creds = &request.credentials;
        if creds.login.contains(':') {
            return Err(TransportError::InvalidCredentials);
        }

        let mut builder = self
            .http
            .get(&request.url)
            .basic_auth(&creds.login, Some(&creds.token));
        if let Some(since) = &request.if_modified_since {
            builder = builder.header(IF_MODIFIED_SINCE, since);
        }

        let resp = builder.send().await.map_err(map_err)?;
        let status = resp.status().as_u16();
        let last_modified = header_string(resp.headers(), LAST_MODIFIED.as_str());
        let poll_interval = header_string(resp.headers(), X_POLL_INTERVAL);
        let body = resp.bytes().await.map_err(map_err)?.to_vec();

        tracing::trace!(
            url = %request.url,
            status,
            bytes = body.len(),
            "notifications response"
        );

        Ok(HttpResponse {
            status,
            last_modified,
            poll_interval,
            body,
        })
    }
}

impl Transport for ReqwestTransport {
    fn get<'a>(&'a self, request: &'a NotificationRequest) -> TransportFuture<'a> {
        Box::pin(self.send(request))
    }
}

fn map_err(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Http(e)
    }
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .filter(|v| !v.is_empty())
}
