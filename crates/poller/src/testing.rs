//! Test fakes shared by the unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use serde_json::Value;

use ghnotify_settings::{AccountConfig, AccountSource, ReasonFilter};
use ghnotify_transport::{HttpResponse, NotificationRequest, Transport, TransportError, TransportFuture};

/// Transport that replays queued results and records every request.
///
/// An empty queue answers with a timeout.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    script: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    requests: Mutex<Vec<NotificationRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&self, result: Result<HttpResponse, TransportError>) {
        self.script.lock().unwrap().push_back(result);
    }

    pub(crate) fn requests(&self) -> Vec<NotificationRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl Transport for ScriptedTransport {
    fn get<'a>(&'a self, request: &'a NotificationRequest) -> TransportFuture<'a> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.script.lock().unwrap().pop_front();
        Box::pin(async move { next.unwrap_or(Err(TransportError::Timeout)) })
    }
}

/// Account source with a replaceable list.
pub(crate) struct StaticSource {
    accounts: Mutex<Vec<AccountConfig>>,
}

impl StaticSource {
    pub(crate) fn new(accounts: Vec<AccountConfig>) -> Self {
        Self {
            accounts: Mutex::new(accounts),
        }
    }

    pub(crate) fn set(&self, accounts: Vec<AccountConfig>) {
        *self.accounts.lock().unwrap() = accounts;
    }
}

impl AccountSource for StaticSource {
    fn account(&self, account_id: usize) -> Option<AccountConfig> {
        self.accounts
            .lock()
            .unwrap()
            .get(account_id)
            .cloned()
            .map(|mut a| {
                a.account_id = account_id;
                a
            })
    }
}

pub(crate) fn account(refresh_interval: u64, show_alert: bool) -> AccountConfig {
    AccountConfig {
        account_id: 0,
        domain: "github.com".into(),
        login: "octocat".into(),
        token: "t0k3n".into(),
        command: None,
        color: "#2188ff".into(),
        filter: ReasonFilter::None,
        refresh_interval,
        show_alert,
        conditional_requests: false,
    }
}

pub(crate) fn response(status: u16, body: &str) -> Result<HttpResponse, TransportError> {
    Ok(HttpResponse {
        status,
        body: body.as_bytes().to_vec(),
        ..HttpResponse::default()
    })
}

pub(crate) fn ok_json(body: Value) -> Result<HttpResponse, TransportError> {
    response(200, &body.to_string())
}
