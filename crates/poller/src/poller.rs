//! Per-account polling state machine.
//!
//! An [`AccountPoller`] builds the notifications request from its account
//! snapshot, interprets the response, keeps the retry counter and server
//! hints, detects growth of the unread count, and re-arms its own timer.
//! Every completed fetch ends with exactly one reschedule, so polling only
//! stops through [`AccountPoller::stop`] or while the account lacks
//! credentials.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use ghnotify_settings::{AccountConfig, AccountSource};
use ghnotify_transport::{HttpResponse, NotificationRequest, Transport, TransportError};

use crate::error::FetchError;
use crate::events::EventSink;
use crate::interval::next_interval;
use crate::store::NotificationStore;
use crate::timer::Scheduler;
use crate::types::{AccountUpdate, FALLBACK_REFRESH_SECS, PollStatus, SETTINGS_CHANGED_DELAY};

/// Mutable polling state of one account.
#[derive(Debug, Default)]
pub struct PollState {
    pub status: PollStatus,
    /// Consecutive failed fetches; reset by any success.
    pub retry_attempts: u32,
    /// Last `Last-Modified` seen from the server.
    pub last_modified: Option<String>,
    /// Last `X-Poll-Interval` seen from the server, in seconds.
    pub server_poll_interval: Option<u64>,
    pub notifications: NotificationStore,
}

/// Polls the notifications endpoint for one account.
///
/// Only the owning task touches a poller, so none of its methods lock.
pub struct AccountPoller {
    account_id: usize,
    source: Arc<dyn AccountSource>,
    transport: Arc<dyn Transport>,
    sink: Arc<dyn EventSink>,
    timer: Box<dyn Scheduler>,
    config: Option<AccountConfig>,
    /// Request template; `None` while credentials are missing.
    session: Option<NotificationRequest>,
    initialized: bool,
    stopped: bool,
    state: PollState,
}

impl AccountPoller {
    /// Creates a poller. Nothing is read or fetched until [`start`](Self::start).
    pub fn new(
        account_id: usize,
        source: Arc<dyn AccountSource>,
        transport: Arc<dyn Transport>,
        sink: Arc<dyn EventSink>,
        timer: Box<dyn Scheduler>,
    ) -> Self {
        Self {
            account_id,
            source,
            transport,
            sink,
            timer,
            config: None,
            session: None,
            initialized: false,
            stopped: true,
            state: PollState::default(),
        }
    }

    pub fn account_id(&self) -> usize {
        self.account_id
    }

    pub fn state(&self) -> &PollState {
        &self.state
    }

    pub fn status(&self) -> PollStatus {
        self.state.status
    }

    pub fn config(&self) -> Option<&AccountConfig> {
        self.config.as_ref()
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Returns `true` while a timer is armed.
    pub fn is_scheduled(&self) -> bool {
        self.timer.is_pending()
    }

    /// Loads configuration on first use, then fetches immediately.
    pub async fn start(&mut self) {
        if !self.initialized {
            self.lazy_init();
        }
        self.stopped = false;
        self.fetch().await;
    }

    /// Cancels the pending timer. The session is kept for a later start.
    pub fn stop(&mut self) {
        self.timer.cancel();
        if !self.stopped {
            debug!(account = self.account_id, "poller stopped");
        }
        self.stopped = true;
    }

    /// Reloads configuration and schedules a fresh fetch in
    /// [`SETTINGS_CHANGED_DELAY`], discarding any backoff in progress.
    pub fn on_settings_changed(&mut self) {
        if !self.initialized {
            return;
        }
        self.reload_settings();
        self.state.status = PollStatus::Normal;
        self.init_session();
        self.state.retry_attempts = 0;
        self.timer.cancel();
        self.schedule(SETTINGS_CHANGED_DELAY);
        self.emit(None);
    }

    /// Handles a timer fire posted by this poller's own scheduler.
    pub async fn on_timer_fired(&mut self, generation: u64) {
        if !self.timer.claim(generation) {
            debug!(account = self.account_id, generation, "ignoring stale timer");
            return;
        }
        if self.stopped {
            return;
        }
        self.fetch().await;
    }

    /// Issues one request and processes the outcome.
    ///
    /// Without credentials this only reports `Warning` and schedules
    /// nothing: a misconfigured account waits for a settings change.
    pub async fn fetch(&mut self) {
        let Some(mut request) = self.session.clone() else {
            debug!(
                account = self.account_id,
                "{}, not polling",
                FetchError::ConfigurationIncomplete
            );
            self.state.status = PollStatus::Warning;
            self.emit(None);
            return;
        };

        if self.conditional_requests() {
            request.if_modified_since = self.state.last_modified.clone();
        }

        let result = self.transport.get(&request).await;
        self.process_response(result);
    }

    /// Delay the next fetch would use with the current counters.
    pub fn interval(&self) -> Duration {
        next_interval(
            self.state.retry_attempts,
            self.refresh_interval(),
            self.state.server_poll_interval,
        )
    }

    fn lazy_init(&mut self) {
        self.initialized = true;
        self.reload_settings();
        self.state.status = PollStatus::Normal;
        self.init_session();
    }

    fn reload_settings(&mut self) {
        self.config = self.source.account(self.account_id);
        // The server hint is re-learned from the next response.
        self.state.server_poll_interval = None;
        if self.config.is_none() {
            warn!(account = self.account_id, "no configuration for account");
        }
    }

    fn init_session(&mut self) {
        self.session = self
            .config
            .as_ref()
            .and_then(NotificationRequest::for_account);
        if self.session.is_none() {
            self.state.status = PollStatus::Warning;
        }
    }

    fn process_response(&mut self, result: Result<HttpResponse, TransportError>) {
        let outcome = result
            .map_err(FetchError::from)
            .and_then(|resp| self.interpret(resp));

        let alert = match outcome {
            Ok(alert) => {
                self.state.status = PollStatus::Normal;
                self.plan_fetch(false);
                alert
            }
            Err(e) => {
                match &e {
                    FetchError::AuthenticationFailed => error!(account = self.account_id, "{e}"),
                    _ => warn!(account = self.account_id, "fetch failed: {e}"),
                }
                self.state.status = PollStatus::Warning;
                self.plan_fetch(true);
                None
            }
        };

        self.emit(alert);
    }

    /// Applies a response. `Ok` carries the alert count, if any.
    fn interpret(&mut self, resp: HttpResponse) -> Result<Option<usize>, FetchError> {
        match resp.status {
            200 => {
                let items: Vec<Value> = serde_json::from_slice(&resp.body)?;
                self.capture_headers(&resp);
                let previous = self.state.notifications.replace(items);
                Ok(self.alert_count(previous))
            }
            304 => {
                self.capture_headers(&resp);
                Ok(None)
            }
            401 => Err(FetchError::AuthenticationFailed),
            status => Err(FetchError::remote(status, &resp.body)),
        }
    }

    fn capture_headers(&mut self, resp: &HttpResponse) {
        if let Some(last_modified) = &resp.last_modified {
            self.state.last_modified = Some(last_modified.clone());
        }
        if let Some(secs) = resp.poll_interval_secs() {
            self.state.server_poll_interval = Some(secs);
        }
    }

    fn alert_count(&self, previous: usize) -> Option<usize> {
        let count = self.state.notifications.count();
        let enabled = self.config.as_ref().is_some_and(|c| c.show_alert);
        if count > 0 && count > previous && enabled {
            info!(account = self.account_id, count, "new notifications");
            Some(count)
        } else {
            None
        }
    }

    /// Updates the retry counter, then arms the timer with [`interval`](Self::interval).
    fn plan_fetch(&mut self, retry: bool) {
        if retry {
            self.state.retry_attempts = self.state.retry_attempts.saturating_add(1);
        } else {
            self.state.retry_attempts = 0;
        }
        let delay = self.interval();
        self.schedule(delay);
    }

    fn schedule(&mut self, delay: Duration) {
        if self.stopped {
            debug!(account = self.account_id, "stopped, not rescheduling");
            return;
        }
        debug!(
            account = self.account_id,
            delay_secs = delay.as_secs(),
            attempt = self.state.retry_attempts,
            "next fetch planned"
        );
        self.timer.schedule(delay);
    }

    fn emit(&self, alert: Option<usize>) {
        self.sink.emit(AccountUpdate {
            account_id: self.account_id,
            status: self.state.status,
            count: self.state.notifications.count(),
            notifications: self.state.notifications.snapshot(),
            alert,
        });
    }

    fn refresh_interval(&self) -> u64 {
        self.config
            .as_ref()
            .map_or(FALLBACK_REFRESH_SECS, |c| c.refresh_interval)
    }

    fn conditional_requests(&self) -> bool {
        self.config
            .as_ref()
            .is_some_and(|c| c.conditional_requests)
    }
}
