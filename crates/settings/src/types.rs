//! Settings document and the per-account snapshot derived from it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Minimum refresh interval accepted from the settings file, in seconds.
pub const MIN_REFRESH_INTERVAL: u64 = 1;

/// Default refresh interval, in seconds.
pub const DEFAULT_REFRESH_INTERVAL: u64 = 60;

/// Default HTTP request timeout, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT: u64 = 30;

/// Server-side notification reason filter.
///
/// The snake_case name is sent verbatim as `reason:<name>` in the query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonFilter {
    #[default]
    None,
    Assign,
    Author,
    CiActivity,
    Comment,
    Invitation,
    Manual,
    Mention,
    ReviewRequested,
    SecurityAlert,
    StateChange,
    Subscribed,
    TeamMention,
}

impl ReasonFilter {
    /// Returns the literal filter name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Assign => "assign",
            Self::Author => "author",
            Self::CiActivity => "ci_activity",
            Self::Comment => "comment",
            Self::Invitation => "invitation",
            Self::Manual => "manual",
            Self::Mention => "mention",
            Self::ReviewRequested => "review_requested",
            Self::SecurityAlert => "security_alert",
            Self::StateChange => "state_change",
            Self::Subscribed => "subscribed",
            Self::TeamMention => "team_mention",
        }
    }

    /// Returns `true` unless this is [`ReasonFilter::None`].
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for ReasonFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One account entry as stored in the settings file.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountEntry {
    #[serde(default)]
    pub login: String,

    #[serde(default = "default_domain")]
    pub domain: String,

    #[serde(default)]
    pub token: String,

    /// External command used to open the notifications page.
    #[serde(default)]
    pub command: String,

    #[serde(default)]
    pub color: String,

    /// Overrides the global filter for this account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<ReasonFilter>,
}

impl fmt::Debug for AccountEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountEntry")
            .field("login", &self.login)
            .field("domain", &self.domain)
            .field("token", &redact(&self.token))
            .field("command", &self.command)
            .field("color", &self.color)
            .field("filter", &self.filter)
            .finish()
    }
}

fn default_domain() -> String {
    "github.com".into()
}

/// The whole settings document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Baseline poll interval in seconds.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: u64,

    #[serde(default)]
    pub filter: ReasonFilter,

    /// Raise an alert when the unread count grows.
    #[serde(default = "default_true")]
    pub show_alert: bool,

    /// Hide an account's indicator while it has no notifications.
    #[serde(default)]
    pub hide_widget: bool,

    #[serde(default)]
    pub hide_notification_count: bool,

    #[serde(default)]
    pub icon_set: u32,

    /// Send `If-Modified-Since` with the last captured `Last-Modified`.
    #[serde(default)]
    pub conditional_requests: bool,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub accounts: Vec<AccountEntry>,
}

fn default_refresh_interval() -> u64 {
    DEFAULT_REFRESH_INTERVAL
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            refresh_interval: default_refresh_interval(),
            filter: ReasonFilter::None,
            show_alert: default_true(),
            hide_widget: false,
            hide_notification_count: false,
            icon_set: 0,
            conditional_requests: false,
            request_timeout_secs: default_request_timeout(),
            accounts: Vec::new(),
        }
    }
}

impl Settings {
    /// Number of configured accounts.
    pub fn num_accounts(&self) -> usize {
        self.accounts.len()
    }

    /// Resolves the snapshot for one account, merging in the global scalars.
    pub fn account(&self, account_id: usize) -> Option<AccountConfig> {
        let entry = self.accounts.get(account_id)?;
        Some(AccountConfig {
            account_id,
            domain: entry.domain.clone(),
            login: entry.login.clone(),
            token: entry.token.clone(),
            command: Some(entry.command.trim().to_string()).filter(|c| !c.is_empty()),
            color: entry.color.clone(),
            filter: entry.filter.unwrap_or(self.filter),
            refresh_interval: self.refresh_interval.max(MIN_REFRESH_INTERVAL),
            show_alert: self.show_alert,
            conditional_requests: self.conditional_requests,
        })
    }

    /// All account snapshots in id order.
    pub fn accounts(&self) -> Vec<AccountConfig> {
        (0..self.num_accounts())
            .filter_map(|id| self.account(id))
            .collect()
    }
}

/// Immutable per-account configuration snapshot.
#[derive(Clone, PartialEq)]
pub struct AccountConfig {
    pub account_id: usize,
    pub domain: String,
    pub login: String,
    pub token: String,
    pub command: Option<String>,
    /// Display hint only.
    pub color: String,
    pub filter: ReasonFilter,
    /// Baseline poll interval in seconds.
    pub refresh_interval: u64,
    pub show_alert: bool,
    pub conditional_requests: bool,
}

impl AccountConfig {
    /// Returns `true` when both login and token are set.
    pub fn has_credentials(&self) -> bool {
        !self.login.trim().is_empty() && !self.token.trim().is_empty()
    }
}

impl fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountConfig")
            .field("account_id", &self.account_id)
            .field("domain", &self.domain)
            .field("login", &self.login)
            .field("token", &redact(&self.token))
            .field("command", &self.command)
            .field("color", &self.color)
            .field("filter", &self.filter)
            .field("refresh_interval", &self.refresh_interval)
            .field("show_alert", &self.show_alert)
            .field("conditional_requests", &self.conditional_requests)
            .finish()
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() { "" } else { "***" }
}
