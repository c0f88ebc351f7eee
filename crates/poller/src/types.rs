//! Public types for the account pollers.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

/// Delay before the first fetch after a settings change.
pub const SETTINGS_CHANGED_DELAY: Duration = Duration::from_secs(5);

/// Lower bound of the poll interval once any failure has occurred, in seconds.
pub const BACKOFF_FLOOR_SECS: u64 = 600;

/// Refresh interval used when an account has no configuration, in seconds.
pub(crate) const FALLBACK_REFRESH_SECS: u64 = 60;

/// Indicator status of an account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PollStatus {
    /// Last fetch succeeded.
    #[default]
    Normal,
    /// Misconfigured, unauthorized, or the last fetch failed.
    Warning,
}

/// State change emitted to the view layer.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountUpdate {
    pub account_id: usize,
    pub status: PollStatus,
    pub count: usize,
    pub notifications: Arc<[Value]>,
    /// Set when the unread count grew and alerts are enabled. Carries the new
    /// total count, not the increase.
    pub alert: Option<usize>,
}

/// Messages processed by a poller task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollerCommand {
    Start,
    Stop,
    SettingsChanged,
    /// Posted by the poller's own timer.
    TimerFired { generation: u64 },
    Shutdown,
}
