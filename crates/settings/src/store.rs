//! Shared settings snapshot with change broadcast.

use std::sync::Arc;

use tokio::sync::watch;

use crate::types::{AccountConfig, Settings};

/// Read access to per-account configuration.
///
/// Pollers only ever read through this trait; they never hold the document.
pub trait AccountSource: Send + Sync {
    /// Returns the current snapshot for `account_id`, if configured.
    fn account(&self, account_id: usize) -> Option<AccountConfig>;
}

/// Holds the current [`Settings`] and notifies subscribers when it is
/// replaced.
pub struct SettingsStore {
    tx: watch::Sender<Arc<Settings>>,
}

impl SettingsStore {
    /// Creates a store holding `settings`.
    pub fn new(settings: Settings) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(settings));
        Self { tx }
    }

    /// Returns the current settings document.
    pub fn snapshot(&self) -> Arc<Settings> {
        self.tx.borrow().clone()
    }

    /// Replaces the settings document and wakes all subscribers.
    pub fn replace(&self, settings: Settings) {
        tracing::info!(accounts = settings.num_accounts(), "settings changed");
        self.tx.send_replace(Arc::new(settings));
    }

    /// Subscribes to settings changes.
    ///
    /// The returned receiver sees the current value as already seen; only
    /// later calls to [`replace`](Self::replace) wake it.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Settings>> {
        self.tx.subscribe()
    }
}

impl AccountSource for SettingsStore {
    fn account(&self, account_id: usize) -> Option<AccountConfig> {
        self.tx.borrow().account(account_id)
    }
}
