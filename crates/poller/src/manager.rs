//! Poller manager: one poller per configured account.
//!
//! Spawns pollers from the settings snapshot, forwards settings changes to
//! every poller, grows or shrinks the poller set when accounts are added or
//! removed, and exposes the merged stream of [`AccountUpdate`]s.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use ghnotify_settings::{AccountSource, Settings, SettingsStore};
use ghnotify_transport::Transport;

use crate::events::EventSink;
use crate::runner::PollerHandle;
use crate::types::AccountUpdate;

/// Shared pieces needed to spawn a poller.
#[derive(Clone)]
struct Spawner {
    settings: Arc<SettingsStore>,
    transport: Arc<dyn Transport>,
    sink: Arc<dyn EventSink>,
}

impl Spawner {
    fn spawn(&self, account_id: usize) -> PollerHandle {
        let source: Arc<dyn AccountSource> = self.settings.clone();
        PollerHandle::spawn(
            account_id,
            source,
            Arc::clone(&self.transport),
            Arc::clone(&self.sink),
        )
    }
}

/// Owns every account poller.
pub struct PollerManager {
    spawner: Spawner,
    pollers: Arc<Mutex<Vec<PollerHandle>>>,
    updates_rx: Mutex<Option<mpsc::UnboundedReceiver<AccountUpdate>>>,
    watch_cancel: std::sync::Mutex<Option<CancellationToken>>,
}

impl PollerManager {
    /// Creates a manager. No pollers run until [`start_all`](Self::start_all).
    pub fn new(settings: Arc<SettingsStore>, transport: Arc<dyn Transport>) -> Self {
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();
        Self {
            spawner: Spawner {
                settings,
                transport,
                sink: Arc::new(updates_tx),
            },
            pollers: Arc::new(Mutex::new(Vec::new())),
            updates_rx: Mutex::new(Some(updates_rx)),
            watch_cancel: std::sync::Mutex::new(None),
        }
    }

    /// Takes the update receiver. Can only be called once.
    pub async fn take_updates(&self) -> Option<mpsc::UnboundedReceiver<AccountUpdate>> {
        self.updates_rx.lock().await.take()
    }

    /// Number of running pollers.
    pub async fn len(&self) -> usize {
        self.pollers.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.pollers.lock().await.is_empty()
    }

    /// Brings the poller set in line with the current settings, starts every
    /// poller, and begins listening for settings changes.
    ///
    /// Settings replaced while stopped are applied here: pollers of removed
    /// accounts shut down and the others reload before fetching.
    pub async fn start_all(&self) {
        // Subscribed first so a replace racing with this start is still seen.
        let rx = self.spawner.settings.subscribe();
        let num_accounts = rx.borrow().num_accounts();
        {
            let mut pollers = self.pollers.lock().await;
            reconcile(&self.spawner, &mut pollers, num_accounts).await;
            for poller in pollers.iter() {
                poller.start().await;
            }
        }
        info!(accounts = num_accounts, "pollers started");
        self.watch_settings(rx);
    }

    /// Stops every poller and the settings watcher. They can be started again.
    pub async fn stop_all(&self) {
        self.cancel_watch();
        for poller in self.pollers.lock().await.iter() {
            poller.stop().await;
        }
        info!("pollers stopped");
    }

    /// Stops every poller and waits for their tasks to exit.
    pub async fn shutdown(&self) {
        self.cancel_watch();
        let pollers: Vec<PollerHandle> = self.pollers.lock().await.drain(..).collect();
        for poller in pollers {
            poller.shutdown().await;
        }
        debug!("poller manager shut down");
    }

    fn watch_settings(&self, mut rx: watch::Receiver<Arc<Settings>>) {
        let cancel = CancellationToken::new();
        if let Ok(mut guard) = self.watch_cancel.lock()
            && let Some(old) = guard.replace(cancel.clone())
        {
            old.cancel();
        }

        let spawner = self.spawner.clone();
        let pollers = Arc::clone(&self.pollers);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
                let num_accounts = rx.borrow_and_update().num_accounts();
                apply_settings_change(&spawner, &pollers, num_accounts).await;
            }
            debug!("settings watcher exited");
        });
    }

    fn cancel_watch(&self) {
        if let Ok(mut guard) = self.watch_cancel.lock()
            && let Some(cancel) = guard.take()
        {
            cancel.cancel();
        }
    }
}

/// Applies a settings change while running. New accounts start at once.
async fn apply_settings_change(
    spawner: &Spawner,
    pollers: &Mutex<Vec<PollerHandle>>,
    num_accounts: usize,
) {
    let mut pollers = pollers.lock().await;
    let first_new = reconcile(spawner, &mut pollers, num_accounts).await;
    for poller in &pollers[first_new..] {
        poller.start().await;
    }
}

/// Shuts down pollers beyond `num_accounts`, tells the rest to reload, and
/// spawns idle pollers for new accounts. Returns the index of the first
/// spawned poller.
async fn reconcile(
    spawner: &Spawner,
    pollers: &mut Vec<PollerHandle>,
    num_accounts: usize,
) -> usize {
    while pollers.len() > num_accounts {
        if let Some(removed) = pollers.pop() {
            info!(account = removed.account_id(), "account removed");
            removed.shutdown().await;
        }
    }

    for poller in pollers.iter() {
        poller.settings_changed().await;
    }

    let first_new = pollers.len();
    while pollers.len() < num_accounts {
        let id = pollers.len();
        info!(account = id, "account added");
        pollers.push(spawner.spawn(id));
    }
    first_new
}
