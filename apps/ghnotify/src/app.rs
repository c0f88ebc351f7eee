//! Application orchestrator: wires settings, transport and pollers together.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::mpsc;

use ghnotify_poller::{AccountPoller, AccountUpdate, ManualTimer, PollStatus, PollerManager};
use ghnotify_settings::{AccountConfig, Settings, SettingsStore};
use ghnotify_transport::{ReqwestTransport, Transport};

use crate::view;

/// Resolves an account by index or login.
pub fn find_account(settings: &Settings, key: &str) -> anyhow::Result<AccountConfig> {
    let by_index = key.parse::<usize>().ok().and_then(|id| settings.account(id));
    by_index
        .or_else(|| settings.accounts().into_iter().find(|a| a.login == key))
        .with_context(|| format!("no account matches {key:?}"))
}

fn build_transport(settings: &Settings) -> anyhow::Result<Arc<dyn Transport>> {
    let timeout = Duration::from_secs(settings.request_timeout_secs);
    let transport = ReqwestTransport::new(timeout).context("failed to build HTTP client")?;
    Ok(Arc::new(transport))
}

/// Polls every account until Ctrl-C.
pub async fn run(path: PathBuf, settings: Settings) -> anyhow::Result<()> {
    let transport = build_transport(&settings)?;
    let store = Arc::new(SettingsStore::new(settings));
    let manager = PollerManager::new(Arc::clone(&store), transport);

    let mut updates = manager
        .take_updates()
        .await
        .context("update stream already taken")?;

    let render_store = Arc::clone(&store);
    let renderer = tokio::spawn(async move {
        while let Some(update) = updates.recv().await {
            view::render(&update, &render_store.snapshot());
        }
    });

    manager.start_all().await;
    tracing::info!("polling, press Ctrl-C to quit");

    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            res.context("failed to listen for Ctrl-C")?;
            tracing::info!("SIGINT received, shutting down");
        }
        _ = reload_on_hangup(&path, &store) => {}
    }

    manager.shutdown().await;
    renderer.abort();
    Ok(())
}

/// Re-reads the settings file and publishes it. A missing or bad file keeps
/// the current settings.
fn reload_settings(path: &Path, store: &SettingsStore) {
    match Settings::read_from(path) {
        Ok(settings) => store.replace(settings),
        Err(e) => tracing::warn!(path = %path.display(), "settings reload failed: {e}"),
    }
}

#[cfg(unix)]
async fn reload_on_hangup(path: &Path, store: &SettingsStore) {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::hangup()) {
        Ok(mut hup) => {
            while hup.recv().await.is_some() {
                tracing::info!("SIGHUP received, reloading settings");
                reload_settings(path, store);
            }
        }
        Err(e) => tracing::warn!("cannot listen for SIGHUP: {e}"),
    }
    std::future::pending::<()>().await;
}

#[cfg(not(unix))]
async fn reload_on_hangup(_path: &Path, _store: &SettingsStore) {
    std::future::pending::<()>().await;
}

/// Fetches once per account and prints a summary line for each.
pub async fn check(settings: Settings) -> anyhow::Result<()> {
    let transport = build_transport(&settings)?;
    let store = Arc::new(SettingsStore::new(settings));
    let updates = fetch_once(&store, transport).await;

    let snapshot = store.snapshot();
    for update in &updates {
        let login = snapshot
            .accounts
            .get(update.account_id)
            .map(|a| a.login.as_str())
            .unwrap_or("?");
        match update.status {
            PollStatus::Normal => println!("{login}: {} unread", update.count),
            PollStatus::Warning => println!("{login}: unavailable"),
        }
    }

    let failed = updates
        .iter()
        .filter(|u| u.status == PollStatus::Warning)
        .count();
    if failed > 0 {
        anyhow::bail!("{failed} account(s) could not be checked");
    }
    Ok(())
}

/// Runs one fetch per account without arming any timer.
async fn fetch_once(
    store: &Arc<SettingsStore>,
    transport: Arc<dyn Transport>,
) -> Vec<AccountUpdate> {
    let num_accounts = store.snapshot().num_accounts();
    let mut results = Vec::with_capacity(num_accounts);

    for account_id in 0..num_accounts {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut poller = AccountPoller::new(
            account_id,
            store.clone(),
            Arc::clone(&transport),
            Arc::new(tx),
            Box::new(ManualTimer::new()),
        );
        poller.start().await;
        poller.stop();

        // The last update reflects the fetch outcome.
        let mut last = None;
        while let Ok(update) = rx.try_recv() {
            last = Some(update);
        }
        results.extend(last);
    }
    results
}
