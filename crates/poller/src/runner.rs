//! Poller task: one tokio task per account, fed through a command channel.
//!
//! Commands are handled one at a time, so a fetch never starts while the
//! previous one for the same account is still outstanding, and only this
//! task ever touches the account's [`PollState`](crate::poller::PollState).

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use ghnotify_settings::AccountSource;
use ghnotify_transport::Transport;

use crate::events::EventSink;
use crate::poller::AccountPoller;
use crate::timer::TokioTimer;
use crate::types::PollerCommand;

const COMMAND_BUFFER: usize = 16;

/// Handle to a running poller task.
pub struct PollerHandle {
    account_id: usize,
    tx: mpsc::Sender<PollerCommand>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Spawns a poller task for `account_id`. The poller stays idle until
    /// [`start`](Self::start).
    pub fn spawn(
        account_id: usize,
        source: Arc<dyn AccountSource>,
        transport: Arc<dyn Transport>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let timer = TokioTimer::new(&tx);
        let poller = AccountPoller::new(account_id, source, transport, sink, Box::new(timer));
        let task = tokio::spawn(run(poller, rx));
        Self {
            account_id,
            tx,
            task,
        }
    }

    pub fn account_id(&self) -> usize {
        self.account_id
    }

    pub async fn start(&self) {
        self.send(PollerCommand::Start).await;
    }

    pub async fn stop(&self) {
        self.send(PollerCommand::Stop).await;
    }

    pub async fn settings_changed(&self) {
        self.send(PollerCommand::SettingsChanged).await;
    }

    /// Stops the poller and waits for its task to exit.
    pub async fn shutdown(self) {
        self.send(PollerCommand::Shutdown).await;
        if let Err(e) = self.task.await {
            warn!(account = self.account_id, "poller task failed: {e}");
        }
    }

    async fn send(&self, cmd: PollerCommand) {
        if self.tx.send(cmd).await.is_err() {
            warn!(account = self.account_id, "poller task is gone");
        }
    }
}

/// Command loop of one poller.
async fn run(mut poller: AccountPoller, mut rx: mpsc::Receiver<PollerCommand>) {
    let account_id = poller.account_id();
    debug!(account = account_id, "poller task started");

    while let Some(cmd) = rx.recv().await {
        match cmd {
            PollerCommand::Start => poller.start().await,
            PollerCommand::Stop => poller.stop(),
            PollerCommand::SettingsChanged => poller.on_settings_changed(),
            PollerCommand::TimerFired { generation } => poller.on_timer_fired(generation).await,
            PollerCommand::Shutdown => break,
        }
    }

    poller.stop();
    debug!(account = account_id, "poller task exited");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::testing::{ScriptedTransport, StaticSource, account, ok_json, response};
    use crate::types::{AccountUpdate, PollStatus};
    use serde_json::json;

    fn spawn_with(
        transport: &Arc<ScriptedTransport>,
        source: &Arc<StaticSource>,
    ) -> (PollerHandle, mpsc::UnboundedReceiver<AccountUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = PollerHandle::spawn(0, source.clone(), transport.clone(), Arc::new(tx));
        (handle, rx)
    }

    #[tokio::test(start_paused = true)]
    async fn polls_on_refresh_interval() {
        let transport = Arc::new(ScriptedTransport::new());
        let source = Arc::new(StaticSource::new(vec![account(60, true)]));
        for _ in 0..3 {
            transport.push(ok_json(json!([])));
        }
        let (handle, mut updates) = spawn_with(&transport, &source);

        handle.start().await;
        let first = updates.recv().await.unwrap();
        assert_eq!(first.status, PollStatus::Normal);
        assert_eq!(transport.request_count(), 1);

        tokio::time::sleep(Duration::from_secs(59)).await;
        assert_eq!(transport.request_count(), 1);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(transport.request_count(), 2);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(transport.request_count(), 3);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn failure_waits_backoff_floor() {
        let transport = Arc::new(ScriptedTransport::new());
        let source = Arc::new(StaticSource::new(vec![account(60, true)]));
        transport.push(response(401, ""));
        transport.push(ok_json(json!([])));
        let (handle, mut updates) = spawn_with(&transport, &source);

        handle.start().await;
        assert_eq!(updates.recv().await.unwrap().status, PollStatus::Warning);

        tokio::time::sleep(Duration::from_secs(599)).await;
        assert_eq!(transport.request_count(), 1);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(transport.request_count(), 2);
        assert_eq!(updates.recv().await.unwrap().status, PollStatus::Normal);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn settings_change_refetches_after_five_seconds() {
        let transport = Arc::new(ScriptedTransport::new());
        let source = Arc::new(StaticSource::new(vec![account(60, true)]));
        transport.push(response(500, ""));
        transport.push(ok_json(json!([{"id": "1"}])));
        let (handle, mut updates) = spawn_with(&transport, &source);

        handle.start().await;
        updates.recv().await.unwrap();

        handle.settings_changed().await;
        let reset = updates.recv().await.unwrap();
        assert_eq!(reset.status, PollStatus::Normal);

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(transport.request_count(), 1);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(transport.request_count(), 2);
        assert_eq!(updates.recv().await.unwrap().count, 1);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop_halts_polling() {
        let transport = Arc::new(ScriptedTransport::new());
        let source = Arc::new(StaticSource::new(vec![account(60, true)]));
        transport.push(ok_json(json!([])));
        let (handle, mut updates) = spawn_with(&transport, &source);

        handle.start().await;
        updates.recv().await.unwrap();
        handle.stop().await;

        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert_eq!(transport.request_count(), 1);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn misconfigured_account_is_not_retried() {
        let transport = Arc::new(ScriptedTransport::new());
        let mut config = account(60, true);
        config.token.clear();
        let source = Arc::new(StaticSource::new(vec![config]));
        let (handle, mut updates) = spawn_with(&transport, &source);

        handle.start().await;
        assert_eq!(updates.recv().await.unwrap().status, PollStatus::Warning);

        tokio::time::sleep(Duration::from_secs(7200)).await;
        assert_eq!(transport.request_count(), 0);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn dropping_handle_ends_task() {
        let transport = Arc::new(ScriptedTransport::new());
        let source = Arc::new(StaticSource::new(vec![account(60, true)]));
        let (handle, _updates) = spawn_with(&transport, &source);

        let PollerHandle { tx, task, .. } = handle;
        drop(tx);
        task.await.unwrap();
    }
}
