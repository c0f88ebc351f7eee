//! Where pollers deliver their state changes.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::warn;

use crate::types::AccountUpdate;

/// Receives [`AccountUpdate`]s for rendering and alerting.
///
/// Called from inside a poller; implementations must neither block nor
/// drop updates.
pub trait EventSink: Send + Sync + 'static {
    fn emit(&self, update: AccountUpdate);
}

impl EventSink for mpsc::UnboundedSender<AccountUpdate> {
    fn emit(&self, update: AccountUpdate) {
        let account_id = update.account_id;
        if self.send(update).is_err() {
            warn!(account = account_id, "account update receiver dropped");
        }
    }
}

impl<S: EventSink + ?Sized> EventSink for Arc<S> {
    fn emit(&self, update: AccountUpdate) {
        (**self).emit(update);
    }
}
