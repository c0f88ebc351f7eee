//! Per-account notification polling.
//!
//! Each account gets an [`AccountPoller`] that fetches its notifications,
//! backs off on failure, honours the server's poll-interval hint, and
//! reports [`AccountUpdate`]s through an [`EventSink`]. The
//! [`PollerManager`] runs one poller task per configured account and keeps
//! the set in step with the settings.

pub mod error;
pub mod events;
pub mod interval;
pub mod manager;
pub mod poller;
pub mod runner;
pub mod store;
pub mod timer;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use error::FetchError;
pub use events::EventSink;
pub use interval::{next_interval, next_interval_secs};
pub use manager::PollerManager;
pub use poller::{AccountPoller, PollState};
pub use runner::PollerHandle;
pub use store::NotificationStore;
pub use timer::{ManualTimer, Scheduler, TokioTimer};
pub use types::{
    AccountUpdate, BACKOFF_FLOOR_SECS, PollStatus, PollerCommand, SETTINGS_CHANGED_DELAY,
};
