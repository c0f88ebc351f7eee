//! Settings for the notification pollers.
//!
//! Provides the TOML settings document, the immutable per-account
//! [`AccountConfig`] snapshot the pollers read, and a [`SettingsStore`]
//! that broadcasts replacements to subscribers.

pub mod file;
pub mod store;
pub mod types;

pub use file::{SettingsError, default_path};
pub use store::{AccountSource, SettingsStore};
pub use types::{AccountConfig, AccountEntry, ReasonFilter, Settings};
