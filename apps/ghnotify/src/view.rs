//! Text rendering of account updates.

use ghnotify_poller::{AccountUpdate, PollStatus};
use ghnotify_settings::Settings;

/// Display switches taken from the settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct ViewOptions {
    pub hide_widget: bool,
    pub hide_notification_count: bool,
}

impl ViewOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            hide_widget: settings.hide_widget,
            hide_notification_count: settings.hide_notification_count,
        }
    }
}

/// Indicator label, or `None` when the indicator is hidden.
///
/// A warning is always shown.
pub fn label(update: &AccountUpdate, opts: ViewOptions) -> Option<String> {
    if update.status == PollStatus::Warning {
        return Some("!".into());
    }
    if update.count == 0 && opts.hide_widget {
        return None;
    }
    if opts.hide_notification_count {
        Some(String::new())
    } else {
        Some(update.count.to_string())
    }
}

pub fn alert_text(count: usize) -> String {
    if count == 1 {
        "You have 1 new notification".into()
    } else {
        format!("You have {count} new notifications")
    }
}

/// Logs one update.
pub fn render(update: &AccountUpdate, settings: &Settings) {
    let login = settings
        .accounts
        .get(update.account_id)
        .map(|a| a.login.as_str())
        .unwrap_or("?");

    match label(update, ViewOptions::from_settings(settings)) {
        Some(label) => tracing::info!(
            account = update.account_id,
            login,
            status = ?update.status,
            label = %label,
            "notifications"
        ),
        None => tracing::debug!(account = update.account_id, login, "indicator hidden"),
    }

    if let Some(count) = update.alert {
        tracing::info!(account = update.account_id, login, "{}", alert_text(count));
    }
}
