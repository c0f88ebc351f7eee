//! Opening an account's notifications page.

use std::io;
use std::process::Command;

use ghnotify_settings::AccountConfig;
use ghnotify_transport::browser_url;

/// Splits a configured command line and appends the URL.
fn command_argv(command: &str, url: &str) -> Option<Vec<String>> {
    let mut argv: Vec<String> = command.split_whitespace().map(str::to_string).collect();
    if argv.is_empty() {
        return None;
    }
    argv.push(url.to_string());
    Some(argv)
}

/// Opens the notifications page with the account's command, or the system
/// handler when none is set.
pub fn open_notifications(account: &AccountConfig) -> io::Result<()> {
    let url = browser_url(&account.domain, account.filter);
    tracing::info!(account = account.account_id, %url, "opening notifications page");

    match account.command.as_deref().and_then(|c| command_argv(c, &url)) {
        Some(argv) => {
            Command::new(&argv[0]).args(&argv[1..]).spawn()?;
            Ok(())
        }
        None => open::that(&url),
    }
}
