//! Settings file persistence.
//!
//! Settings are stored as TOML:
//! - Linux: `~/.config/ghnotify/settings.toml`
//! - Windows: `%APPDATA%/ghnotify/settings.toml`

use std::path::{Path, PathBuf};

use crate::types::Settings;

/// Errors from loading or saving settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid settings: {0}")]
    Invalid(String),
}

impl Settings {
    /// Loads settings from `path`, or writes and returns defaults if the
    /// file does not exist yet.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        if path.exists() {
            Self::read_from(path)
        } else {
            let settings = Settings::default();
            settings.save_to(path)?;
            Ok(settings)
        }
    }

    /// Reads and validates an existing settings file. A missing file is an
    /// error.
    pub fn read_from(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        settings.validate()?;
        tracing::debug!(
            path = %path.display(),
            accounts = settings.num_accounts(),
            "settings loaded"
        );
        Ok(settings)
    }

    /// Writes settings to `path`.
    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        // Tokens live in this file.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "settings saved");
        Ok(())
    }

    /// Rejects documents the pollers cannot work with.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.request_timeout_secs == 0 {
            return Err(SettingsError::Invalid(
                "request_timeout_secs must be at least 1".into(),
            ));
        }
        for (id, account) in self.accounts.iter().enumerate() {
            let domain = account.domain.trim();
            if domain.is_empty() || domain.contains('/') || domain.contains(char::is_whitespace) {
                return Err(SettingsError::Invalid(format!(
                    "account {id}: invalid domain {:?}",
                    account.domain
                )));
            }
        }
        Ok(())
    }
}

/// Returns the platform-specific settings file path.
pub fn default_path() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        PathBuf::from(home)
            .join(".config")
            .join("ghnotify")
            .join("settings.toml")
    }

    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        PathBuf::from(appdata).join("ghnotify").join("settings.toml")
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        PathBuf::from("/tmp/ghnotify/settings.toml")
    }
}
