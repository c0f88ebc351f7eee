//! ghnotify entry point.

mod app;
mod browser;
mod view;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ghnotify_settings::Settings;

#[derive(Parser)]
#[command(version, about = "Polls GitHub notifications for several accounts")]
struct Cli {
    /// Settings file. Defaults to ~/.config/ghnotify/settings.toml.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll every account until interrupted.
    Run,
    /// Fetch once per account, print the counts, and exit.
    Check,
    /// Open the notifications page of an account (index or login).
    Open { account: String },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let path = cli.config.unwrap_or_else(ghnotify_settings::default_path);
    let settings = Settings::load_from(&path)
        .with_context(|| format!("failed to load settings from {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        accounts = settings.num_accounts(),
        "settings loaded"
    );

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Open { account } => {
            let config = app::find_account(&settings, &account)?;
            if let Err(e) = browser::open_notifications(&config) {
                tracing::warn!(account = config.account_id, "failed to open browser: {e}");
            }
            Ok(())
        }
        Commands::Check => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(app::check(settings))
        }
        Commands::Run => {
            tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting ghnotify");
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(app::run(path, settings))?;
            tracing::info!("ghnotify shut down cleanly");
            Ok(())
        }
    }
}
