//! wallabag-sync: keeps an e-reader's documents folder in step with the
//! unread entries of a wallabag account.
//!
//! Unread entries are downloaded as `wb_<id>.mobi`. Deleting one of those
//! files on the device archives the entry on the next run, and entries
//! archived elsewhere have their file removed. The set of synced ids is kept
//! in `ids.wb` next to the books so runs can tell the two cases apart.

#![warn(clippy::all)]

mod cli;
mod config;
mod library;
mod notify;
mod state;
mod sync;
mod types;
mod wallabag;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use notify::DeviceNotifier;

/// One full run: authenticate, reconcile, signal the device.
async fn run(config: &config::Config) -> anyhow::Result<()> {
    if !config.base_dir.is_dir() {
        anyhow::bail!(
            "Ebook directory does not exist: {}",
            config.base_dir.display()
        );
    }

    let store = state::JsonManifestStore::in_dir(&config.base_dir);
    let library = library::LocalLibrary::new(&config.base_dir);
    tracing::info!(
        server = %config.server_url,
        manifest = %store.path().display(),
        "Starting wallabag-sync"
    );

    let client = wallabag::WallabagClient::connect(&config.client_config())
        .await
        .with_context(|| format!("Could not log in to {}", config.server_url))?;

    let summary = match sync::reconcile(&client, &store, &library, &config.sync_config()).await {
        Ok(summary) => summary,
        Err(e) => {
            tracing::error!(
                id = ?e.entry_id(),
                remote = e.is_remote(),
                "Sync aborted; the next run resumes from the last saved manifest"
            );
            return Err(e.into());
        }
    };
    tracing::debug!(?summary, "Reconciliation finished");

    let output = notify::CommandNotifier::new(config.reload_command.as_str())
        .notify()
        .await?;
    if !output.is_empty() {
        tracing::debug!(
            output = %String::from_utf8_lossy(&output).trim(),
            "Reload command output"
        );
    }

    tracing::info!("Done");
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let config = config::Config::from_cli(cli)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_filter())),
        )
        .init();
    tracing::debug!(?config, "Loaded configuration");

    if let Err(e) = run(&config).await {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }
    Ok(())
}
