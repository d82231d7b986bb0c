//! Reconciler: brings the local library, the manifest and the wallabag
//! account into agreement in three strictly ordered phases.
//!
//! 1. **Archive** every manifest entry whose export the user deleted, then
//!    checkpoint the manifest without them. Archiving happens before the
//!    remote listing so those entries are already excluded from it.
//! 2. **Download** every listed entry the manifest has never seen,
//!    checkpointing after each file so a crash loses at most the file in
//!    flight.
//! 3. **Delete** local exports whose entry is no longer listed, then write
//!    the final manifest. Deletion comes last so nothing is removed before
//!    the listing that justifies it has been fully processed.
//!
//! Any error aborts the run. Re-running is safe because the manifest only
//! ever names entries whose file was confirmed present.

pub mod error;

use std::io::IsTerminal;
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};

use crate::library::{FileExistenceMap, LocalLibrary};
use crate::state::{EntrySet, Manifest, ManifestStore};
use crate::wallabag::EntrySource;

pub use error::SyncError;

/// Options for a run that do not change its outcome.
#[derive(Debug, Clone, Default)]
pub struct SyncConfig {
    pub no_progress_bar: bool,
}

/// What a run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub archived: usize,
    pub downloaded: usize,
    pub kept: usize,
    pub deleted: usize,
}

impl SyncSummary {
    /// True when the run neither mutated the account nor the library.
    pub fn is_noop(&self) -> bool {
        self.archived == 0 && self.downloaded == 0 && self.deleted == 0
    }
}

/// Run one full reconciliation.
pub async fn reconcile(
    source: &dyn EntrySource,
    store: &dyn ManifestStore,
    library: &LocalLibrary,
    config: &SyncConfig,
) -> Result<SyncSummary, SyncError> {
    let started = Instant::now();
    let mut summary = SyncSummary::default();

    let manifest = store.load().await.map_err(SyncError::LoadManifest)?;
    if manifest.is_empty() {
        tracing::info!("Manifest is empty, treating every unread entry as new");
    }
    let existence = library
        .check_existence(&manifest)
        .await
        .map_err(SyncError::Inventory)?;

    let retained = archive_missing(source, store, &manifest, &existence, &mut summary).await?;
    let should_exist = download_new(
        source,
        store,
        library,
        &existence,
        retained,
        config,
        &mut summary,
    )
    .await?;
    delete_stale(library, &existence, &should_exist, &mut summary).await?;

    tracing::debug!(entries = ?should_exist.to_vec(), "Writing final manifest");
    store
        .save(&should_exist)
        .await
        .map_err(SyncError::SaveManifest)?;

    log_summary(&summary, should_exist.len(), started.elapsed());
    Ok(summary)
}

/// Phase 1. Returns the manifest minus every archived entry.
async fn archive_missing(
    source: &dyn EntrySource,
    store: &dyn ManifestStore,
    manifest: &Manifest,
    existence: &FileExistenceMap,
    summary: &mut SyncSummary,
) -> Result<Manifest, SyncError> {
    let mut retained = manifest.clone();

    for id in existence.missing() {
        tracing::info!(id = %id, "Archiving entry");
        source
            .archive_entry(id)
            .await
            .map_err(|source| SyncError::Archive { id, source })?;
        retained.remove(id);
        summary.archived += 1;
    }

    // Nothing archived means `retained` equals what is already on disk.
    if summary.archived > 0 {
        store.save(&retained).await.map_err(SyncError::SaveManifest)?;
    }
    Ok(retained)
}

/// Phase 2. Returns the set of entries that must have a local export.
///
/// Checkpoints persist `retained` plus everything downloaded so far, so
/// files that are present but not yet confirmed by the listing stay tracked
/// if the run dies part way through.
async fn download_new(
    source: &dyn EntrySource,
    store: &dyn ManifestStore,
    library: &LocalLibrary,
    existence: &FileExistenceMap,
    retained: Manifest,
    config: &SyncConfig,
    summary: &mut SyncSummary,
) -> Result<EntrySet, SyncError> {
    let remote = source
        .list_unarchived()
        .await
        .map_err(SyncError::ListEntries)?;
    tracing::info!(entries = remote.len(), "Fetched unarchived entries");

    let pb = create_progress_bar(config.no_progress_bar, remote.len() as u64);
    let mut should_exist = EntrySet::new();
    // Superset of `should_exist`: retained entries stay tracked until the
    // final write so a crash here cannot orphan their files.
    let mut checkpoint = retained;

    for id in remote {
        if should_exist.contains(id) {
            pb.inc(1);
            continue;
        }

        match existence.get(id) {
            Some(true) => {
                should_exist.insert(id);
                summary.kept += 1;
            }
            Some(false) => {
                // Archived in phase 1; the listing predates or ignored it.
                pb.suspend(|| tracing::debug!(id = %id, "Entry archived this run, skipping"));
            }
            None => {
                pb.set_message(format!("entry {}", id));
                pb.suspend(|| tracing::info!(id = %id, "Downloading entry"));
                let data = source
                    .fetch_export(id)
                    .await
                    .map_err(|source| SyncError::FetchExport { id, source })?;
                let path = library
                    .write_export(id, &data)
                    .await
                    .map_err(|source| SyncError::WriteExport { id, source })?;
                pb.suspend(|| {
                    tracing::debug!(
                        id = %id,
                        path = %path.display(),
                        bytes = data.len(),
                        "Export written"
                    )
                });

                should_exist.insert(id);
                checkpoint.insert(id);
                store
                    .save(&checkpoint)
                    .await
                    .map_err(SyncError::SaveManifest)?;
                summary.downloaded += 1;
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    Ok(should_exist)
}

/// Phase 3. Remove present exports whose entry is no longer unread.
async fn delete_stale(
    library: &LocalLibrary,
    existence: &FileExistenceMap,
    should_exist: &EntrySet,
    summary: &mut SyncSummary,
) -> Result<(), SyncError> {
    for id in existence.present() {
        if should_exist.contains(id) {
            continue;
        }
        tracing::info!(id = %id, "Deleting export of entry archived remotely");
        library
            .remove_export(id)
            .await
            .map_err(|source| SyncError::RemoveExport { id, source })?;
        summary.deleted += 1;
    }
    Ok(())
}

/// Create a progress bar with a consistent template.
///
/// Returns `ProgressBar::hidden()` when the user passed `--no-progress-bar` or
/// stdout is not a terminal.
fn create_progress_bar(no_progress_bar: bool, total: u64) -> ProgressBar {
    if no_progress_bar || !std::io::stdout().is_terminal() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
        )
        .expect("valid template")
        .progress_chars("=> "),
    );
    pb
}

fn log_summary(summary: &SyncSummary, tracked: usize, elapsed: Duration) {
    tracing::info!("── Summary ──");
    if summary.is_noop() {
        tracing::info!("  Library already up to date ({} entries)", tracked);
    } else {
        tracing::info!(
            "  {} archived, {} downloaded, {} deleted, {} unchanged",
            summary.archived,
            summary.downloaded,
            summary.deleted,
            summary.kept
        );
    }
    tracing::info!("  elapsed: {}", format_duration(elapsed));
}

fn format_duration(d: Duration) -> String {
    let total_secs = d.as_secs();
    let hours = total_secs / 3600;
    let mins = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    if hours > 0 {
        format!("{}h {:02}m {:02}s", hours, mins, secs)
    } else if mins > 0 {
        format!("{}m {:02}s", mins, secs)
    } else {
        format!("{}s", secs)
    }
}
