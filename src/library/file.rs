use std::path::{Path, PathBuf};

use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use super::paths;
use crate::state::{EntryId, PersistenceError};

/// Write an export using a `.part` temp file.
///
/// The file only appears under its final name once fully written and
/// flushed, so an interrupted run never leaves a truncated e-book that the
/// next run would mistake for a synced one.
pub async fn write_export(
    base_dir: &Path,
    id: EntryId,
    data: &[u8],
) -> Result<PathBuf, PersistenceError> {
    let final_path = paths::export_path(base_dir, id);
    let part_path = paths::partial_export_path(base_dir, id);
    let write_err = |source: std::io::Error| PersistenceError::WriteExport {
        path: final_path.clone(),
        source,
    };

    let written = async {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&part_path)
            .await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&part_path, &final_path).await
    }
    .await;

    if let Err(e) = written {
        let _ = fs::remove_file(&part_path).await;
        return Err(write_err(e));
    }

    Ok(final_path)
}

/// Remove the export for `id`. An already absent file counts as removed.
pub async fn remove_export(base_dir: &Path, id: EntryId) -> Result<(), PersistenceError> {
    let path = paths::export_path(base_dir, id);
    match fs::remove_file(&path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(id = %id, path = %path.display(), "Export already gone");
            Ok(())
        }
        Err(source) => Err(PersistenceError::RemoveExport { path, source }),
    }
}
