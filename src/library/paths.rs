use std::path::{Path, PathBuf};

use crate::state::EntryId;

/// Manifest filename inside the base directory.
pub const MANIFEST_FILENAME: &str = "ids.wb";

/// Extension of exported e-books.
pub const EXPORT_EXTENSION: &str = "mobi";

/// Filename of the export for `id`, e.g. `wb_42.mobi`.
pub fn export_filename(id: EntryId) -> String {
    format!("wb_{}.{}", id, EXPORT_EXTENSION)
}

pub fn export_path(base_dir: &Path, id: EntryId) -> PathBuf {
    base_dir.join(export_filename(id))
}

/// Temporary path an export is written to before being renamed into place.
pub fn partial_export_path(base_dir: &Path, id: EntryId) -> PathBuf {
    base_dir.join(format!("{}.part", export_filename(id)))
}
