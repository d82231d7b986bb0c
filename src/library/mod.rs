//! Local e-book library: the base directory holding `wb_<id>.mobi` exports.
//!
//! Only ids from the manifest are ever looked up. A file that matches the
//! naming convention but is not in the manifest is not tracked.

pub mod file;
pub mod paths;

use std::collections::HashMap;
use std::path::PathBuf;

use crate::state::{EntryId, Manifest, PersistenceError};

/// Whether each manifest entry currently has its export on disk.
///
/// Iteration follows manifest order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileExistenceMap {
    order: Vec<EntryId>,
    present: HashMap<EntryId, bool>,
}

impl FileExistenceMap {
    pub fn insert(&mut self, id: EntryId, exists: bool) {
        if self.present.insert(id, exists).is_none() {
            self.order.push(id);
        }
    }

    /// `Some(exists)` for tracked ids, `None` otherwise.
    pub fn get(&self, id: EntryId) -> Option<bool> {
        self.present.get(&id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntryId, bool)> + '_ {
        self.order.iter().map(|id| (*id, self.present[id]))
    }

    /// Tracked ids whose file is gone.
    pub fn missing(&self) -> impl Iterator<Item = EntryId> + '_ {
        self.iter().filter(|(_, exists)| !exists).map(|(id, _)| id)
    }

    /// Tracked ids whose file is on disk.
    pub fn present(&self) -> impl Iterator<Item = EntryId> + '_ {
        self.iter().filter(|(_, exists)| *exists).map(|(id, _)| id)
    }
}

/// Handle on the base directory.
#[derive(Debug, Clone)]
pub struct LocalLibrary {
    base_dir: PathBuf,
}

impl LocalLibrary {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn export_path(&self, id: EntryId) -> PathBuf {
        paths::export_path(&self.base_dir, id)
    }

    /// Stat the export of every manifest id. Read only.
    pub async fn check_existence(
        &self,
        manifest: &Manifest,
    ) -> Result<FileExistenceMap, PersistenceError> {
        let mut map = FileExistenceMap::default();
        for id in manifest.iter() {
            let path = self.export_path(id);
            let exists = tokio::fs::try_exists(&path)
                .await
                .map_err(|source| PersistenceError::Stat { path, source })?;
            map.insert(id, exists);
        }
        tracing::debug!(
            tracked = manifest.len(),
            missing = map.missing().count(),
            "Checked local exports"
        );
        Ok(map)
    }

    pub async fn write_export(
        &self,
        id: EntryId,
        data: &[u8],
    ) -> Result<PathBuf, PersistenceError> {
        file::write_export(&self.base_dir, id, data).await
    }

    pub async fn remove_export(&self, id: EntryId) -> Result<(), PersistenceError> {
        file::remove_export(&self.base_dir, id).await
    }
}
