//! Manifest store trait and the JSON file implementation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::error::PersistenceError;
use super::types::Manifest;
use crate::library::paths::MANIFEST_FILENAME;

/// Loads and persists the manifest of synced entry ids.
///
/// Object safe so the reconciler can take `&dyn ManifestStore`.
#[async_trait]
pub trait ManifestStore: Send + Sync {
    /// Read the persisted manifest. A store that has never been written
    /// returns an empty manifest.
    async fn load(&self) -> Result<Manifest, PersistenceError>;

    /// Replace the persisted manifest with `manifest`.
    async fn save(&self, manifest: &Manifest) -> Result<(), PersistenceError>;
}

/// Manifest persisted as a JSON array of integers, `ids.wb` in the base directory.
#[derive(Debug, Clone)]
pub struct JsonManifestStore {
    path: PathBuf,
}

impl JsonManifestStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the conventional location inside `base_dir`.
    pub fn in_dir(base_dir: &Path) -> Self {
        Self::new(base_dir.join(MANIFEST_FILENAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl ManifestStore for JsonManifestStore {
    async fn load(&self) -> Result<Manifest, PersistenceError> {
        let data = match fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No manifest yet, starting empty");
                return Ok(Manifest::new());
            }
            Err(source) => {
                return Err(PersistenceError::ReadManifest {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        serde_json::from_slice(&data).map_err(|source| PersistenceError::ParseManifest {
            path: self.path.clone(),
            source,
        })
    }

    /// Write-to-temp-then-rename so a crash mid-write leaves the previous
    /// manifest intact.
    async fn save(&self, manifest: &Manifest) -> Result<(), PersistenceError> {
        let write_err = |source: std::io::Error| PersistenceError::WriteManifest {
            path: self.path.clone(),
            source,
        };

        let json =
            serde_json::to_vec(manifest).map_err(|e| write_err(std::io::Error::other(e)))?;
        let temp_path = self.temp_path();

        let written = async {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(&json).await?;
            file.sync_all().await?;
            drop(file);
            fs::rename(&temp_path, &self.path).await
        }
        .await;

        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path).await;
            return Err(write_err(e));
        }
        tracing::debug!(
            path = %self.path.display(),
            entries = manifest.len(),
            "Manifest saved"
        );
        Ok(())
    }
}

/// In-memory store that keeps every saved manifest, for checkpoint assertions.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryManifestStore {
    saves: std::sync::Mutex<Vec<Manifest>>,
    initial: Manifest,
}

#[cfg(test)]
impl MemoryManifestStore {
    pub fn with_manifest(initial: Manifest) -> Self {
        Self {
            saves: std::sync::Mutex::new(Vec::new()),
            initial,
        }
    }

    /// Every manifest passed to `save`, oldest first.
    pub fn saves(&self) -> Vec<Manifest> {
        self.saves.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl ManifestStore for MemoryManifestStore {
    async fn load(&self) -> Result<Manifest, PersistenceError> {
        Ok(self
            .saves
            .lock()
            .unwrap()
            .last()
            .cloned()
            .unwrap_or_else(|| self.initial.clone()))
    }

    async fn save(&self, manifest: &Manifest) -> Result<(), PersistenceError> {
        self.saves.lock().unwrap().push(manifest.clone());
        Ok(())
    }
}
