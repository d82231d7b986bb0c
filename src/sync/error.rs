use thiserror::Error;

use crate::state::{EntryId, PersistenceError};
use crate::wallabag::RemoteError;

/// Why a sync run aborted. One variant per operation, carrying the entry id
/// when the failure concerns a single entry.
///
/// Every variant is fatal: the run stops and the last checkpointed manifest
/// is what the next run resumes from.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Failed to load manifest")]
    LoadManifest(#[source] PersistenceError),

    #[error("Failed to check local exports")]
    Inventory(#[source] PersistenceError),

    #[error("Failed to save manifest")]
    SaveManifest(#[source] PersistenceError),

    #[error("Failed to archive entry {id}")]
    Archive { id: EntryId, source: RemoteError },

    #[error("Failed to list unarchived entries")]
    ListEntries(#[source] RemoteError),

    #[error("Failed to download export for entry {id}")]
    FetchExport { id: EntryId, source: RemoteError },

    #[error("Failed to store export for entry {id}")]
    WriteExport {
        id: EntryId,
        source: PersistenceError,
    },

    #[error("Failed to delete export for entry {id}")]
    RemoveExport {
        id: EntryId,
        source: PersistenceError,
    },
}

impl SyncError {
    /// Whether the failure came from the wallabag server rather than local disk.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            SyncError::Archive { .. } | SyncError::ListEntries(_) | SyncError::FetchExport { .. }
        )
    }

    /// The entry the failed operation concerned, if any.
    pub fn entry_id(&self) -> Option<EntryId> {
        match self {
            SyncError::Archive { id, .. }
            | SyncError::FetchExport { id, .. }
            | SyncError::WriteExport { id, .. }
            | SyncError::RemoveExport { id, .. } => Some(*id),
            SyncError::LoadManifest(_)
            | SyncError::Inventory(_)
            | SyncError::SaveManifest(_)
            | SyncError::ListEntries(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote() -> RemoteError {
        RemoteError::HttpStatus {
            status: 500,
            url: "https://example.org/api/entries/3.json".into(),
        }
    }

    fn disk() -> PersistenceError {
        PersistenceError::RemoveExport {
            path: "/books/wb_3.mobi".into(),
            source: std::io::Error::other("read-only filesystem"),
        }
    }

    #[test]
    fn test_remote_classification() {
        assert!(SyncError::Archive {
            id: EntryId(3),
            source: remote(),
        }
        .is_remote());
        assert!(SyncError::ListEntries(remote()).is_remote());
        assert!(!SyncError::RemoveExport {
            id: EntryId(3),
            source: disk(),
        }
        .is_remote());
        assert!(!SyncError::SaveManifest(disk()).is_remote());
    }

    #[test]
    fn test_entry_id() {
        let err = SyncError::FetchExport {
            id: EntryId(3),
            source: remote(),
        };
        assert_eq!(err.entry_id(), Some(EntryId(3)));
        assert_eq!(SyncError::ListEntries(remote()).entry_id(), None);
    }

    #[test]
    fn test_message_names_operation_and_entry() {
        let err = SyncError::Archive {
            id: EntryId(3),
            source: remote(),
        };
        assert_eq!(err.to_string(), "Failed to archive entry 3");
    }

    #[test]
    fn test_chain_reports_each_cause_once() {
        let err = anyhow::Error::from(SyncError::RemoveExport {
            id: EntryId(3),
            source: disk(),
        });
        let chain = format!("{:#}", err);
        assert_eq!(
            chain,
            "Failed to delete export for entry 3: \
             Failed to remove export file /books/wb_3.mobi: read-only filesystem"
        );
        assert_eq!(chain.matches("read-only filesystem").count(), 1);
    }
}
