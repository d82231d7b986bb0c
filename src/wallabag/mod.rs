//! wallabag remote entry source.
//!
//! The reconciler only sees the [`EntrySource`] trait; [`WallabagClient`]
//! implements it over the wallabag v2 REST API.

pub mod auth;
pub mod client;
pub mod error;
pub mod responses;

use async_trait::async_trait;

use crate::state::EntryId;

pub use auth::Credentials;
pub use client::{ClientConfig, WallabagClient};
pub use error::RemoteError;

/// Remote side of the sync: which entries are unread, and the two
/// operations the reconciler performs on them.
#[async_trait]
pub trait EntrySource: Send + Sync {
    /// Ids of every non-archived entry, across all pages, in server order.
    async fn list_unarchived(&self) -> Result<Vec<EntryId>, RemoteError>;

    /// Mark an entry as archived (read).
    async fn archive_entry(&self, id: EntryId) -> Result<(), RemoteError>;

    /// Exported e-book bytes for an entry.
    async fn fetch_export(&self, id: EntryId) -> Result<Vec<u8>, RemoteError>;
}
