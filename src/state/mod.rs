//! Persistent sync state.
//!
//! The only durable state is the manifest: the set of entry ids whose export
//! file was present as of the last checkpoint. It is what lets a run tell a
//! file the user deleted apart from an entry that was never synced.

pub mod error;
pub mod manifest;
pub mod types;

pub use error::PersistenceError;
pub use manifest::{JsonManifestStore, ManifestStore};
pub use types::{EntryId, EntrySet, Manifest};
