use serde::Deserialize;

use crate::state::EntryId;

/// Response from `/oauth/v2/token`.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// One page of `/api/entries.json`.
///
/// `pages` and `total` are optional so a server that leaves them out is
/// paged until it returns an empty page or repeats one.
#[derive(Debug, Deserialize)]
pub struct EntriesPage {
    #[serde(default)]
    pub pages: Option<u32>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(rename = "_embedded", default)]
    pub embedded: EmbeddedEntries,
}

#[derive(Debug, Default, Deserialize)]
pub struct EmbeddedEntries {
    #[serde(default)]
    pub items: Vec<EntrySummary>,
}

/// The only field of an entry the sync needs; everything else is ignored.
#[derive(Debug, Deserialize)]
pub struct EntrySummary {
    pub id: EntryId,
}
