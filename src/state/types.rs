//! Entry identifiers and the ordered id set used for the manifest.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of one wallabag entry. Serialized as a bare JSON integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Insertion-ordered set of entry ids.
///
/// Membership is answered from a hash set while the `Vec` keeps the order
/// ids were first inserted in, so persisting the set is stable across runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<EntryId>", into = "Vec<EntryId>")]
pub struct EntrySet {
    order: Vec<EntryId>,
    members: HashSet<EntryId>,
}

impl EntrySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: EntryId) -> bool {
        self.members.contains(&id)
    }

    /// Insert `id`, returning `false` if it was already present.
    pub fn insert(&mut self, id: EntryId) -> bool {
        if !self.members.insert(id) {
            return false;
        }
        self.order.push(id);
        true
    }

    /// Remove `id`, returning `false` if it was not present.
    pub fn remove(&mut self, id: EntryId) -> bool {
        if !self.members.remove(&id) {
            return false;
        }
        self.order.retain(|&existing| existing != id);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = EntryId> + '_ {
        self.order.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn to_vec(&self) -> Vec<EntryId> {
        self.order.clone()
    }
}

impl PartialEq for EntrySet {
    /// Two sets are equal when they hold the same ids; order is ignored.
    fn eq(&self, other: &Self) -> bool {
        self.members == other.members
    }
}

impl Eq for EntrySet {}

impl FromIterator<EntryId> for EntrySet {
    fn from_iter<I: IntoIterator<Item = EntryId>>(iter: I) -> Self {
        let mut set = Self::new();
        for id in iter {
            set.insert(id);
        }
        set
    }
}

impl From<Vec<EntryId>> for EntrySet {
    /// Duplicates collapse onto their first occurrence.
    fn from(ids: Vec<EntryId>) -> Self {
        ids.into_iter().collect()
    }
}

impl From<EntrySet> for Vec<EntryId> {
    fn from(set: EntrySet) -> Self {
        set.order
    }
}

/// The persisted record of which entries are expected to have a local export.
pub type Manifest = EntrySet;
