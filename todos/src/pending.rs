//! Pending-operation tracker.
//!
//! The set of item ids with a remote delete in flight. The reducer adds ids
//! when a delete (single or bulk) starts and removes them when it resolves;
//! views only ask [`PendingOps::contains`] to show a loader and disable the
//! delete control.

use crate::types::ItemId;
use std::collections::HashSet;

/// Ids of items with an in-flight remote operation. Unordered.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PendingOps {
    ids: HashSet<ItemId>,
}

impl PendingOps {
    /// Creates an empty tracker
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracks one id. Returns `false` if it was already tracked.
    pub fn insert(&mut self, id: ItemId) -> bool {
        self.ids.insert(id)
    }

    /// Tracks every id in `ids`
    pub fn add_many<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = ItemId>,
    {
        self.ids.extend(ids);
    }

    /// Stops tracking one id. Returns `false` if it was not tracked.
    pub fn remove_one(&mut self, id: ItemId) -> bool {
        self.ids.remove(&id)
    }

    /// Stops tracking every id in `ids`
    pub fn remove_many<'a, I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = &'a ItemId>,
    {
        for id in ids {
            self.ids.remove(id);
        }
    }

    /// Whether `id` has an operation in flight
    #[must_use]
    pub fn contains(&self, id: ItemId) -> bool {
        self.ids.contains(&id)
    }

    /// Stops tracking everything
    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Number of tracked ids
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether nothing is in flight
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
