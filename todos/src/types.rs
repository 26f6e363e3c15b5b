//! Domain types for the to-do list.
//!
//! Items come from the remote collection service. The local state adds what
//! the service never sees: the optimistic placeholder of an add in flight,
//! the per-item lifecycle of a delete in flight, the pending-operation
//! tracker, the filter, the draft input and the transient notification.

use crate::error::{RemoteError, TodoError};
use crate::filter::{Filter, filter};
use crate::notification::Notification;
use crate::pending::PendingOps;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a to-do item, assigned by the remote service
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(u64);

impl ItemId {
    /// Id of an item the service has not assigned an id to yet
    pub const PLACEHOLDER: Self = Self(0);

    /// Creates an `ItemId` from its raw value
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Whether this is the placeholder id
    #[must_use]
    pub const fn is_placeholder(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the user owning the list
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(u64);

impl UserId {
    /// Creates a `UserId` from its raw value
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Zero means no user is configured
    #[must_use]
    pub const fn is_set(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Correlates a command with the result action that answers it
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct RequestId(u64);

impl RequestId {
    /// Creates a `RequestId` from its raw value
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// Local-only lifecycle of an item
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Lifecycle {
    /// No operation in flight
    #[default]
    Idle,
    /// A remote delete is in flight
    Deleting,
}

/// A single to-do item
///
/// Serialized as `{"id":1,"userId":42,"title":"a","completed":false}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Identifier
    pub id: ItemId,
    /// Owning user
    pub user_id: UserId,
    /// Title
    pub title: String,
    /// Whether the item is done
    pub completed: bool,
    /// Never sent to or read from the service
    #[serde(skip)]
    pub lifecycle: Lifecycle,
}

impl Item {
    /// Creates an idle, not completed item
    #[must_use]
    pub const fn new(id: ItemId, user_id: UserId, title: String) -> Self {
        Self {
            id,
            user_id,
            title,
            completed: false,
            lifecycle: Lifecycle::Idle,
        }
    }

    /// Creates the optimistic stand-in for an add in flight
    #[must_use]
    pub const fn placeholder(user_id: UserId, title: String) -> Self {
        Self::new(ItemId::PLACEHOLDER, user_id, title)
    }

    /// Whether a delete is in flight for this item
    #[must_use]
    pub fn is_deleting(&self) -> bool {
        self.lifecycle == Lifecycle::Deleting
    }
}

/// Draft sent to the service to create an item
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    /// Owning user
    pub user_id: UserId,
    /// Trimmed title
    pub title: String,
    /// Always `false` on creation
    pub completed: bool,
}

impl NewItem {
    /// Creates a draft for a not completed item
    #[must_use]
    pub const fn new(user_id: UserId, title: String) -> Self {
        Self {
            user_id,
            title,
            completed: false,
        }
    }
}

/// State of the to-do list
#[derive(Clone, Debug, Default)]
pub struct TodoState {
    /// Confirmed items, in list order
    pub items: Vec<Item>,
    /// Stand-in for the add in flight; at most one exists
    pub placeholder: Option<Item>,
    /// Ids with a remote delete in flight
    pub pending: PendingOps,
    /// Current filter
    pub filter: Filter,
    /// Content of the new-item input
    pub draft: String,
    /// Transient error message
    pub notification: Notification,
    /// A list fetch is in flight
    pub loading: bool,
    /// An add is in flight
    pub submitting: bool,
    /// A bulk clear of completed items is in flight
    pub clearing_completed: bool,
    /// Last failure, for callers that want more than the notification text
    pub last_error: Option<TodoError>,
}

impl TodoState {
    /// Creates an empty state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a state holding `items`
    #[must_use]
    pub fn with_items(items: Vec<Item>) -> Self {
        Self {
            items,
            ..Self::default()
        }
    }

    /// Returns an item by id
    #[must_use]
    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Returns an item by id, mutably
    pub fn get_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.items.iter_mut().find(|item| item.id == id)
    }

    /// Checks if an item exists
    #[must_use]
    pub fn contains(&self, id: ItemId) -> bool {
        self.get(id).is_some()
    }

    /// Items shown under the current filter, followed by the placeholder
    #[must_use]
    pub fn visible_items(&self) -> Vec<&Item> {
        let mut visible = filter(&self.items, self.filter);
        visible.extend(self.placeholder.as_ref());
        visible
    }

    /// Number of items not completed ("N items left")
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.items.iter().filter(|item| !item.completed).count()
    }

    /// Number of completed items
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.items.iter().filter(|item| item.completed).count()
    }

    /// Whether the list is non-empty and every item is completed
    #[must_use]
    pub fn all_completed(&self) -> bool {
        !self.items.is_empty() && self.items.iter().all(|item| item.completed)
    }

    /// Whether there is anything for "clear completed" to remove
    #[must_use]
    pub fn has_completed(&self) -> bool {
        self.items.iter().any(|item| item.completed)
    }

    /// Whether the footer (counter, filters, clear completed) is shown
    #[must_use]
    pub fn show_footer(&self) -> bool {
        !self.items.is_empty()
    }

    /// Whether `id` has a remote operation in flight
    #[must_use]
    pub fn is_pending(&self, id: ItemId) -> bool {
        self.pending.contains(id)
    }
}

/// Operation a rejection refers to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    /// `AddTodo`
    Add,
    /// `ToggleTodo`
    Toggle(ItemId),
    /// `RemoveTodo`
    Remove(ItemId),
    /// `RemoveCompleted`
    RemoveCompleted,
}

/// Actions of the to-do list
///
/// Commands come from the user. Results are fed back by effects once the
/// remote service (or the notification timer) answers, and echo the
/// [`RequestId`] of the command they resolve.
#[derive(Clone, Debug, PartialEq)]
pub enum TodoAction {
    // ========== Commands ==========
    /// Command: Fetch the whole list, replacing local items
    Load {
        /// Correlation id
        request: RequestId,
    },

    /// Command: Update the new-item input
    SetDraft {
        /// Input content
        text: String,
    },

    /// Command: Create an item
    AddTodo {
        /// Raw title as typed
        title: String,
        /// Correlation id
        request: RequestId,
    },

    /// Command: Flip `completed` of one item (local only)
    ToggleTodo {
        /// Item to toggle
        id: ItemId,
        /// Correlation id
        request: RequestId,
    },

    /// Command: Complete every item, or un-complete all if all are completed
    ToggleAll,

    /// Command: Delete an item
    RemoveTodo {
        /// Item to delete
        id: ItemId,
        /// Correlation id
        request: RequestId,
    },

    /// Command: Delete every completed item, all or nothing
    RemoveCompleted {
        /// Correlation id
        request: RequestId,
    },

    /// Command: Change the filter
    SetFilter {
        /// New filter
        filter: Filter,
    },

    /// Command: Hide the notification now
    DismissNotification,

    // ========== Results ==========
    /// Result: List fetched
    TodosLoaded {
        /// Items owned by the user
        items: Vec<Item>,
        /// Correlation id
        request: RequestId,
    },

    /// Result: List fetch failed
    LoadFailed {
        /// Remote failure
        error: RemoteError,
        /// Correlation id
        request: RequestId,
    },

    /// Result: Item created
    TodoAdded {
        /// Item as stored by the service
        item: Item,
        /// Correlation id
        request: RequestId,
    },

    /// Result: Create failed
    AddFailed {
        /// Title to put back into the input
        title: String,
        /// Remote failure
        error: RemoteError,
        /// Correlation id
        request: RequestId,
    },

    /// Result: Item toggled
    TodoToggled {
        /// Toggled item
        id: ItemId,
        /// New `completed` value
        completed: bool,
        /// Correlation id
        request: RequestId,
    },

    /// Result: Item deleted
    TodoRemoved {
        /// Deleted item
        id: ItemId,
        /// Correlation id
        request: RequestId,
    },

    /// Result: Delete failed
    RemoveFailed {
        /// Item that stays
        id: ItemId,
        /// Remote failure
        error: RemoteError,
        /// Correlation id
        request: RequestId,
    },

    /// Result: Every delete of a bulk clear succeeded
    CompletedRemoved {
        /// Deleted items
        ids: Vec<ItemId>,
        /// Correlation id
        request: RequestId,
    },

    /// Result: At least one delete of a bulk clear failed
    RemoveCompletedFailed {
        /// Whole batch
        ids: Vec<ItemId>,
        /// Ids whose delete failed
        failed: Vec<ItemId>,
        /// Correlation id
        request: RequestId,
    },

    /// Result: Notification countdown elapsed
    NotificationExpired {
        /// Generation the countdown was started for
        generation: u64,
    },

    /// Result: A command was refused before touching state or the network
    Rejected {
        /// Refused operation
        operation: Operation,
        /// Correlation id of the refused command
        request: RequestId,
        /// Reason
        error: TodoError,
    },
}

impl TodoAction {
    /// Correlation id of a remote command or result, if it has one
    #[must_use]
    pub const fn request(&self) -> Option<RequestId> {
        match self {
            Self::Load { request }
            | Self::AddTodo { request, .. }
            | Self::ToggleTodo { request, .. }
            | Self::TodoToggled { request, .. }
            | Self::RemoveTodo { request, .. }
            | Self::RemoveCompleted { request }
            | Self::TodosLoaded { request, .. }
            | Self::LoadFailed { request, .. }
            | Self::TodoAdded { request, .. }
            | Self::AddFailed { request, .. }
            | Self::TodoRemoved { request, .. }
            | Self::RemoveFailed { request, .. }
            | Self::CompletedRemoved { request, .. }
            | Self::RemoveCompletedFailed { request, .. }
            | Self::Rejected { request, .. } => Some(*request),
            Self::SetDraft { .. }
            | Self::ToggleAll
            | Self::SetFilter { .. }
            | Self::DismissNotification
            | Self::NotificationExpired { .. } => None,
        }
    }
}
