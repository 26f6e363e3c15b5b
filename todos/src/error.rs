//! Error types for the to-do domain.

use crate::types::ItemId;
use thiserror::Error;
use todomvc_runtime::StoreError;

/// Failures of the remote collection service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The request could not be sent or no response arrived
    #[error("Request failed: {0}")]
    Request(String),

    /// The service answered with a non-success status
    #[error("Remote error (status {status}): {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },

    /// The response body could not be decoded
    #[error("Response parsing failed: {0}")]
    Decode(String),
}

/// Errors of the to-do operations.
///
/// The `Display` text of every variant is the message shown to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TodoError {
    /// Title empty after trimming; never reaches the network
    #[error("Title should not be empty")]
    Validation,

    /// An add is already waiting for the remote service
    #[error("A todo is already being added")]
    AddInFlight,

    /// The item already has a remote operation in flight
    #[error("Todo {0} is already being updated")]
    OperationPending(ItemId),

    /// Completed todos are already being deleted
    #[error("Completed todos are already being deleted")]
    BulkInFlight,

    /// No item with this id
    #[error("Todo {0} not found")]
    NotFound(ItemId),

    /// No owner id is configured, so there is no list to fetch
    #[error("No user is configured")]
    NoUser,

    /// Fetching the list failed
    #[error("Unable to load todos")]
    Load(#[source] RemoteError),

    /// Creating an item failed
    #[error("Unable to add a todo")]
    Add(#[source] RemoteError),

    /// Deleting an item failed
    #[error("Unable to delete a todo")]
    Delete {
        /// Item that is kept
        id: ItemId,
        /// Remote failure
        #[source]
        source: RemoteError,
    },

    /// At least one delete of a bulk clear failed; nothing was removed
    #[error("Unable to delete completed todos")]
    BulkDelete {
        /// Ids whose delete failed
        failed: Vec<ItemId>,
    },
}

impl TodoError {
    /// Whether this error is a guard rejection of a command that conflicts
    /// with an operation in flight, or targets a missing item.
    ///
    /// Guard rejections leave state untouched and do not raise a notification.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::AddInFlight | Self::OperationPending(_) | Self::BulkInFlight | Self::NotFound(_)
        )
    }
}

/// Errors returned by the [`TodoApp`](crate::app::TodoApp) facade
#[derive(Error, Debug)]
pub enum AppError {
    /// The operation failed or was rejected
    #[error(transparent)]
    Todo(#[from] TodoError),

    /// The store could not run the operation
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
