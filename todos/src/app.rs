//! Application facade.
//!
//! [`TodoApp`] owns the [`Store`] and exposes each operation as an async
//! method. Commands go through the reducer like any other action, tagged
//! with a fresh [`RequestId`]; the method then waits for the result action
//! echoing that id and turns it into a `Result`. Views read state through
//! [`TodoApp::view`] and never get a mutable handle.

use crate::error::{AppError, TodoError};
use crate::filter::Filter;
use crate::reducer::{TodoEnvironment, TodoReducer};
use crate::types::{Item, ItemId, RequestId, TodoAction, TodoState};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use todomvc_runtime::{Store, StoreConfig};

/// Store running the to-do reducer
pub type TodoStore = Store<TodoState, TodoAction, TodoEnvironment, TodoReducer>;

/// How long an operation waits for its result by default
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(35);

/// The to-do application
#[derive(Clone)]
pub struct TodoApp {
    store: TodoStore,
    environment: TodoEnvironment,
    response_timeout: Duration,
    next_request: Arc<AtomicU64>,
}

impl TodoApp {
    /// Creates the application with an empty list
    #[must_use]
    pub fn new(environment: TodoEnvironment) -> Self {
        Self::with_store_config(environment, StoreConfig::default())
    }

    /// Creates the application with a custom store configuration
    #[must_use]
    pub fn with_store_config(environment: TodoEnvironment, config: StoreConfig) -> Self {
        let store = Store::with_config(TodoState::new(), TodoReducer::new(), environment.clone(), config);
        Self {
            store,
            environment,
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
            next_request: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Overrides how long operations wait for the remote service
    #[must_use]
    pub const fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    /// The underlying store
    #[must_use]
    pub const fn store(&self) -> &TodoStore {
        &self.store
    }

    /// Initial load. Does nothing when no user is configured.
    ///
    /// # Errors
    ///
    /// Same as [`TodoApp::load`].
    pub async fn start(&self) -> Result<(), AppError> {
        let user = self.environment.user_id;
        if !user.is_set() {
            tracing::info!("No user configured, skipping initial load");
            return Ok(());
        }

        let count = self.load().await?;
        tracing::info!(%user, count, "Todos loaded");
        Ok(())
    }

    /// Replaces the list with the remote one. Returns the number of items.
    ///
    /// # Errors
    ///
    /// Returns [`TodoError::NoUser`] without a configured user (no call is
    /// made), [`TodoError::Load`] if the fetch fails (the list is then
    /// empty), or a [`StoreError`](todomvc_runtime::StoreError).
    pub async fn load(&self) -> Result<usize, AppError> {
        if !self.environment.user_id.is_set() {
            return Err(TodoError::NoUser.into());
        }

        self.request(
            |request| TodoAction::Load { request },
            |action| match action {
                TodoAction::TodosLoaded { items, .. } => Some(Ok(items.len())),
                TodoAction::LoadFailed { error, .. } => Some(Err(TodoError::Load(error.clone()))),
                _ => None,
            },
        )
        .await
    }

    /// Adds an item and returns it as stored by the service.
    ///
    /// # Errors
    ///
    /// - [`TodoError::Validation`]: title empty after trimming
    /// - [`TodoError::AddInFlight`]: another add is waiting for the service
    /// - [`TodoError::Add`]: the service refused; the title is back in the draft
    pub async fn add(&self, title: impl Into<String>) -> Result<Item, AppError> {
        let title = title.into();
        self.request(
            |request| TodoAction::AddTodo { title, request },
            |action| match action {
                TodoAction::TodoAdded { item, .. } => Some(Ok(item.clone())),
                TodoAction::AddFailed { error, .. } => Some(Err(TodoError::Add(error.clone()))),
                TodoAction::Rejected { error, .. } => Some(Err(error.clone())),
                _ => None,
            },
        )
        .await
    }

    /// Flips `completed` of one item and returns the new value. Local only.
    ///
    /// # Errors
    ///
    /// Returns [`TodoError::NotFound`] if the item is gone when the toggle
    /// is reduced.
    pub async fn toggle(&self, id: ItemId) -> Result<bool, AppError> {
        self.request(
            |request| TodoAction::ToggleTodo { id, request },
            |action| match action {
                TodoAction::TodoToggled { completed, .. } => Some(Ok(*completed)),
                TodoAction::Rejected { error, .. } => Some(Err(error.clone())),
                _ => None,
            },
        )
        .await
    }

    /// Completes every item, or un-completes all if all are completed. Local only.
    ///
    /// # Errors
    ///
    /// Returns a store error if the store is shutting down.
    pub async fn toggle_all(&self) -> Result<(), AppError> {
        self.store.send(TodoAction::ToggleAll).await?;
        Ok(())
    }

    /// Deletes an item.
    ///
    /// # Errors
    ///
    /// - [`TodoError::NotFound`]: unknown id
    /// - [`TodoError::OperationPending`]: a delete of this item is in flight
    /// - [`TodoError::Delete`]: the service refused; the item stays
    pub async fn remove(&self, id: ItemId) -> Result<(), AppError> {
        self.request(
            |request| TodoAction::RemoveTodo { id, request },
            |action| match action {
                TodoAction::TodoRemoved { .. } => Some(Ok(())),
                TodoAction::RemoveFailed { error, .. } => Some(Err(TodoError::Delete {
                    id,
                    source: error.clone(),
                })),
                TodoAction::Rejected { error, .. } => Some(Err(error.clone())),
                _ => None,
            },
        )
        .await
    }

    /// Deletes every completed item, all or nothing. Returns the deleted ids.
    ///
    /// # Errors
    ///
    /// - [`TodoError::BulkInFlight`]: a bulk clear is in flight
    /// - [`TodoError::BulkDelete`]: a delete failed; every item stays
    pub async fn remove_completed(&self) -> Result<Vec<ItemId>, AppError> {
        self.request(
            |request| TodoAction::RemoveCompleted { request },
            |action| match action {
                TodoAction::CompletedRemoved { ids, .. } => Some(Ok(ids.clone())),
                TodoAction::RemoveCompletedFailed { failed, .. } => {
                    Some(Err(TodoError::BulkDelete {
                        failed: failed.clone(),
                    }))
                },
                TodoAction::Rejected { error, .. } => Some(Err(error.clone())),
                _ => None,
            },
        )
        .await
    }

    /// Changes the filter
    ///
    /// # Errors
    ///
    /// Returns a store error if the store is shutting down.
    pub async fn set_filter(&self, filter: Filter) -> Result<(), AppError> {
        self.store.send(TodoAction::SetFilter { filter }).await?;
        Ok(())
    }

    /// Updates the new-item input
    ///
    /// # Errors
    ///
    /// Returns a store error if the store is shutting down.
    pub async fn set_draft(&self, text: impl Into<String>) -> Result<(), AppError> {
        self.store.send(TodoAction::SetDraft { text: text.into() }).await?;
        Ok(())
    }

    /// Hides the notification and stops its countdown
    ///
    /// # Errors
    ///
    /// Returns a store error if the store is shutting down.
    pub async fn dismiss_notification(&self) -> Result<(), AppError> {
        self.store.send(TodoAction::DismissNotification).await?;
        Ok(())
    }

    /// Reads state through a closure
    pub async fn view<T>(&self, f: impl FnOnce(&TodoState) -> T) -> T {
        self.store.state(f).await
    }

    /// A copy of the whole state
    pub async fn snapshot(&self) -> TodoState {
        self.store.state(Clone::clone).await
    }

    /// Stops accepting operations and waits for in-flight remote calls
    ///
    /// # Errors
    ///
    /// Returns a store error if calls are still running after `timeout`.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), AppError> {
        self.store.shutdown(timeout).await?;
        Ok(())
    }

    /// Sends the command built for a fresh request id and resolves the first
    /// result action echoing that id.
    async fn request<T, C, F>(&self, command: C, resolve: F) -> Result<T, AppError>
    where
        C: FnOnce(RequestId) -> TodoAction,
        F: Fn(&TodoAction) -> Option<Result<T, TodoError>>,
    {
        let request = RequestId::new(self.next_request.fetch_add(1, Ordering::Relaxed));
        let outcome = self
            .store
            .send_and_select(
                command(request),
                |action| {
                    if action.request() == Some(request) {
                        resolve(action)
                    } else {
                        None
                    }
                },
                self.response_timeout,
            )
            .await?;
        Ok(outcome?)
    }
}
