//! In-memory remote collection.
//!
//! Backs the shell's demo mode and the tests. Ids are assigned sequentially,
//! failures can be injected per operation or per item, and every call is
//! logged so tests can assert what reached the "network".

use super::{RemoteCollection, RemoteFuture};
use crate::error::RemoteError;
use crate::types::{Item, ItemId, NewItem, UserId};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// A call received by [`InMemoryCollection`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RemoteCall {
    /// `list(user)`
    List(UserId),
    /// `create(draft)`
    Create(NewItem),
    /// `delete(id)`
    Delete(ItemId),
}

#[derive(Debug, Default)]
struct Inner {
    items: Vec<Item>,
    next_id: u64,
    fail_list: bool,
    fail_create: bool,
    fail_all_deletes: bool,
    failing_deletes: HashSet<ItemId>,
    calls: Vec<RemoteCall>,
}

/// Remote collection held in memory. Clones share the same data.
#[derive(Clone, Debug, Default)]
pub struct InMemoryCollection {
    inner: Arc<Mutex<Inner>>,
    latency: Option<Duration>,
}

fn injected() -> RemoteError {
    RemoteError::Status {
        status: 500,
        body: "injected failure".to_string(),
    }
}

impl InMemoryCollection {
    /// Creates an empty collection
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a collection seeded with `items`; new ids continue after the largest
    #[must_use]
    pub fn with_items(items: Vec<Item>) -> Self {
        let next_id = items.iter().map(|item| item.id.get()).max().unwrap_or(0);
        Self {
            inner: Arc::new(Mutex::new(Inner {
                items,
                next_id,
                ..Inner::default()
            })),
            latency: None,
        }
    }

    /// Delays every call by `latency`
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes `list` fail (or succeed again)
    pub fn fail_list(&self, fail: bool) {
        self.lock().fail_list = fail;
    }

    /// Makes `create` fail (or succeed again)
    pub fn fail_create(&self, fail: bool) {
        self.lock().fail_create = fail;
    }

    /// Makes every `delete` fail (or succeed again)
    pub fn fail_all_deletes(&self, fail: bool) {
        self.lock().fail_all_deletes = fail;
    }

    /// Makes `delete(id)` fail
    pub fn fail_delete(&self, id: ItemId) {
        self.lock().failing_deletes.insert(id);
    }

    /// Removes every injected failure
    pub fn clear_failures(&self) {
        let mut inner = self.lock();
        inner.fail_list = false;
        inner.fail_create = false;
        inner.fail_all_deletes = false;
        inner.failing_deletes.clear();
    }

    /// Items currently stored
    #[must_use]
    pub fn items(&self) -> Vec<Item> {
        self.lock().items.clone()
    }

    /// Calls received so far, oldest first
    #[must_use]
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.lock().calls.clone()
    }

    /// Number of calls received so far
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    async fn wait(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn apply_list(&self, user: UserId) -> Result<Vec<Item>, RemoteError> {
        let mut inner = self.lock();
        inner.calls.push(RemoteCall::List(user));
        if inner.fail_list {
            return Err(injected());
        }

        Ok(inner
            .items
            .iter()
            .filter(|item| item.user_id == user)
            .cloned()
            .collect())
    }

    fn apply_create(&self, draft: NewItem) -> Result<Item, RemoteError> {
        let mut inner = self.lock();
        inner.calls.push(RemoteCall::Create(draft.clone()));
        if inner.fail_create {
            return Err(injected());
        }

        inner.next_id += 1;
        let mut item = Item::new(ItemId::new(inner.next_id), draft.user_id, draft.title);
        item.completed = draft.completed;
        inner.items.push(item.clone());
        Ok(item)
    }

    fn apply_delete(&self, id: ItemId) -> Result<(), RemoteError> {
        let mut inner = self.lock();
        inner.calls.push(RemoteCall::Delete(id));
        if inner.fail_all_deletes || inner.failing_deletes.contains(&id) {
            return Err(injected());
        }

        let before = inner.items.len();
        inner.items.retain(|item| item.id != id);
        if inner.items.len() == before {
            return Err(RemoteError::Status {
                status: 404,
                body: format!("todo {id} not found"),
            });
        }
        Ok(())
    }
}

impl RemoteCollection for InMemoryCollection {
    fn list(&self, user: UserId) -> RemoteFuture<'_, Vec<Item>> {
        Box::pin(async move {
            self.wait().await;
            self.apply_list(user)
        })
    }

    fn create(&self, draft: NewItem) -> RemoteFuture<'_, Item> {
        Box::pin(async move {
            self.wait().await;
            self.apply_create(draft)
        })
    }

    fn delete(&self, id: ItemId) -> RemoteFuture<'_, ()> {
        Box::pin(async move {
            self.wait().await;
            self.apply_delete(id)
        })
    }
}
