//! Remote collection client.
//!
//! The service that stores items. The reducer only talks to it through
//! effects built around an `Arc<dyn RemoteCollection>`.
//!
//! # Implementations
//!
//! - **[`HttpCollection`]** (production): JSON over HTTP with `reqwest`
//! - **[`InMemoryCollection`]** (demo and testing): seeded `Vec` with failure injection

use crate::error::RemoteError;
use crate::types::{Item, ItemId, NewItem, UserId};
use std::future::Future;
use std::pin::Pin;

pub mod http;
pub mod memory;

pub use http::HttpCollection;
pub use memory::{InMemoryCollection, RemoteCall};

/// Boxed future returned by [`RemoteCollection`] methods
pub type RemoteFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, RemoteError>> + Send + 'a>>;

/// The remote collection of to-do items.
///
/// # Dyn Compatibility
///
/// Methods return boxed futures instead of using `async fn` so the trait can
/// be used as `Arc<dyn RemoteCollection>` inside effects.
pub trait RemoteCollection: Send + Sync {
    /// Fetch every item owned by `user`, in service order.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] on transport, status or decoding failures.
    fn list(&self, user: UserId) -> RemoteFuture<'_, Vec<Item>>;

    /// Create an item. The service assigns the id.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] on transport, status or decoding failures.
    fn create(&self, draft: NewItem) -> RemoteFuture<'_, Item>;

    /// Delete an item.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] on transport or status failures.
    fn delete(&self, id: ItemId) -> RemoteFuture<'_, ()>;
}
