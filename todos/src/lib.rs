//! Optimistic to-do list manager backed by a remote collection service.
//!
//! The list supports create, toggle, delete, bulk-clear and filter-by-status.
//! Adds and deletes are applied to local state before the remote service
//! confirms them and are rolled back if it refuses; failures surface as a
//! transient notification.
//!
//! - [`TodoReducer`]: every state transition, optimistic and confirmed
//! - [`PendingOps`]: ids with a remote delete in flight
//! - [`filter()`]: the all/active/completed view
//! - [`Notification`]: the single, self-expiring error message
//! - [`RemoteCollection`]: the service, over HTTP or in memory
//! - [`TodoApp`]: async facade returning a `Result` per operation
//!
//! # Quick Start
//!
//! ```no_run
//! use todomvc::{InMemoryCollection, TodoApp, TodoEnvironment, UserId};
//! use todomvc_core::environment::SystemClock;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let env = TodoEnvironment::new(
//!     Arc::new(InMemoryCollection::new()),
//!     Arc::new(SystemClock),
//!     UserId::new(1),
//! );
//! let app = TodoApp::new(env);
//! app.start().await?;
//!
//! let item = app.add("Buy milk").await?;
//! app.toggle(item.id).await?;
//! app.remove_completed().await?;
//!
//! println!("Items left: {}", app.view(|s| s.active_count()).await);
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod config;
pub mod error;
pub mod filter;
pub mod notification;
pub mod pending;
pub mod reducer;
pub mod remote;
pub mod shell;
pub mod types;

// Re-export commonly used types
pub use app::{TodoApp, TodoStore};
pub use config::Config;
pub use error::{AppError, RemoteError, TodoError};
pub use filter::{Filter, filter};
pub use notification::Notification;
pub use pending::PendingOps;
pub use reducer::{TodoEnvironment, TodoReducer};
pub use remote::{HttpCollection, InMemoryCollection, RemoteCall, RemoteCollection};
pub use types::{
    Item, ItemId, Lifecycle, NewItem, Operation, RequestId, TodoAction, TodoState, UserId,
};
