//! # todomvc runtime
//!
//! The Store runtime that coordinates reducer execution and effect handling.
//!
//! ## Core Components
//!
//! - **Store**: Owns state, serializes actions through the reducer, executes effects
//! - **Effect Executor**: Runs effect descriptions and feeds result actions back
//! - **Cancellation registry**: Tracks `Effect::Cancellable` tasks by [`EffectId`]
//!
//! Only one action is reduced at a time: the reducer runs under the state
//! write lock, so optimistic updates and their confirmations never interleave
//! inside a single transition.
//!
//! ## Example
//!
//! ```ignore
//! use todomvc_runtime::Store;
//!
//! let store = Store::new(initial_state, my_reducer, environment);
//!
//! // Send an action
//! store.send(Action::DoSomething).await?;
//!
//! // Read state
//! let value = store.state(|s| s.some_field).await;
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use todomvc_core::effect::{Effect, EffectId};
use todomvc_core::reducer::Reducer;
use tokio::sync::{RwLock, mpsc, watch};
use tokio::task::AbortHandle;

/// Metrics registry and recorders
pub mod metrics;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        ///
        /// Returned when `send()` is called after shutdown initiated.
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out waiting for effects to complete
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// Timeout waiting for a terminal action in `send_and_wait_for`
        #[error("Timeout waiting for action")]
        Timeout,

        /// Action channel closed before a matching action arrived
        #[error("Action channel closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;

/// Configuration for Store instances
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use todomvc_runtime::StoreConfig;
///
/// let config = StoreConfig::default()
///     .with_broadcast_capacity(64)
///     .with_shutdown_timeout(Duration::from_secs(5));
/// assert_eq!(config.broadcast_capacity, 64);
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Number of actions buffered for slow observers
    pub broadcast_capacity: usize,
    /// Default timeout for graceful shutdown
    pub default_shutdown_timeout: Duration,
}

impl StoreConfig {
    /// Set the action broadcast capacity
    #[must_use]
    pub const fn with_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity;
        self
    }

    /// Set the default shutdown timeout
    #[must_use]
    pub const fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.default_shutdown_timeout = timeout;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: 16,
            default_shutdown_timeout: Duration::from_secs(30),
        }
    }
}

/// Handle for tracking effect completion
///
/// Returned by [`Store::send()`]. Waiting on it returns once every effect the
/// action produced has finished, including reduction of the actions those
/// effects fed back. Effects started by the fed-back actions are not tracked.
///
/// # Example
///
/// ```ignore
/// let mut handle = store.send(Action::Start).await?;
/// handle.wait_with_timeout(Duration::from_secs(5)).await?;
/// ```
#[derive(Clone)]
pub struct EffectHandle {
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    fn new() -> (Self, EffectTracking) {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(());

        let handle = Self {
            effects: Arc::clone(&counter),
            completion: rx,
        };
        let tracking = EffectTracking {
            counter,
            notifier: Arc::new(tx),
        };

        (handle, tracking)
    }

    /// Create a handle that's already complete
    #[must_use]
    pub fn completed() -> Self {
        let (handle, _tracking) = Self::new();
        handle
    }

    /// Number of effects still running for this handle
    #[must_use]
    pub fn pending(&self) -> usize {
        self.effects.load(Ordering::SeqCst)
    }

    /// Wait for all effects to complete
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            if self.completion.changed().await.is_err() {
                break;
            }
        }
    }

    /// Wait for all effects to complete with a timeout
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if the timeout expires before all effects complete.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending_effects", &self.pending())
            .finish_non_exhaustive()
    }
}

/// Internal: per-action effect counter shared by every effect the action produced
#[derive(Clone)]
struct EffectTracking {
    counter: Arc<AtomicUsize>,
    notifier: Arc<watch::Sender<()>>,
}

impl EffectTracking {
    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            let _ = self.notifier.send(());
        }
    }
}

/// Internal: counters released when a spawned effect task finishes or is aborted
///
/// The guards are built before `tokio::spawn` and moved into the task, so
/// they are dropped even when the task is aborted before its first poll.
struct TaskGuards {
    tracking: Option<EffectTracking>,
    pending: Arc<AtomicUsize>,
}

impl Drop for TaskGuards {
    fn drop(&mut self) {
        if let Some(tracking) = &self.tracking {
            tracking.decrement();
        }
        self.pending.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Running cancellable effects, keyed by id. The token tells a finishing task
/// whether the slot still belongs to it.
type InFlight = HashMap<EffectId, (u64, AbortHandle)>;

/// Callers waiting in `send_and_select`, each with its own unbounded queue so
/// a burst of results can never push out the one a caller is waiting for.
type Waiters<A> = HashMap<u64, mpsc::UnboundedSender<A>>;

/// Internal: removes a waiter when `send_and_select` returns or is dropped
struct WaiterGuard<A> {
    waiters: Arc<Mutex<Waiters<A>>>,
    id: u64,
}

impl<A> Drop for WaiterGuard<A> {
    fn drop(&mut self) {
        self.waiters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

/// Store module - The runtime for reducers
pub mod store {
    use super::{
        Arc, AtomicBool, AtomicU64, AtomicUsize, Duration, Effect, EffectHandle, EffectId,
        EffectTracking, InFlight, Mutex, MutexGuard, Ordering, PoisonError, Reducer, RwLock,
        StoreConfig, StoreError, TaskGuards, WaiterGuard, Waiters, mpsc,
    };
    use crate::metrics::StoreMetrics;
    use futures::future::{BoxFuture, join_all};
    use std::collections::HashMap;
    use tokio::sync::broadcast;

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock`, written only by the reducer)
    /// 2. Reducer (business logic)
    /// 3. Environment (injected dependencies)
    /// 4. Effect execution (with feedback loop and cancellation)
    ///
    /// Cloning a Store is cheap; clones share state and in-flight effects.
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: R,
        environment: E,
        shutdown: Arc<AtomicBool>,
        pending_effects: Arc<AtomicUsize>,
        in_flight: Arc<Mutex<InFlight>>,
        next_token: Arc<AtomicU64>,
        /// Every action produced by an effect is broadcast here after it has
        /// been reduced.
        action_broadcast: broadcast::Sender<A>,
        waiters: Arc<Mutex<Waiters<A>>>,
        next_waiter: Arc<AtomicU64>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone + Send + Sync + 'static,
        A: Clone + Send + 'static,
        S: Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_config(initial_state, reducer, environment, StoreConfig::default())
        }

        /// Create a new Store with custom configuration
        #[must_use]
        pub fn with_config(
            initial_state: S,
            reducer: R,
            environment: E,
            config: StoreConfig,
        ) -> Self {
            let (action_broadcast, _) = broadcast::channel(config.broadcast_capacity.max(1));

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer,
                environment,
                shutdown: Arc::new(AtomicBool::new(false)),
                pending_effects: Arc::new(AtomicUsize::new(0)),
                in_flight: Arc::new(Mutex::new(HashMap::new())),
                next_token: Arc::new(AtomicU64::new(0)),
                action_broadcast,
                waiters: Arc::new(Mutex::new(HashMap::new())),
                next_waiter: Arc::new(AtomicU64::new(0)),
            }
        }

        /// Number of effect tasks currently running across all actions
        #[must_use]
        pub fn pending_effects(&self) -> usize {
            self.pending_effects.load(Ordering::Acquire)
        }

        /// Whether a cancellable effect is currently registered under `id`
        #[must_use]
        pub fn is_running(&self, id: EffectId) -> bool {
            self.lock_in_flight().contains_key(&id)
        }

        /// Initiate graceful shutdown of the store
        ///
        /// Rejects new actions, cancels every cancellable effect (timers must
        /// not hold shutdown open), then waits for the remaining effects.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if the timeout expires before all
        /// pending effects complete.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!("Initiating graceful shutdown");
            self.shutdown.store(true, Ordering::Release);

            let cancelled: Vec<_> = self.lock_in_flight().drain().collect();
            for (id, (_, task)) in cancelled {
                tracing::debug!(effect_id = %id, "Cancelling effect for shutdown");
                task.abort();
                StoreMetrics::record_cancellation();
            }

            let start = std::time::Instant::now();
            let poll_interval = Duration::from_millis(20);

            loop {
                let pending = self.pending_effects();

                if pending == 0 {
                    tracing::info!("All effects completed, shutdown successful");
                    return Ok(());
                }

                if start.elapsed() >= timeout {
                    tracing::error!(
                        pending_effects = pending,
                        "Shutdown timeout: {} effects still running", pending
                    );
                    return Err(StoreError::ShutdownTimeout(pending));
                }

                tokio::time::sleep(poll_interval).await;
            }
        }

        /// Send an action to the store
        ///
        /// 1. Acquires the write lock on state
        /// 2. Calls the reducer with (state, action, environment)
        /// 3. Starts the returned effects and returns without waiting for them
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        ///
        /// # Panics
        ///
        /// If the reducer panics, the panic propagates to the caller.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError> {
            if self.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected action: store is shutting down");
                return Err(StoreError::ShutdownInProgress);
            }

            let (handle, tracking) = EffectHandle::new();

            let effects = {
                let mut state = self.state.write().await;

                let span = tracing::debug_span!("reducer_execution");
                let _enter = span.enter();

                let start = std::time::Instant::now();
                let effects = self.reducer.reduce(&mut *state, action, &self.environment);
                StoreMetrics::record_action(start.elapsed());

                tracing::trace!("Reducer completed, returned {} effects", effects.len());
                effects
            };

            for effect in effects {
                self.execute_effect(effect, Some(&tracking));
            }

            Ok(handle)
        }

        /// Send an action and wait for a matching result action
        ///
        /// Subscribes to the action broadcast before sending, so a result
        /// produced immediately by an effect cannot be missed.
        ///
        /// # Errors
        ///
        /// - [`StoreError::Timeout`]: Timeout expired before a matching action arrived
        /// - [`StoreError::ChannelClosed`]: Action channel closed
        /// - [`StoreError::ShutdownInProgress`]: Store is shutting down
        pub async fn send_and_wait_for<F>(
            &self,
            action: A,
            predicate: F,
            timeout: Duration,
        ) -> Result<A, StoreError>
        where
            F: Fn(&A) -> bool,
        {
            self.send_and_select(action, |a| predicate(a).then(|| a.clone()), timeout)
                .await
        }

        /// Send an action and map the first result action `select` accepts
        ///
        /// Like [`Store::send_and_wait_for`], but `select` extracts the
        /// caller's answer from the matching action directly.
        ///
        /// Unlike [`Store::subscribe_actions`], the caller gets its own
        /// unbounded queue, so no number of concurrent results can make it
        /// miss its answer.
        ///
        /// # Errors
        ///
        /// Same as [`Store::send_and_wait_for`].
        pub async fn send_and_select<T, F>(
            &self,
            action: A,
            select: F,
            timeout: Duration,
        ) -> Result<T, StoreError>
        where
            F: Fn(&A) -> Option<T>,
        {
            let (_guard, mut rx) = self.register_waiter();

            self.send(action).await?;

            tokio::time::timeout(timeout, async {
                while let Some(action) = rx.recv().await {
                    if let Some(selected) = select(&action) {
                        return Ok(selected);
                    }
                }
                Err(StoreError::ChannelClosed)
            })
            .await
            .map_err(|_| StoreError::Timeout)?
        }

        /// Subscribe to all actions produced by effects
        ///
        /// Actions sent directly through [`Store::send`] are not broadcast.
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let count = store.state(|s| s.items.len()).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&*state)
        }

        fn register_waiter(&self) -> (WaiterGuard<A>, mpsc::UnboundedReceiver<A>) {
            let (tx, rx) = mpsc::unbounded_channel();
            let id = self.next_waiter.fetch_add(1, Ordering::Relaxed);
            self.lock_waiters().insert(id, tx);

            let guard = WaiterGuard {
                waiters: Arc::clone(&self.waiters),
                id,
            };
            (guard, rx)
        }

        fn lock_waiters(&self) -> MutexGuard<'_, Waiters<A>> {
            self.waiters.lock().unwrap_or_else(PoisonError::into_inner)
        }

        fn lock_in_flight(&self) -> MutexGuard<'_, InFlight> {
            self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
        }

        fn guards(&self, tracking: Option<&EffectTracking>) -> TaskGuards {
            if let Some(tracking) = tracking {
                tracking.increment();
            }
            self.pending_effects.fetch_add(1, Ordering::SeqCst);

            TaskGuards {
                tracking: tracking.cloned(),
                pending: Arc::clone(&self.pending_effects),
            }
        }

        /// Start an effect
        ///
        /// `None`, `Parallel` and `Cancel` are handled inline; every other
        /// variant runs in its own task. Effect failures never reach the
        /// caller: a panicking task is reported by tokio and its guards still
        /// release the counters.
        fn execute_effect(&self, effect: Effect<A>, tracking: Option<&EffectTracking>) {
            match effect {
                Effect::None => {
                    StoreMetrics::record_effect("none");
                },
                Effect::Parallel(effects) => {
                    StoreMetrics::record_effect("parallel");
                    for effect in effects {
                        self.execute_effect(effect, tracking);
                    }
                },
                Effect::Cancel(id) => {
                    StoreMetrics::record_effect("cancel");
                    self.cancel(id);
                },
                Effect::Cancellable { id, effect } => {
                    StoreMetrics::record_effect("cancellable");
                    self.spawn_cancellable(id, *effect, tracking);
                },
                other => {
                    StoreMetrics::record_effect(effect_kind(&other));
                    let guards = self.guards(tracking);
                    let store = self.clone();

                    tokio::spawn(async move {
                        let _guards = guards;
                        store.run_effect(other).await;
                    });
                },
            }
        }

        fn spawn_cancellable(&self, id: EffectId, effect: Effect<A>, tracking: Option<&EffectTracking>) {
            let guards = self.guards(tracking);
            let token = self.next_token.fetch_add(1, Ordering::Relaxed);
            let store = self.clone();

            // Held across spawn so the task cannot clear its slot before it is registered.
            let mut in_flight = self.lock_in_flight();
            let task = tokio::spawn(async move {
                let _guards = guards;
                store.run_effect(effect).await;

                let mut in_flight = store.lock_in_flight();
                if in_flight.get(&id).is_some_and(|(current, _)| *current == token) {
                    in_flight.remove(&id);
                }
            });

            if let Some((_, previous)) = in_flight.insert(id, (token, task.abort_handle())) {
                tracing::debug!(effect_id = %id, "Replacing in-flight effect");
                previous.abort();
                StoreMetrics::record_cancellation();
            }
        }

        fn cancel(&self, id: EffectId) {
            let removed = self.lock_in_flight().remove(&id);
            if let Some((_, task)) = removed {
                tracing::debug!(effect_id = %id, "Cancelling effect");
                task.abort();
                StoreMetrics::record_cancellation();
            }
        }

        /// Run an effect to completion inside the current task
        fn run_effect(&self, effect: Effect<A>) -> BoxFuture<'static, ()> {
            let store = self.clone();

            Box::pin(async move {
                match effect {
                    Effect::None => {},
                    Effect::Future(fut) => {
                        if let Some(action) = fut.await {
                            store.feed_back(action).await;
                        } else {
                            tracing::trace!("Effect::Future completed with no action");
                        }
                    },
                    Effect::Delay { duration, action } => {
                        tokio::time::sleep(duration).await;
                        tracing::trace!(?duration, "Effect::Delay elapsed");
                        store.feed_back(*action).await;
                    },
                    Effect::Parallel(effects) => {
                        join_all(effects.into_iter().map(|effect| store.run_effect(effect))).await;
                    },
                    Effect::Sequential(effects) => {
                        for effect in effects {
                            store.run_effect(effect).await;
                        }
                    },
                    Effect::Cancellable { id, effect } => {
                        store.spawn_cancellable(id, *effect, None);
                    },
                    Effect::Cancel(id) => store.cancel(id),
                }
            })
        }

        /// Reduce an effect-produced action, then hand it to waiters and
        /// broadcast it to observers
        async fn feed_back(&self, action: A) {
            match self.send(action.clone()).await {
                Ok(_) => {
                    self.lock_waiters()
                        .retain(|_, waiter| waiter.send(action.clone()).is_ok());
                    let _ = self.action_broadcast.send(action);
                },
                Err(error) => {
                    tracing::debug!(%error, "Dropped effect action");
                },
            }
        }
    }

    fn effect_kind<A>(effect: &Effect<A>) -> &'static str {
        match effect {
            Effect::None => "none",
            Effect::Parallel(_) => "parallel",
            Effect::Sequential(_) => "sequential",
            Effect::Delay { .. } => "delay",
            Effect::Future(_) => "future",
            Effect::Cancellable { .. } => "cancellable",
            Effect::Cancel(_) => "cancel",
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone,
        E: Clone,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: self.reducer.clone(),
                environment: self.environment.clone(),
                shutdown: Arc::clone(&self.shutdown),
                pending_effects: Arc::clone(&self.pending_effects),
                in_flight: Arc::clone(&self.in_flight),
                next_token: Arc::clone(&self.next_token),
                action_broadcast: self.action_broadcast.clone(),
                waiters: Arc::clone(&self.waiters),
                next_waiter: Arc::clone(&self.next_waiter),
            }
        }
    }
}

pub use store::Store;
