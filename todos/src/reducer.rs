//! Reducer for the to-do list.
//!
//! Every command applies its optimistic change to state right away and
//! describes the remote call as an effect. The call's result comes back as a
//! result action that commits the change or rolls it back, and raises the
//! notification on failure. Each optimistic change is resolved exactly once.

use crate::error::{RemoteError, TodoError};
use crate::notification::{self, DEFAULT_TTL};
use crate::remote::RemoteCollection;
use crate::types::{
    Item, ItemId, Lifecycle, NewItem, Operation, RequestId, TodoAction, TodoState, UserId,
};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use todomvc_core::{SmallVec, effect::Effect, environment::Clock, reducer::Reducer, smallvec};

type Effects = SmallVec<[Effect<TodoAction>; 4]>;

/// Environment dependencies for the to-do reducer
#[derive(Clone)]
pub struct TodoEnvironment {
    /// Remote collection service
    pub remote: Arc<dyn RemoteCollection>,
    /// Clock for notification timestamps
    pub clock: Arc<dyn Clock>,
    /// Owner of every item created
    pub user_id: UserId,
    /// How long a notification stays visible
    pub notification_ttl: Duration,
}

impl TodoEnvironment {
    /// Creates an environment with the default notification TTL
    #[must_use]
    pub fn new(remote: Arc<dyn RemoteCollection>, clock: Arc<dyn Clock>, user_id: UserId) -> Self {
        Self {
            remote,
            clock,
            user_id,
            notification_ttl: DEFAULT_TTL,
        }
    }

    /// Overrides the notification TTL
    #[must_use]
    pub const fn with_notification_ttl(mut self, ttl: Duration) -> Self {
        self.notification_ttl = ttl;
        self
    }
}

/// Reducer for the to-do list
#[derive(Clone, Debug, Default)]
pub struct TodoReducer;

impl TodoReducer {
    /// Creates a new `TodoReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Records `error`, shows its message and (re)starts the countdown
    fn raise(state: &mut TodoState, env: &TodoEnvironment, error: TodoError) -> Effect<TodoAction> {
        let generation = state.notification.raise(error.to_string(), env.clock.now());
        state.last_error = Some(error);
        notification::expiry_timer(env.notification_ttl, generation, |generation| {
            TodoAction::NotificationExpired { generation }
        })
    }

    fn dismiss(state: &mut TodoState) -> Effect<TodoAction> {
        state.notification.dismiss();
        notification::cancel_timer()
    }

    /// Refuses a command without touching state
    fn reject(operation: Operation, request: RequestId, error: TodoError) -> Effects {
        tracing::warn!(?operation, %request, %error, "Rejected command");
        smallvec![Effect::send(TodoAction::Rejected {
            operation,
            request,
            error,
        })]
    }

    fn validate_title(title: &str) -> Result<&str, TodoError> {
        let trimmed = title.trim();
        if trimmed.is_empty() {
            return Err(TodoError::Validation);
        }
        Ok(trimmed)
    }

    fn validate_remove(state: &TodoState, id: ItemId) -> Result<(), TodoError> {
        if !state.contains(id) {
            return Err(TodoError::NotFound(id));
        }
        if state.is_pending(id) {
            return Err(TodoError::OperationPending(id));
        }
        Ok(())
    }

    fn set_lifecycle(state: &mut TodoState, ids: &[ItemId], lifecycle: Lifecycle) {
        for item in state.items.iter_mut().filter(|item| ids.contains(&item.id)) {
            item.lifecycle = lifecycle;
        }
    }

    fn load(state: &mut TodoState, env: &TodoEnvironment, request: RequestId) -> Effects {
        state.loading = true;
        let dismiss = Self::dismiss(state);

        let remote = Arc::clone(&env.remote);
        let user = env.user_id;
        tracing::debug!(%user, "Loading todos");

        smallvec![
            dismiss,
            Effect::future(async move {
                Some(match remote.list(user).await {
                    Ok(items) => TodoAction::TodosLoaded { items, request },
                    Err(error) => TodoAction::LoadFailed { error, request },
                })
            }),
        ]
    }

    fn add(
        state: &mut TodoState,
        env: &TodoEnvironment,
        title: String,
        request: RequestId,
    ) -> Effects {
        let trimmed = match Self::validate_title(&title) {
            Ok(trimmed) => trimmed.to_string(),
            Err(error) => {
                let timer = Self::raise(state, env, error.clone());
                let mut effects = Self::reject(Operation::Add, request, error);
                effects.push(timer);
                return effects;
            },
        };

        if state.submitting {
            return Self::reject(Operation::Add, request, TodoError::AddInFlight);
        }

        state.submitting = true;
        state.draft.clear();
        state.placeholder = Some(Item::placeholder(env.user_id, title.clone()));

        let remote = Arc::clone(&env.remote);
        let draft = NewItem::new(env.user_id, trimmed);
        tracing::debug!(title = %draft.title, "Adding todo");

        smallvec![Effect::future(async move {
            Some(match remote.create(draft).await {
                Ok(item) => TodoAction::TodoAdded { item, request },
                Err(error) => TodoAction::AddFailed {
                    title,
                    error,
                    request,
                },
            })
        })]
    }

    fn remove(
        state: &mut TodoState,
        env: &TodoEnvironment,
        id: ItemId,
        request: RequestId,
    ) -> Effects {
        if let Err(error) = Self::validate_remove(state, id) {
            return Self::reject(Operation::Remove(id), request, error);
        }

        Self::set_lifecycle(state, &[id], Lifecycle::Deleting);
        state.pending.insert(id);

        let remote = Arc::clone(&env.remote);
        tracing::debug!(%id, "Deleting todo");

        smallvec![Effect::future(async move {
            Some(match remote.delete(id).await {
                Ok(()) => TodoAction::TodoRemoved { id, request },
                Err(error) => TodoAction::RemoveFailed { id, error, request },
            })
        })]
    }

    fn remove_completed(state: &mut TodoState, env: &TodoEnvironment, request: RequestId) -> Effects {
        if state.clearing_completed {
            return Self::reject(Operation::RemoveCompleted, request, TodoError::BulkInFlight);
        }

        // Items with a single delete in flight resolve on their own.
        let ids: Vec<ItemId> = state
            .items
            .iter()
            .filter(|item| item.completed && !state.pending.contains(item.id))
            .map(|item| item.id)
            .collect();

        if ids.is_empty() {
            return smallvec![Effect::send(TodoAction::CompletedRemoved { ids, request })];
        }

        state.clearing_completed = true;
        state.pending.add_many(ids.iter().copied());
        Self::set_lifecycle(state, &ids, Lifecycle::Deleting);

        let remote = Arc::clone(&env.remote);
        tracing::debug!(count = ids.len(), "Deleting completed todos");

        smallvec![Effect::future(async move {
            let results = join_all(ids.iter().map(|&id| remote.delete(id))).await;
            let failed: Vec<ItemId> = ids
                .iter()
                .zip(results)
                .filter_map(|(&id, result)| {
                    result.err().map(|error: RemoteError| {
                        tracing::warn!(%id, %error, "Bulk delete failed for todo");
                        id
                    })
                })
                .collect();

            Some(if failed.is_empty() {
                TodoAction::CompletedRemoved { ids, request }
            } else {
                TodoAction::RemoveCompletedFailed {
                    ids,
                    failed,
                    request,
                }
            })
        })]
    }
}

impl Reducer for TodoReducer {
    type State = TodoState;
    type Action = TodoAction;
    type Environment = TodoEnvironment;

    #[allow(clippy::too_many_lines)] // One arm per action keeps transitions in one place
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Commands ==========
            TodoAction::Load { request } => Self::load(state, env, request),

            TodoAction::SetDraft { text } => {
                state.draft = text;
                SmallVec::new()
            },

            TodoAction::AddTodo { title, request } => Self::add(state, env, title, request),

            TodoAction::ToggleTodo { id, request } => {
                let Some(item) = state.get_mut(id) else {
                    return Self::reject(Operation::Toggle(id), request, TodoError::NotFound(id));
                };
                item.completed = !item.completed;
                let completed = item.completed;
                smallvec![Effect::send(TodoAction::TodoToggled {
                    id,
                    completed,
                    request,
                })]
            },

            TodoAction::ToggleAll => {
                let completed = !state.all_completed();
                for item in &mut state.items {
                    item.completed = completed;
                }
                SmallVec::new()
            },

            TodoAction::RemoveTodo { id, request } => Self::remove(state, env, id, request),

            TodoAction::RemoveCompleted { request } => Self::remove_completed(state, env, request),

            TodoAction::SetFilter { filter } => {
                state.filter = filter;
                SmallVec::new()
            },

            TodoAction::DismissNotification => smallvec![Self::dismiss(state)],

            // ========== Results ==========
            TodoAction::TodosLoaded { mut items, .. } => {
                tracing::debug!(count = items.len(), "Todos loaded");
                for item in &mut items {
                    if state.pending.contains(item.id) {
                        item.lifecycle = Lifecycle::Deleting;
                    }
                }
                state.items = items;
                state.loading = false;
                SmallVec::new()
            },

            TodoAction::LoadFailed { error, .. } => {
                state.items.clear();
                state.loading = false;
                smallvec![Self::raise(state, env, TodoError::Load(error))]
            },

            TodoAction::TodoAdded { item, .. } => {
                tracing::debug!(id = %item.id, "Todo added");
                state.placeholder = None;
                state.submitting = false;
                if !state.contains(item.id) {
                    state.items.push(item);
                }
                smallvec![Self::dismiss(state)]
            },

            TodoAction::AddFailed { title, error, .. } => {
                state.placeholder = None;
                state.submitting = false;
                state.draft = title;
                smallvec![Self::raise(state, env, TodoError::Add(error))]
            },

            TodoAction::TodoRemoved { id, .. } => {
                tracing::debug!(%id, "Todo removed");
                state.items.retain(|item| item.id != id);
                state.pending.remove_one(id);
                SmallVec::new()
            },

            TodoAction::RemoveFailed { id, error, .. } => {
                state.pending.remove_one(id);
                Self::set_lifecycle(state, &[id], Lifecycle::Idle);
                smallvec![Self::raise(state, env, TodoError::Delete { id, source: error })]
            },

            TodoAction::CompletedRemoved { ids, .. } => {
                if !ids.is_empty() {
                    tracing::debug!(count = ids.len(), "Completed todos removed");
                    state.items.retain(|item| !ids.contains(&item.id));
                    state.pending.remove_many(&ids);
                    state.clearing_completed = false;
                }
                SmallVec::new()
            },

            TodoAction::RemoveCompletedFailed { ids, failed, .. } => {
                state.pending.remove_many(&ids);
                Self::set_lifecycle(state, &ids, Lifecycle::Idle);
                state.clearing_completed = false;
                smallvec![Self::raise(state, env, TodoError::BulkDelete { failed })]
            },

            TodoAction::NotificationExpired { generation } => {
                if state.notification.expire(generation) {
                    tracing::trace!(generation, "Notification expired");
                }
                SmallVec::new()
            },

            // Observed by callers; state was already updated or left untouched.
            TodoAction::TodoToggled { .. } | TodoAction::Rejected { .. } => SmallVec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::filter::Filter;
    use crate::notification::NOTIFICATION_TIMER;
    use crate::remote::InMemoryCollection;
    use todomvc_testing::{ReducerTest, assertions, test_clock};

    fn env() -> TodoEnvironment {
        TodoEnvironment::new(
            Arc::new(InMemoryCollection::new()),
            Arc::new(test_clock()),
            UserId::new(42),
        )
    }

    fn item(id: u64, title: &str, completed: bool) -> Item {
        let mut item = Item::new(ItemId::new(id), UserId::new(42), title.to_string());
        item.completed = completed;
        item
    }

    fn remote_error() -> RemoteError {
        RemoteError::Status {
            status: 500,
            body: "down".to_string(),
        }
    }

    fn state_with(items: Vec<Item>) -> TodoState {
        TodoState::with_items(items)
    }

    const REQ: RequestId = RequestId::new(1);

    fn remove(id: u64) -> TodoAction {
        TodoAction::RemoveTodo {
            id: ItemId::new(id),
            request: REQ,
        }
    }

    #[test]
    fn test_add_empty_title_is_rejected() {
        ReducerTest::new(TodoReducer::new())
            .with_env(env())
            .given_state(state_with(vec![item(1, "a", false)]))
            .when_action(TodoAction::AddTodo {
                title: "   ".to_string(),
                request: REQ,
            })
            .then_state(|state| {
                assert_eq!(state.items.len(), 1);
                assert!(state.placeholder.is_none());
                assert!(!state.submitting);
                assert_eq!(state.last_error, Some(TodoError::Validation));
                assert_eq!(state.notification.message(), Some("Title should not be empty"));
            })
            .then_effects(|effects| {
                assertions::assert_has_cancellable(effects, NOTIFICATION_TIMER);
            })
            .run();
    }

    #[test]
    fn test_add_shows_placeholder_and_calls_remote() {
        ReducerTest::new(TodoReducer::new())
            .with_env(env())
            .given_state(TodoState {
                draft: "  milk ".to_string(),
                ..TodoState::new()
            })
            .when_action(TodoAction::AddTodo {
                title: "  milk ".to_string(),
                request: REQ,
            })
            .then_state(|state| {
                let placeholder = state.placeholder.as_ref().unwrap();
                assert!(placeholder.id.is_placeholder());
                assert_eq!(placeholder.title, "  milk ");
                assert!(!placeholder.completed);
                assert!(state.submitting);
                assert!(state.draft.is_empty());
                assert!(state.items.is_empty());
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }

    #[test]
    fn test_second_add_while_submitting_is_rejected() {
        ReducerTest::new(TodoReducer::new())
            .with_env(env())
            .given_state(TodoState::new())
            .when_action(TodoAction::AddTodo {
                title: "first".to_string(),
                request: REQ,
            })
            .when_action(TodoAction::AddTodo {
                title: "second".to_string(),
                request: RequestId::new(2),
            })
            .then_state(|state| {
                assert_eq!(state.placeholder.as_ref().unwrap().title, "first");
                assert!(state.last_error.is_none());
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
            })
            .run();
    }

    #[test]
    fn test_todo_added_replaces_placeholder() {
        ReducerTest::new(TodoReducer::new())
            .with_env(env())
            .given_state(state_with(vec![item(1, "a", false)]))
            .when_action(TodoAction::AddTodo {
                title: "b".to_string(),
                request: REQ,
            })
            .when_action(TodoAction::TodoAdded {
                item: item(9, "b", false),
                request: REQ,
            })
            .then_state(|state| {
                assert!(state.placeholder.is_none());
                assert!(!state.submitting);
                let ids: Vec<_> = state.items.iter().map(|i| i.id.get()).collect();
                assert_eq!(ids, vec![1, 9]);
            })
            .then_effects(|effects| {
                assertions::assert_has_cancel(effects, NOTIFICATION_TIMER);
            })
            .run();
    }

    #[test]
    fn test_todo_added_after_reload_does_not_duplicate() {
        ReducerTest::new(TodoReducer::new())
            .with_env(env())
            .given_state(state_with(vec![item(1, "a", false)]))
            .when_action(TodoAction::AddTodo {
                title: "b".to_string(),
                request: REQ,
            })
            .when_action(TodoAction::TodosLoaded {
                items: vec![item(1, "a", false), item(9, "b", false)],
                request: RequestId::new(2),
            })
            .when_action(TodoAction::TodoAdded {
                item: item(9, "b", false),
                request: REQ,
            })
            .then_state(|state| {
                assert!(state.placeholder.is_none());
                assert!(!state.submitting);
                let ids: Vec<_> = state.items.iter().map(|i| i.id.get()).collect();
                assert_eq!(ids, vec![1, 9]);
            })
            .run();
    }

    #[test]
    fn test_add_failure_restores_draft() {
        ReducerTest::new(TodoReducer::new())
            .with_env(env())
            .given_state(TodoState::new())
            .when_action(TodoAction::AddTodo {
                title: " bread".to_string(),
                request: REQ,
            })
            .when_action(TodoAction::AddFailed {
                title: " bread".to_string(),
                error: remote_error(),
                request: REQ,
            })
            .then_state(|state| {
                assert!(state.placeholder.is_none());
                assert!(state.items.is_empty());
                assert!(!state.submitting);
                assert_eq!(state.draft, " bread");
                assert_eq!(state.notification.message(), Some("Unable to add a todo"));
                assert!(matches!(state.last_error, Some(TodoError::Add(_))));
            })
            .then_effects(|effects| {
                assertions::assert_has_delay(effects, DEFAULT_TTL);
            })
            .run();
    }

    #[test]
    fn test_toggle_all_completes_everything_locally() {
        ReducerTest::new(TodoReducer::new())
            .with_env(env())
            .given_state(state_with(vec![item(1, "a", false)]))
            .when_action(TodoAction::ToggleAll)
            .then_state(|state| {
                assert!(state.items[0].completed);
                assert!(state.all_completed());
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_toggle_all_uncompletes_when_all_done() {
        ReducerTest::new(TodoReducer::new())
            .with_env(env())
            .given_state(state_with(vec![item(1, "a", true), item(2, "b", true)]))
            .when_action(TodoAction::ToggleAll)
            .then_state(|state| {
                assert!(state.items.iter().all(|i| !i.completed));
            })
            .run();
    }

    #[test]
    fn test_toggle_flips_one_item() {
        ReducerTest::new(TodoReducer::new())
            .with_env(env())
            .given_state(state_with(vec![item(1, "a", false), item(2, "b", false)]))
            .when_action(TodoAction::ToggleTodo {
                id: ItemId::new(2),
                request: REQ,
            })
            .then_state(|state| {
                assert!(!state.items[0].completed);
                assert!(state.items[1].completed);
                assert!(state.pending.is_empty());
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }

    #[test]
    fn test_toggle_unknown_id_is_rejected_without_change() {
        ReducerTest::new(TodoReducer::new())
            .with_env(env())
            .given_state(state_with(vec![item(1, "a", false)]))
            .when_action(TodoAction::ToggleTodo {
                id: ItemId::new(5),
                request: REQ,
            })
            .then_state(|state| {
                assert!(!state.items[0].completed);
                assert!(state.last_error.is_none());
                assert!(!state.notification.is_visible());
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
            })
            .run();
    }

    #[test]
    fn test_toggle_after_delete_commits_is_rejected() {
        ReducerTest::new(TodoReducer::new())
            .with_env(env())
            .given_state(state_with(vec![item(1, "a", false)]))
            .when_action(remove(1))
            .when_action(TodoAction::TodoRemoved {
                id: ItemId::new(1),
                request: REQ,
            })
            .when_action(TodoAction::ToggleTodo {
                id: ItemId::new(1),
                request: RequestId::new(2),
            })
            .then_state(|state| {
                assert!(state.items.is_empty());
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
            })
            .run();
    }

    #[test]
    fn test_remove_marks_item_deleting() {
        ReducerTest::new(TodoReducer::new())
            .with_env(env())
            .given_state(state_with(vec![item(1, "a", false)]))
            .when_action(remove(1))
            .then_state(|state| {
                assert!(state.items[0].is_deleting());
                assert!(state.is_pending(ItemId::new(1)));
            })
            .then_effects(assertions::assert_has_future_effect)
            .run();
    }

    #[test]
    fn test_duplicate_remove_leaves_state_alone() {
        ReducerTest::new(TodoReducer::new())
            .with_env(env())
            .given_state(state_with(vec![item(1, "a", false)]))
            .when_action(remove(1))
            .when_action(remove(1))
            .then_state(|state| {
                assert_eq!(state.pending.len(), 1);
                assert!(state.items[0].is_deleting());
                assert!(!state.notification.is_visible());
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
            })
            .run();
    }

    #[test]
    fn test_remove_failure_rolls_back() {
        ReducerTest::new(TodoReducer::new())
            .with_env(env())
            .given_state(state_with(vec![item(1, "a", false)]))
            .when_action(remove(1))
            .when_action(TodoAction::RemoveFailed {
                id: ItemId::new(1),
                error: remote_error(),
                request: REQ,
            })
            .then_state(|state| {
                assert_eq!(state.items.len(), 1);
                assert_eq!(state.items[0].lifecycle, Lifecycle::Idle);
                assert!(!state.is_pending(ItemId::new(1)));
                assert_eq!(state.notification.message(), Some("Unable to delete a todo"));
            })
            .run();
    }

    #[test]
    fn test_remove_success_drops_item() {
        ReducerTest::new(TodoReducer::new())
            .with_env(env())
            .given_state(state_with(vec![item(1, "a", false), item(2, "b", false)]))
            .when_action(remove(1))
            .when_action(TodoAction::TodoRemoved {
                id: ItemId::new(1),
                request: REQ,
            })
            .then_state(|state| {
                assert_eq!(state.items.len(), 1);
                assert_eq!(state.items[0].id, ItemId::new(2));
                assert!(state.pending.is_empty());
            })
            .run();
    }

    #[test]
    fn test_remove_completed_skips_items_already_pending() {
        ReducerTest::new(TodoReducer::new())
            .with_env(env())
            .given_state(state_with(vec![
                item(1, "a", true),
                item(2, "b", false),
                item(3, "c", true),
            ]))
            .when_action(remove(3))
            .when_action(TodoAction::RemoveCompleted { request: REQ })
            .then_state(|state| {
                assert!(state.clearing_completed);
                assert!(state.items[0].is_deleting());
                assert!(!state.items[1].is_deleting());
                assert_eq!(state.pending.len(), 2);
            })
            .then_effects(assertions::assert_has_future_effect)
            .run();
    }

    #[test]
    fn test_remove_completed_with_nothing_completed() {
        ReducerTest::new(TodoReducer::new())
            .with_env(env())
            .given_state(state_with(vec![item(1, "a", false)]))
            .when_action(TodoAction::RemoveCompleted { request: REQ })
            .then_state(|state| {
                assert!(!state.clearing_completed);
                assert!(state.pending.is_empty());
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
            })
            .run();
    }

    #[test]
    fn test_bulk_failure_keeps_every_completed_item() {
        ReducerTest::new(TodoReducer::new())
            .with_env(env())
            .given_state(state_with(vec![item(1, "a", true), item(2, "b", true)]))
            .when_action(TodoAction::RemoveCompleted { request: REQ })
            .when_action(TodoAction::RemoveCompletedFailed {
                ids: vec![ItemId::new(1), ItemId::new(2)],
                failed: vec![ItemId::new(2)],
                request: REQ,
            })
            .then_state(|state| {
                assert_eq!(state.items.len(), 2);
                assert!(state.items.iter().all(|i| i.lifecycle == Lifecycle::Idle));
                assert!(state.pending.is_empty());
                assert!(!state.clearing_completed);
                assert_eq!(
                    state.notification.message(),
                    Some("Unable to delete completed todos")
                );
            })
            .run();
    }

    #[test]
    fn test_bulk_success_removes_batch() {
        ReducerTest::new(TodoReducer::new())
            .with_env(env())
            .given_state(state_with(vec![item(1, "a", true), item(2, "b", false)]))
            .when_action(TodoAction::RemoveCompleted { request: REQ })
            .when_action(TodoAction::CompletedRemoved {
                ids: vec![ItemId::new(1)],
                request: REQ,
            })
            .then_state(|state| {
                assert_eq!(state.items.len(), 1);
                assert_eq!(state.items[0].id, ItemId::new(2));
                assert!(state.pending.is_empty());
            })
            .run();
    }

    #[test]
    fn test_second_bulk_is_rejected() {
        ReducerTest::new(TodoReducer::new())
            .with_env(env())
            .given_state(state_with(vec![item(1, "a", true)]))
            .when_action(TodoAction::RemoveCompleted { request: REQ })
            .when_action(TodoAction::RemoveCompleted { request: REQ })
            .then_state(|state| {
                assert!(state.clearing_completed);
                assert_eq!(state.pending.len(), 1);
            })
            .run();
    }

    #[test]
    fn test_load_failure_empties_list() {
        ReducerTest::new(TodoReducer::new())
            .with_env(env())
            .given_state(state_with(vec![item(1, "a", false)]))
            .when_action(TodoAction::Load { request: REQ })
            .when_action(TodoAction::LoadFailed {
                error: remote_error(),
                request: REQ,
            })
            .then_state(|state| {
                assert!(state.items.is_empty());
                assert!(!state.loading);
                assert_eq!(state.notification.message(), Some("Unable to load todos"));
            })
            .run();
    }

    #[test]
    fn test_load_replaces_items_and_keeps_deleting_marks() {
        let mut state = state_with(vec![item(1, "a", false)]);
        state.pending.insert(ItemId::new(1));

        ReducerTest::new(TodoReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(TodoAction::TodosLoaded {
                items: vec![item(1, "a", false), item(2, "b", true)],
                request: REQ,
            })
            .then_state(|state| {
                assert_eq!(state.items.len(), 2);
                assert!(state.items[0].is_deleting());
                assert!(!state.items[1].is_deleting());
            })
            .run();
    }

    #[test]
    fn test_stale_expiry_does_not_clear_new_message() {
        ReducerTest::new(TodoReducer::new())
            .with_env(env())
            .given_state(TodoState::new())
            .when_action(TodoAction::LoadFailed {
                error: remote_error(),
                request: REQ,
            })
            .when_action(TodoAction::AddFailed {
                title: "x".to_string(),
                error: remote_error(),
                request: REQ,
            })
            .when_action(TodoAction::NotificationExpired { generation: 1 })
            .then_state(|state| {
                assert_eq!(state.notification.message(), Some("Unable to add a todo"));
            })
            .run();
    }

    #[test]
    fn test_dismiss_cancels_timer() {
        ReducerTest::new(TodoReducer::new())
            .with_env(env())
            .given_state(TodoState::new())
            .when_action(TodoAction::LoadFailed {
                error: remote_error(),
                request: REQ,
            })
            .when_action(TodoAction::DismissNotification)
            .then_state(|state| {
                assert!(!state.notification.is_visible());
            })
            .then_effects(|effects| {
                assertions::assert_has_cancel(effects, NOTIFICATION_TIMER);
            })
            .run();
    }

    #[test]
    fn test_filter_and_draft_are_local() {
        ReducerTest::new(TodoReducer::new())
            .with_env(env())
            .given_state(TodoState::new())
            .when_action(TodoAction::SetFilter {
                filter: Filter::Completed,
            })
            .when_action(TodoAction::SetDraft {
                text: "eggs".to_string(),
            })
            .then_state(|state| {
                assert_eq!(state.filter, Filter::Completed);
                assert_eq!(state.draft, "eggs");
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }
}
