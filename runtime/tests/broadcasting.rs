//! Integration tests for Store action broadcasting
//!
//! Covers the request/confirmation pattern the application facade is built
//! on: send a command, then wait for the result action an effect feeds back.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use futures::future::join_all;
use std::time::Duration;
use todomvc_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};
use todomvc_runtime::{Store, StoreConfig, StoreError};

// ============================================================================
// Test Fixtures
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum EchoAction {
    /// Issue a fake remote call
    Request { id: u64, fail: bool, delay_ms: u64 },
    /// Issue several calls at once
    RequestMany { ids: Vec<u64> },
    /// Remote call confirmed
    Confirmed { id: u64 },
    /// Remote call failed
    Failed { id: u64 },
    /// Never answered
    Ignore,
}

#[derive(Debug, Clone, Default)]
struct EchoState {
    in_flight: Vec<u64>,
    confirmed: Vec<u64>,
    failed: Vec<u64>,
}

#[derive(Clone)]
struct EchoReducer;

fn remote_call(id: u64, fail: bool, delay_ms: u64) -> Effect<EchoAction> {
    Effect::future(async move {
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        if fail {
            Some(EchoAction::Failed { id })
        } else {
            Some(EchoAction::Confirmed { id })
        }
    })
}

impl Reducer for EchoReducer {
    type State = EchoState;
    type Action = EchoAction;
    type Environment = ();

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            EchoAction::Request { id, fail, delay_ms } => {
                state.in_flight.push(id);
                smallvec![remote_call(id, fail, delay_ms)]
            },
            EchoAction::RequestMany { ids } => {
                state.in_flight.extend(&ids);
                let calls = ids.into_iter().map(|id| remote_call(id, false, 5)).collect();
                smallvec![Effect::merge(calls)]
            },
            EchoAction::Confirmed { id } => {
                state.in_flight.retain(|pending| *pending != id);
                state.confirmed.push(id);
                SmallVec::new()
            },
            EchoAction::Failed { id } => {
                state.in_flight.retain(|pending| *pending != id);
                state.failed.push(id);
                SmallVec::new()
            },
            EchoAction::Ignore => SmallVec::new(),
        }
    }
}

fn store() -> Store<EchoState, EchoAction, (), EchoReducer> {
    Store::new(EchoState::default(), EchoReducer, ())
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_send_and_wait_for_confirmation() {
    let store = store();

    let result = store
        .send_and_wait_for(
            EchoAction::Request { id: 1, fail: false, delay_ms: 0 },
            |action| matches!(action, EchoAction::Confirmed { id: 1 } | EchoAction::Failed { id: 1 }),
            Duration::from_secs(1),
        )
        .await
        .unwrap();

    assert_eq!(result, EchoAction::Confirmed { id: 1 });

    // The result is broadcast only after it has been reduced.
    let state = store.state(Clone::clone).await;
    assert!(state.in_flight.is_empty());
    assert_eq!(state.confirmed, vec![1]);
}

#[tokio::test]
async fn test_send_and_wait_for_failure_result() {
    let store = store();

    let result = store
        .send_and_wait_for(
            EchoAction::Request { id: 9, fail: true, delay_ms: 5 },
            |action| matches!(action, EchoAction::Confirmed { id: 9 } | EchoAction::Failed { id: 9 }),
            Duration::from_secs(1),
        )
        .await
        .unwrap();

    assert_eq!(result, EchoAction::Failed { id: 9 });
    assert_eq!(store.state(|s| s.failed.clone()).await, vec![9]);
}

#[tokio::test]
async fn test_send_and_wait_for_timeout() {
    let store = store();

    let result = store
        .send_and_wait_for(
            EchoAction::Ignore,
            |action| matches!(action, EchoAction::Confirmed { .. }),
            Duration::from_millis(30),
        )
        .await;

    assert!(matches!(result, Err(StoreError::Timeout)));
}

#[tokio::test]
async fn test_correlated_waiters_do_not_interfere() {
    let store = store();

    let slow = {
        let store = store.clone();
        tokio::spawn(async move {
            store
                .send_and_wait_for(
                    EchoAction::Request { id: 1, fail: false, delay_ms: 40 },
                    |action| matches!(action, EchoAction::Confirmed { id: 1 }),
                    Duration::from_secs(1),
                )
                .await
        })
    };
    let fast = store
        .send_and_wait_for(
            EchoAction::Request { id: 2, fail: false, delay_ms: 5 },
            |action| matches!(action, EchoAction::Confirmed { id: 2 }),
            Duration::from_secs(1),
        )
        .await
        .unwrap();

    assert_eq!(fast, EchoAction::Confirmed { id: 2 });
    assert_eq!(slow.await.unwrap().unwrap(), EchoAction::Confirmed { id: 1 });
}

#[tokio::test]
async fn test_subscribe_actions_sees_parallel_results() {
    let store = store();
    let mut rx = store.subscribe_actions();

    let mut handle = store.send(EchoAction::RequestMany { ids: vec![1, 2, 3] }).await.unwrap();
    handle.wait_with_timeout(Duration::from_secs(1)).await.unwrap();

    let mut seen = Vec::new();
    while let Ok(action) = rx.try_recv() {
        if let EchoAction::Confirmed { id } = action {
            seen.push(id);
        }
    }
    seen.sort_unstable();

    assert_eq!(seen, vec![1, 2, 3]);
    assert!(store.state(|s| s.in_flight.is_empty()).await);
}

#[tokio::test]
async fn test_direct_sends_are_not_broadcast() {
    let store = store();
    let mut rx = store.subscribe_actions();

    store.send(EchoAction::Confirmed { id: 5 }).await.unwrap();

    assert!(rx.try_recv().is_err());
    assert_eq!(store.state(|s| s.confirmed.clone()).await, vec![5]);
}

#[tokio::test]
async fn test_send_and_select_extracts_payload() {
    let store = store();

    let outcome: Result<u64, u64> = store
        .send_and_select(
            EchoAction::Request { id: 4, fail: true, delay_ms: 0 },
            |action| match action {
                EchoAction::Confirmed { id: 4 } => Some(Ok(4)),
                EchoAction::Failed { id: 4 } => Some(Err(4)),
                _ => None,
            },
            Duration::from_secs(1),
        )
        .await
        .unwrap();

    assert_eq!(outcome, Err(4));
}

#[tokio::test]
async fn test_waiter_survives_burst_larger_than_broadcast_capacity() {
    let store = Store::with_config(
        EchoState::default(),
        EchoReducer,
        (),
        StoreConfig::default().with_broadcast_capacity(1),
    );

    let last = store
        .send_and_wait_for(
            EchoAction::RequestMany { ids: (1..=50).collect() },
            |action| matches!(action, EchoAction::Confirmed { id: 50 }),
            Duration::from_secs(1),
        )
        .await
        .unwrap();

    assert_eq!(last, EchoAction::Confirmed { id: 50 });
}

#[tokio::test]
async fn test_many_concurrent_waiters_all_resolve() {
    let store = store();

    let waits = (1..=40).map(|id| {
        let store = store.clone();
        async move {
            store
                .send_and_wait_for(
                    EchoAction::Request { id, fail: false, delay_ms: 5 },
                    move |action| matches!(action, EchoAction::Confirmed { id: done } if *done == id),
                    Duration::from_secs(1),
                )
                .await
        }
    });
    let results = join_all(waits).await;

    assert!(results.iter().all(Result::is_ok));
    assert_eq!(store.state(|s| s.confirmed.len()).await, 40);
}
