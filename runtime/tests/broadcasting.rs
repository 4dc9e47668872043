//! Integration tests for Store action broadcasting
//!
//! Observers receive the actions produced by effects, after the store has
//! applied them. A small toast-style reducer exercises delayed and
//! cancellable effects.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use bazaar_core::{
    cancellable, delay, effect::Effect, reducer::Reducer, smallvec, SmallVec,
};
use bazaar_runtime::{Store, StoreConfig};
use std::time::Duration;
use tokio::sync::broadcast::error::TryRecvError;

// ============================================================================
// Test Fixtures
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum ToastAction {
    Show { message: String },
    Hide,
    Ping,
    Pong { value: u32 },
}

#[derive(Debug, Clone, Default)]
struct ToastState {
    message: Option<String>,
    pongs: u32,
}

#[derive(Clone)]
struct ToastEnvironment;

#[derive(Clone)]
struct ToastReducer;

impl Reducer for ToastReducer {
    type State = ToastState;
    type Action = ToastAction;
    type Environment = ToastEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            ToastAction::Show { message } => {
                state.message = Some(message);
                smallvec![cancellable! {
                    id: "toast.hide",
                    effect: delay! {
                        duration: Duration::from_secs(3),
                        action: ToastAction::Hide
                    }
                }]
            },
            ToastAction::Hide => {
                state.message = None;
                SmallVec::new()
            },
            ToastAction::Ping => {
                state.pongs += 1;
                let value = state.pongs;
                smallvec![Effect::Future(Box::pin(async move {
                    Some(ToastAction::Pong { value })
                }))]
            },
            ToastAction::Pong { .. } => SmallVec::new(),
        }
    }
}

fn store() -> Store<ToastState, ToastAction, ToastEnvironment, ToastReducer> {
    Store::new(ToastState::default(), ToastReducer, ToastEnvironment)
}

fn drain(rx: &mut tokio::sync::broadcast::Receiver<ToastAction>) -> Vec<ToastAction> {
    let mut actions = Vec::new();
    while let Ok(action) = rx.try_recv() {
        actions.push(action);
    }
    actions
}

// ============================================================================
// Tests
// ============================================================================

/// The delayed action is observed after the reducer applied it
#[tokio::test(start_paused = true)]
async fn test_delayed_action_is_broadcast_after_apply() {
    let store = store();
    let mut rx = store.subscribe_actions();

    store
        .send(ToastAction::Show {
            message: "saved".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(rx.recv().await.unwrap(), ToastAction::Hide);
    assert_eq!(store.state(|s| s.message.clone()).await, None);
}

/// Actions sent directly are not broadcast
#[tokio::test]
async fn test_direct_actions_are_not_broadcast() {
    let store = store();
    let mut rx = store.subscribe_actions();

    store.send(ToastAction::Hide).await.unwrap();

    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
}

/// A newer toast keeps its full display time
#[tokio::test(start_paused = true)]
async fn test_superseded_timer_does_not_hide_newer_toast() {
    let store = store();
    let mut rx = store.subscribe_actions();

    store
        .send(ToastAction::Show {
            message: "first".to_string(),
        })
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;

    store
        .send(ToastAction::Show {
            message: "second".to_string(),
        })
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert_eq!(
        store.state(|s| s.message.clone()).await.as_deref(),
        Some("second")
    );

    let start = tokio::time::Instant::now();
    assert_eq!(rx.recv().await.unwrap(), ToastAction::Hide);
    assert!(start.elapsed() < Duration::from_secs(2));
    assert!(drain(&mut rx).is_empty(), "only one hide may fire");
}

/// Multiple subscribers receive every effect-produced action
#[tokio::test]
async fn test_multiple_independent_subscribers() {
    let store = store();

    let mut rx1 = store.subscribe_actions();
    let mut rx2 = store.subscribe_actions();

    let mut first = store.send(ToastAction::Ping).await.unwrap();
    let mut second = store.send(ToastAction::Ping).await.unwrap();
    first.wait_with_timeout(Duration::from_secs(1)).await.unwrap();
    second.wait_with_timeout(Duration::from_secs(1)).await.unwrap();

    for rx in [&mut rx1, &mut rx2] {
        let mut values: Vec<u32> = drain(rx)
            .into_iter()
            .filter_map(|action| match action {
                ToastAction::Pong { value } => Some(value),
                _ => None,
            })
            .collect();
        values.sort_unstable();
        assert_eq!(values, vec![1, 2]);
    }
}

/// Slow subscribers lag instead of blocking the store
#[tokio::test]
async fn test_lagging_subscriber() {
    let store = Store::with_config(
        ToastState::default(),
        ToastReducer,
        ToastEnvironment,
        &StoreConfig::default().with_broadcast_capacity(4),
    );

    let mut rx = store.subscribe_actions();

    let mut handles = Vec::new();
    for _ in 0..20 {
        handles.push(store.send(ToastAction::Ping).await.unwrap());
    }
    for mut handle in handles {
        handle.wait_with_timeout(Duration::from_secs(1)).await.unwrap();
    }

    let mut received = 0;
    let mut lagged = false;
    loop {
        match rx.try_recv() {
            Ok(_) => received += 1,
            Err(TryRecvError::Lagged(_)) => lagged = true,
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }

    assert!(lagged, "Expected subscriber to lag");
    assert!(received > 0, "Should receive at least some actions");
    assert!(received < 20, "Should not receive all actions if lagged");
    assert_eq!(store.state(|s| s.pongs).await, 20);
}
