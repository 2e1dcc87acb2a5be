//! Integration tests for presented child features running inside a Store
//!
//! Once the presented state is dismissed, nothing its effects emit may reach
//! the reducer again.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use composable_core::composition::Reduce;
use composable_core::presentation::if_let;
use composable_core::{smallvec, Effect, PresentationAction, PresentationState, Reducer, SmallVec};
use composable_runtime::Store;
use std::time::Duration;

// ============================================================================
// Test Fixtures
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
struct Poller {
    polls: u32,
}

#[derive(Debug, Clone, PartialEq)]
enum PollerAction {
    Start,
    Polled,
    Finished,
}

#[derive(Debug, Clone, Default)]
struct Screen {
    poller: PresentationState<Poller>,
    child_actions_seen: u32,
    finished: bool,
}

#[derive(Debug, Clone, PartialEq)]
enum ScreenAction {
    Open,
    Close,
    Poller(PresentationAction<PollerAction>),
}

fn poller() -> impl Reducer<State = Poller, Action = PollerAction, Environment = ()> + Send + Sync {
    Reduce::new(|state: &mut Poller, action: PollerAction, _env: &()| -> SmallVec<[Effect<PollerAction>; 4]> {
        match action {
            PollerAction::Start => smallvec![Effect::run(|send| async move {
                loop {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    send.send(PollerAction::Polled).await;
                }
            })],
            PollerAction::Polled => {
                state.polls += 1;
                if state.polls == 3 {
                    smallvec![Effect::send(PollerAction::Finished)]
                } else {
                    smallvec![Effect::None]
                }
            },
            PollerAction::Finished => smallvec![Effect::None],
        }
    })
}

fn screen() -> impl Reducer<State = Screen, Action = ScreenAction, Environment = ()> + Send + Sync {
    let parent = Reduce::new(|state: &mut Screen, action: ScreenAction, _env: &()| -> SmallVec<[Effect<ScreenAction>; 4]> {
        match action {
            ScreenAction::Open => {
                state.poller.present(Poller::default());
                smallvec![Effect::send(ScreenAction::Poller(PresentationAction::Presented(
                    PollerAction::Start
                )))]
            },
            ScreenAction::Close => {
                state.poller.dismiss();
                smallvec![Effect::None]
            },
            ScreenAction::Poller(PresentationAction::Presented(action)) => {
                state.child_actions_seen += 1;
                if action == PollerAction::Finished {
                    state.finished = true;
                }
                smallvec![Effect::None]
            },
            ScreenAction::Poller(PresentationAction::Dismiss) => smallvec![Effect::None],
        }
    });

    if_let(
        parent,
        poller(),
        |state: &mut Screen| &mut state.poller,
        |action| match action {
            ScreenAction::Poller(action) => Some(action),
            _ => None,
        },
        ScreenAction::Poller,
    )
    .dismiss_when(|action| matches!(action, PollerAction::Finished))
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn dismissing_stops_child_effects() {
    let store = Store::new(Screen::default(), screen(), ());

    let _ = store.send(ScreenAction::Open).await.unwrap();
    tokio::time::sleep(Duration::from_millis(25)).await;
    assert_eq!(store.state(|s| s.poller.as_ref().map(|p| p.polls)).await, Some(2));

    let _ = store
        .send(ScreenAction::Poller(PresentationAction::Dismiss))
        .await
        .unwrap();
    let seen = store.state(|s| s.child_actions_seen).await;

    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(!store.state(|s| s.poller.is_presented()).await);
    assert_eq!(store.state(|s| s.child_actions_seen).await, seen);
    assert_eq!(store.registered_cancellations(), 0);
}

#[tokio::test(start_paused = true)]
async fn parent_clearing_state_stops_child_effects() {
    let store = Store::new(Screen::default(), screen(), ());

    let _ = store.send(ScreenAction::Open).await.unwrap();
    tokio::time::sleep(Duration::from_millis(15)).await;

    let _ = store.send(ScreenAction::Close).await.unwrap();
    let seen = store.state(|s| s.child_actions_seen).await;

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(store.state(|s| s.child_actions_seen).await, seen);
    assert_eq!(store.pending_effects(), 0);
}

#[tokio::test(start_paused = true)]
async fn delegate_dismisses_after_parent_observes_it() {
    let store = Store::new(Screen::default(), screen(), ());

    let _ = store.send(ScreenAction::Open).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(store.state(|s| s.finished).await);
    assert!(!store.state(|s| s.poller.is_presented()).await);
    assert_eq!(store.registered_cancellations(), 0);
}

#[tokio::test(start_paused = true)]
async fn reopening_starts_a_fresh_presentation() {
    let store = Store::new(Screen::default(), screen(), ());

    let _ = store.send(ScreenAction::Open).await.unwrap();
    let first = store.state(|s| s.poller.id()).await;
    tokio::time::sleep(Duration::from_millis(15)).await;

    let _ = store.send(ScreenAction::Open).await.unwrap();
    let second = store.state(|s| s.poller.id()).await;
    assert_ne!(first, second);

    tokio::time::sleep(Duration::from_millis(25)).await;
    // Only the new poller's ticks count towards the new state
    assert_eq!(store.state(|s| s.poller.as_ref().map(|p| p.polls)).await, Some(2));
}
