//! Integration tests for the counter running in a Store
//!
//! Each step states the action and the exact state change it must produce.

use composable_core::dependencies::ClockKey;
use composable_core::Dependencies;
use composable_testing::{TestClock, TestStore};
use counter::{
    CounterAction, CounterReducer, CounterState, FactError, NumberFactClient, NumberFactKey, TIMER_INTERVAL,
};
use futures::future::BoxFuture;
use std::sync::Arc;

struct Unreachable;

impl NumberFactClient for Unreachable {
    fn fetch(&self, _number: i64) -> BoxFuture<'static, Result<String, FactError>> {
        Box::pin(async { Err(FactError::Unavailable("offline".to_string())) })
    }
}

fn store(deps: Dependencies) -> TestStore<CounterState, CounterAction, Dependencies, CounterReducer> {
    TestStore::new(CounterState::default(), CounterReducer, deps)
}

#[tokio::test]
async fn test_basics() {
    let mut store = store(Dependencies::test());

    store.send(CounterAction::IncrementButtonTapped, |s| s.count = 1).await;
    store.send(CounterAction::DecrementButtonTapped, |s| s.count = 0).await;

    store.finish().await;
}

#[tokio::test]
async fn test_number_fact() {
    let mut store = store(Dependencies::test());

    store.send(CounterAction::FactButtonTapped, |s| s.is_loading = true).await;
    store
        .receive_action(CounterAction::FactResponse(Ok("0".to_string())), |s| {
            s.is_loading = false;
            s.fact = Some("0".to_string());
        })
        .await;

    store.finish().await;
}

#[tokio::test]
async fn test_number_fact_failure() {
    let deps = Dependencies::test().with(|d| d.set::<NumberFactKey>(Arc::new(Unreachable)));
    let mut store = store(deps);

    store.send(CounterAction::FactButtonTapped, |s| s.is_loading = true).await;
    store
        .receive(CounterAction::is_response, |s| {
            s.is_loading = false;
            s.error_message = Some("number fact service unavailable: offline".to_string());
        })
        .await;

    store.finish().await;
}

#[tokio::test]
async fn test_timer() {
    let clock = TestClock::new();
    let deps = Dependencies::test().with(|d| d.set::<ClockKey>(Arc::new(clock.clone())));
    let mut store = store(deps);

    store
        .send(CounterAction::TimerToggleButtonTapped, |s| s.is_timer_running = true)
        .await;

    clock.advance(TIMER_INTERVAL).await;
    store.receive_action(CounterAction::TimerTick, |s| s.count = 1).await;

    clock.advance(TIMER_INTERVAL).await;
    store.receive_action(CounterAction::TimerTick, |s| s.count = 2).await;

    store
        .send(CounterAction::TimerToggleButtonTapped, |s| s.is_timer_running = false)
        .await;

    // Nothing ticks once the timer is cancelled
    clock.advance(TIMER_INTERVAL * 5).await;
    store.finish().await;
}

#[tokio::test]
async fn test_tick_clears_loaded_fact() {
    let clock = TestClock::new();
    let deps = Dependencies::test().with(|d| d.set::<ClockKey>(Arc::new(clock.clone())));
    let mut store = store(deps);

    store.send(CounterAction::FactButtonTapped, |s| s.is_loading = true).await;
    store
        .receive(CounterAction::is_response, |s| {
            s.is_loading = false;
            s.fact = Some("0".to_string());
        })
        .await;

    store
        .send(CounterAction::TimerToggleButtonTapped, |s| s.is_timer_running = true)
        .await;
    clock.advance(TIMER_INTERVAL).await;
    store
        .receive_action(CounterAction::TimerTick, |s| {
            s.count = 1;
            s.fact = None;
        })
        .await;

    store
        .send(CounterAction::TimerToggleButtonTapped, |s| s.is_timer_running = false)
        .await;
    store.finish().await;
}
