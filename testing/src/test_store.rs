//! Exhaustive Store harness.
//!
//! [`TestStore`] wraps a real [`Store`] whose effect actions are held back in a
//! queue. Each step of a test names the action it sends or expects to receive and
//! the state change that action must produce; any difference fails the test. At the
//! end, [`TestStore::finish`] fails if effects are still running or actions were
//! never received.

#![allow(clippy::module_name_repetitions)] // TestStore is the natural name

use composable_core::reducer::Reducer;
use composable_runtime::{EffectHandle, EmittedAction, Store, StoreConfig};
use std::fmt::Debug;
use std::time::Duration;
use tokio::sync::mpsc;

/// How long [`TestStore::receive`] and [`TestStore::finish`] wait by default
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Store wrapper asserting every state change and every effect action
///
/// # Example
///
/// ```ignore
/// let mut store = TestStore::new(CounterState::default(), CounterReducer, Dependencies::test());
///
/// store.send(CounterAction::FactButtonTapped, |s| s.is_loading = true).await;
/// store
///     .receive(
///         |a| matches!(a, CounterAction::FactResponse(Ok(_))),
///         |s| {
///             s.is_loading = false;
///             s.fact = Some("0".to_string());
///         },
///     )
///     .await;
///
/// store.finish().await;
/// ```
pub struct TestStore<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    store: Store<S, A, E, R>,
    received: mpsc::UnboundedReceiver<EmittedAction<A>>,
    timeout: Duration,
}

impl<S, A, E, R> TestStore<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
    S: Clone + PartialEq + Debug + Send + Sync + 'static,
    A: Clone + Debug + Send + 'static,
    E: Send + Sync + 'static,
{
    /// Create a test store
    #[must_use]
    pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
        let (store, received) = Store::with_queued_feedback(
            initial_state,
            reducer,
            environment,
            StoreConfig::default().with_name("test_store"),
        );

        Self {
            store,
            received,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Change how long to wait for effect actions
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send an action and assert the resulting state
    ///
    /// `update` receives a copy of the state before the action and must turn it into
    /// the expected state after it.
    ///
    /// # Panics
    ///
    /// Panics if an effect action is waiting to be received, if the store rejects
    /// the action, or if the state differs from the expectation.
    #[allow(clippy::panic)] // Test assertion
    pub async fn send<F>(&mut self, action: A, update: F) -> EffectHandle
    where
        F: FnOnce(&mut S),
    {
        if let Some(pending) = self.next_live_action() {
            panic!(
                "Must handle received action {:?} before sending {action:?}",
                pending.action
            );
        }

        let mut expected = self.store.state(Clone::clone).await;
        update(&mut expected);

        let description = format!("{action:?}");
        let handle = match self.store.send(action).await {
            Ok(handle) => handle,
            Err(error) => panic!("Store rejected {description}: {error}"),
        };

        self.assert_state(&expected, &description).await;
        handle
    }

    /// Receive the next effect action, assert it, apply it and assert the state
    ///
    /// Actions from effects cancelled since they were emitted are skipped; the Store
    /// would have dropped them.
    ///
    /// # Panics
    ///
    /// Panics if no action arrives within the timeout, if the action does not match
    /// `matches`, or if the state differs from the expectation.
    #[allow(clippy::panic)] // Test assertion
    pub async fn receive<P, F>(&mut self, matches: P, update: F) -> A
    where
        P: FnOnce(&A) -> bool,
        F: FnOnce(&mut S),
    {
        let emitted = self.next_action().await;
        assert!(
            matches(&emitted.action),
            "Received unexpected action: {:?}",
            emitted.action
        );

        let mut expected = self.store.state(Clone::clone).await;
        update(&mut expected);

        let action = emitted.action.clone();
        let description = format!("{action:?}");
        if let Err(error) = self.store.send_emitted(emitted).await {
            panic!("Store rejected {description}: {error}");
        }

        self.assert_state(&expected, &description).await;
        action
    }

    /// Receive an action equal to `expected`
    ///
    /// # Panics
    ///
    /// As [`TestStore::receive`].
    pub async fn receive_action<F>(&mut self, expected: A, update: F) -> A
    where
        A: PartialEq,
        F: FnOnce(&mut S),
    {
        self.receive(|action| *action == expected, update).await
    }

    /// Apply every effect action already emitted, without asserting on them
    ///
    /// Returns how many were applied.
    pub async fn skip_received_actions(&mut self) -> usize {
        tokio::task::yield_now().await;

        let mut applied = 0;
        while let Some(emitted) = self.next_live_action() {
            tracing::debug!(action = ?emitted.action, "Skipping received action");
            if self.store.send_emitted(emitted).await.is_ok() {
                applied += 1;
            }
        }
        applied
    }

    /// Assert that the test left nothing behind
    ///
    /// Waits up to the timeout for running effects to finish, then fails if any are
    /// still running or an emitted action was never received. The store is shut
    /// down afterwards.
    ///
    /// # Panics
    ///
    /// Panics on running effects or unreceived actions.
    #[allow(clippy::panic)] // Test assertion
    pub async fn finish(mut self) {
        let deadline = tokio::time::Instant::now() + self.timeout;
        while self.store.pending_effects() > 0 && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        if let Some(pending) = self.next_live_action() {
            panic!("Unreceived action at finish: {:?}", pending.action);
        }

        let running = self.store.pending_effects();
        assert_eq!(
            running, 0,
            "{running} effect(s) still running at finish; cancel long-living effects before finishing"
        );

        let _ = self.store.shutdown(self.timeout).await;
    }

    /// Read current state via a closure
    pub async fn state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&S) -> T,
    {
        self.store.state(f).await
    }

    /// The underlying store
    #[must_use]
    pub const fn store(&self) -> &Store<S, A, E, R> {
        &self.store
    }

    /// Next queued action whose effect is still live, if one is already queued
    fn next_live_action(&mut self) -> Option<EmittedAction<A>> {
        while let Ok(emitted) = self.received.try_recv() {
            if emitted.is_cancelled() {
                tracing::trace!(action = ?emitted.action, "Skipping action from cancelled effect");
                continue;
            }
            return Some(emitted);
        }
        None
    }

    #[allow(clippy::panic)] // Test assertion
    async fn next_action(&mut self) -> EmittedAction<A> {
        let timeout = self.timeout;
        let received = tokio::time::timeout(timeout, async {
            loop {
                match self.received.recv().await {
                    Some(emitted) if emitted.is_cancelled() => {
                        tracing::trace!(action = ?emitted.action, "Skipping action from cancelled effect");
                    },
                    other => return other,
                }
            }
        })
        .await;

        match received {
            Ok(Some(emitted)) => emitted,
            Ok(None) => panic!("Effect action queue closed"),
            Err(_) => panic!("Expected to receive an action, but none arrived within {timeout:?}"),
        }
    }

    async fn assert_state(&self, expected: &S, action: &str) {
        let actual = self.store.state(Clone::clone).await;
        assert_eq!(&actual, expected, "State mismatch after {action}");
    }
}

impl<S, A, E, R> Debug for TestStore<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestStore")
            .field("store", &self.store)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
