//! # Composable Runtime
//!
//! Runtime implementation for the composable reducer architecture.
//!
//! This crate provides the Store runtime that coordinates reducer execution
//! and effect handling.
//!
//! ## Core Components
//!
//! - **Store**: Holds state, serializes actions through the reducer, executes effects
//! - **Cancellation Registry**: Tracks in-flight effects by [`CancelId`]
//! - **Feedback Loop**: Actions emitted by effects re-enter the same serialized queue
//!
//! ## Example
//!
//! ```ignore
//! use composable_runtime::Store;
//!
//! let store = Store::new(CounterState::default(), CounterReducer, Dependencies::live());
//!
//! // Send an action
//! store.send(CounterAction::IncrementButtonTapped).await?;
//!
//! // Read state
//! let count = store.state(|s| s.count).await;
//! ```

use composable_core::{effect::Effect, reducer::Reducer, CancelId, Emitter};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

/// Cancellation registry keyed by [`CancelId`]
pub mod cancellation;

/// Metric descriptions and recorders for the Store
pub mod metrics;

pub use cancellation::{CancellationRegistry, Registration};

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    ///
    /// Reducers never fail and effects report failures as actions, so these only
    /// cover the Store's own lifecycle.
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        ///
        /// This error is returned when `send()` is called after shutdown initiated.
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out waiting for effects to complete
        ///
        /// Some effects were still running when the timeout elapsed.
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// Timeout waiting for terminal action
        ///
        /// Returned by `send_and_wait_for` when the timeout expires before
        /// a matching action is received.
        #[error("Timeout waiting for action")]
        Timeout,

        /// Action broadcast channel closed
        ///
        /// The action broadcast channel was closed, typically because the
        /// store is shutting down.
        #[error("Action broadcast channel closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;

use metrics::{EffectMetrics, StoreMetrics};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{mpsc, watch};

/// Configuration for Store instances
///
/// # Example
///
/// ```
/// use composable_runtime::StoreConfig;
/// use std::time::Duration;
///
/// let config = StoreConfig::default()
///     .with_name("search")
///     .with_broadcast_capacity(64)
///     .with_shutdown_timeout(Duration::from_secs(5));
///
/// assert_eq!(config.name, "search");
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Capacity of the effect action broadcast channel
    pub broadcast_capacity: usize,
    /// Default timeout for graceful shutdown
    pub default_shutdown_timeout: Duration,
    /// Name recorded on the Store's tracing spans
    pub name: String,
}

impl StoreConfig {
    /// Create a new configuration with custom values
    ///
    /// # Arguments
    ///
    /// - `broadcast_capacity`: Number of effect actions buffered for observers
    /// - `default_shutdown_timeout`: Default timeout for shutdown operations
    /// - `name`: Name recorded on tracing spans
    #[must_use]
    pub fn new(
        broadcast_capacity: usize,
        default_shutdown_timeout: Duration,
        name: impl Into<String>,
    ) -> Self {
        Self {
            broadcast_capacity,
            default_shutdown_timeout,
            name: name.into(),
        }
    }

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

    /// Set the name recorded on tracing spans
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: 16,
            default_shutdown_timeout: Duration::from_secs(30),
            name: "store".to_string(),
        }
    }
}

/// Handle for tracking effect completion
///
/// Returned by [`Store::send()`] to allow waiting for the effects that action
/// started. Actions those effects emit get handles of their own.
///
/// # Example
///
/// ```ignore
/// let mut handle = store.send(Action::Start).await?;
/// handle.wait_with_timeout(Duration::from_secs(5)).await?;
/// // All effects from Action::Start are now complete
/// ```
#[derive(Clone)]
pub struct EffectHandle {
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    /// Create a new effect handle
    ///
    /// # Returns
    ///
    /// A tuple of `(EffectHandle, EffectTracking)` where:
    /// - `EffectHandle` is returned to the caller for waiting
    /// - `EffectTracking` is used internally for effect execution
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
    ///
    /// Useful for initialization in loops where you need a `last_handle`.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let mut last_handle = EffectHandle::completed();
    /// for action in actions {
    ///     last_handle = store.send(action).await?;
    /// }
    /// last_handle.wait().await;
    /// ```
    #[must_use]
    pub fn completed() -> Self {
        let (tx, rx) = watch::channel(());
        let _ = tx.send(());

        Self {
            effects: Arc::new(AtomicUsize::new(0)),
            completion: rx,
        }
    }

    /// Number of effects from this action still running
    #[must_use]
    pub fn pending(&self) -> usize {
        self.effects.load(Ordering::SeqCst)
    }

    /// Wait for all effects to complete
    ///
    /// Effects that never finish on their own (timers, subscriptions) keep this
    /// pending until they are cancelled.
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
    /// Returns [`StoreError::Timeout`] if the timeout expires before all effects
    /// complete.
    ///
    /// # Example
    ///
    /// ```ignore
    /// handle.wait_with_timeout(Duration::from_secs(5)).await?;
    /// ```
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending_effects", &self.effects.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Internal: Effect tracking context passed through effect execution
#[derive(Clone)]
struct EffectTracking {
    counter: Arc<AtomicUsize>,
    notifier: Arc<watch::Sender<()>>,
}

impl EffectTracking {
    /// Increment the effect counter (effect started)
    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    /// Decrement the effect counter (effect completed)
    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            // Counter reached zero, notify waiters
            let _ = self.notifier.send(());
        }
    }
}

/// Internal: RAII guard that decrements effect counter on drop
///
/// Ensures the effect counter is always decremented, even if the effect panics.
struct DecrementGuard(EffectTracking);

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Guard that decrements an atomic counter on drop (for shutdown tracking)
struct AtomicCounterGuard(Arc<AtomicUsize>);

impl Drop for AtomicCounterGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// An action emitted by a running effect, with the token of that effect
///
/// Produced by stores built with [`Store::with_queued_feedback`]; a test harness
/// decides when to feed it back with [`Store::send_emitted`].
#[derive(Debug, Clone)]
pub struct EmittedAction<A> {
    /// The emitted action
    pub action: A,
    /// Cancellation token of the effect that emitted it
    pub token: CancellationToken,
}

impl<A> EmittedAction<A> {
    /// Whether the emitting effect was cancelled since
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Internal: Destination for actions produced by effects
///
/// Controls where actions go when effects produce them:
/// - Auto: Send back to the Store automatically (production)
/// - Queued: Push to a channel for manual processing (testing)
enum Feedback<A> {
    /// Auto-feedback to store (production mode)
    Auto,

    /// Queue for manual processing (test mode)
    Queued(mpsc::UnboundedSender<EmittedAction<A>>),
}

impl<A> Clone for Feedback<A> {
    fn clone(&self) -> Self {
        match self {
            Self::Auto => Self::Auto,
            Self::Queued(tx) => Self::Queued(tx.clone()),
        }
    }
}

/// Store module - The runtime for reducers
///
/// Store runtime for coordinating reducer execution and effect handling.
pub mod store {
    use super::{
        Arc, AtomicBool, AtomicCounterGuard, AtomicUsize, CancelId, CancellationRegistry,
        CancellationToken, DecrementGuard, Duration, Effect, EffectHandle, EffectMetrics,
        EffectTracking, EmittedAction, Emitter, Feedback, Ordering, Reducer, RwLock, StoreConfig,
        StoreError, StoreMetrics,
    };
    use futures::future::{join_all, BoxFuture};
    use futures::FutureExt;
    use std::panic::AssertUnwindSafe;
    use tokio::sync::{broadcast, mpsc, watch};

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock`, whose FIFO write lock serializes dispatch)
    /// 2. Reducer (business logic)
    /// 3. Environment (injected dependencies)
    /// 4. Effect execution (with feedback loop and cancellation)
    ///
    /// Clones share everything: state, registry, in-flight effects.
    ///
    /// # Type Parameters
    ///
    /// - `S`: State type
    /// - `A`: Action type
    /// - `E`: Environment type
    /// - `R`: Reducer implementation
    ///
    /// # Example
    ///
    /// ```ignore
    /// let store = Store::new(
    ///     SearchState::default(),
    ///     SearchReducer,
    ///     Dependencies::live(),
    /// );
    ///
    /// store.send(SearchAction::SearchQueryChanged("dune".into())).await?;
    /// ```
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: Arc<R>,
        environment: Arc<E>,
        config: Arc<StoreConfig>,
        registry: CancellationRegistry,
        /// Parent of every effect token; cancelled on shutdown.
        root_token: CancellationToken,
        shutdown: Arc<AtomicBool>,
        pending_effects: Arc<AtomicUsize>,
        revision: Arc<watch::Sender<u64>>,
        /// Action broadcast channel for observing actions produced by effects.
        ///
        /// Every effect action that was applied is broadcast after its state
        /// change is committed.
        action_broadcast: broadcast::Sender<A>,
        feedback: Feedback<A>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        ///
        /// Uses [`StoreConfig::default`].
        ///
        /// # Arguments
        ///
        /// - `initial_state`: The starting state for the store
        /// - `reducer`: The reducer implementation (business logic)
        /// - `environment`: Injected dependencies
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_config(initial_state, reducer, environment, StoreConfig::default())
        }

        /// Create a new Store with custom configuration
        ///
        /// # Example
        ///
        /// ```ignore
        /// let config = StoreConfig::default()
        ///     .with_name("contacts")
        ///     .with_shutdown_timeout(Duration::from_secs(60));
        ///
        /// let store = Store::with_config(state, reducer, deps, config);
        /// ```
        #[must_use]
        pub fn with_config(initial_state: S, reducer: R, environment: E, config: StoreConfig) -> Self {
            Self::build(initial_state, reducer, environment, config, Feedback::Auto)
        }

        /// Create a Store whose effect actions are queued instead of applied
        ///
        /// Every action an effect emits is pushed to the returned receiver together
        /// with its effect's cancellation token. Nothing is applied until the caller
        /// hands it back through [`Store::send_emitted`]. Used by test harnesses that
        /// assert on each received action.
        #[must_use]
        pub fn with_queued_feedback(
            initial_state: S,
            reducer: R,
            environment: E,
            config: StoreConfig,
        ) -> (Self, mpsc::UnboundedReceiver<EmittedAction<A>>) {
            let (tx, rx) = mpsc::unbounded_channel();
            let store = Self::build(initial_state, reducer, environment, config, Feedback::Queued(tx));
            (store, rx)
        }

        fn build(
            initial_state: S,
            reducer: R,
            environment: E,
            config: StoreConfig,
            feedback: Feedback<A>,
        ) -> Self {
            let (action_broadcast, _) = broadcast::channel(config.broadcast_capacity.max(1));
            let (revision, _) = watch::channel(0);

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer: Arc::new(reducer),
                environment: Arc::new(environment),
                config: Arc::new(config),
                registry: CancellationRegistry::new(),
                root_token: CancellationToken::new(),
                shutdown: Arc::new(AtomicBool::new(false)),
                pending_effects: Arc::new(AtomicUsize::new(0)),
                revision: Arc::new(revision),
                action_broadcast,
                feedback,
            }
        }

        /// The configuration this store was built with
        #[must_use]
        pub fn config(&self) -> &StoreConfig {
            &self.config
        }

        /// Initiate graceful shutdown
        ///
        /// 1. Stops accepting new actions (returns `StoreError::ShutdownInProgress`)
        /// 2. Cancels every in-flight effect
        /// 3. Waits for effect tasks to wind down, up to `timeout`
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if the timeout expires before all
        /// pending effects complete.
        ///
        /// # Example
        ///
        /// ```ignore
        /// store.shutdown(Duration::from_secs(30)).await?;
        /// ```
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!(store = %self.config.name, "Initiating graceful shutdown");
            metrics::counter!("store.shutdown.initiated").increment(1);

            // Set shutdown flag to reject new actions
            self.shutdown.store(true, Ordering::Release);
            self.root_token.cancel();
            let cancelled = self.registry.cancel_all();
            tracing::debug!(cancelled, "Cancelled registered effects");

            // Wait for pending effects with timeout
            let start = tokio::time::Instant::now();
            let poll_interval = Duration::from_millis(10);

            loop {
                let pending = self.pending_effects.load(Ordering::Acquire);

                if pending == 0 {
                    tracing::info!("All effects completed, shutdown successful");
                    metrics::counter!("store.shutdown.completed").increment(1);
                    return Ok(());
                }

                if start.elapsed() >= timeout {
                    tracing::error!(
                        pending_effects = pending,
                        "Shutdown timeout: {} effects still running",
                        pending
                    );
                    metrics::counter!("store.shutdown.timeout").increment(1);
                    return Err(StoreError::ShutdownTimeout(pending));
                }

                tokio::time::sleep(poll_interval).await;
            }
        }

        /// Graceful shutdown with the configured default timeout
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if effects are still running when
        /// [`StoreConfig::default_shutdown_timeout`] elapses.
        pub async fn shutdown_default(&self) -> Result<(), StoreError> {
            self.shutdown(self.config.default_shutdown_timeout).await
        }

        /// Send an action to the store
        ///
        /// This is the primary way to interact with the store:
        /// 1. Acquires write lock on state (actions are applied in arrival order)
        /// 2. Calls reducer with (state, action, environment)
        /// 3. Performs the synchronous part of every effect: cancellations and
        ///    registrations
        /// 4. Spawns the asynchronous part; emitted actions come back through
        ///    the same lock
        ///
        /// The state change is visible to readers before `send` returns.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        ///
        /// # Panics
        ///
        /// If the reducer panics, the panic will propagate to the caller.
        /// Reducers should be pure functions that do not panic.
        ///
        /// # Example
        ///
        /// ```ignore
        /// let mut handle = store.send(CounterAction::FactButtonTapped).await?;
        /// handle.wait().await;
        /// ```
        #[tracing::instrument(skip(self, action), fields(store = %self.config.name), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError> {
            self.send_internal(action, None).await
        }

        /// Apply an action previously emitted by an effect
        ///
        /// Dropped without running the reducer if its effect was cancelled. Only
        /// meaningful for stores built with [`Store::with_queued_feedback`].
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        pub async fn send_emitted(&self, emitted: EmittedAction<A>) -> Result<EffectHandle, StoreError> {
            self.send_internal(emitted.action, Some(emitted.token)).await
        }

        /// Send an action and wait for a matching result action
        ///
        /// This method is designed for request-response patterns.
        /// It subscribes to the action broadcast, sends the initial action,
        /// then waits for an effect action matching the predicate.
        ///
        /// # Errors
        ///
        /// - [`StoreError::Timeout`]: Timeout expired before matching action received
        /// - [`StoreError::ChannelClosed`]: Action broadcast channel closed
        /// - [`StoreError::ShutdownInProgress`]: Store is shutting down
        ///
        /// # Example
        ///
        /// ```ignore
        /// let response = store.send_and_wait_for(
        ///     CounterAction::FactButtonTapped,
        ///     |a| matches!(a, CounterAction::FactResponse(_)),
        ///     Duration::from_secs(10),
        /// ).await?;
        /// ```
        pub async fn send_and_wait_for<F>(
            &self,
            action: A,
            predicate: F,
            timeout: Duration,
        ) -> Result<A, StoreError>
        where
            F: Fn(&A) -> bool,
        {
            // Subscribe BEFORE sending to avoid race condition
            let mut rx = self.action_broadcast.subscribe();

            self.send(action).await?;

            tokio::time::timeout(timeout, async {
                loop {
                    match rx.recv().await {
                        Ok(action) if predicate(&action) => return Ok(action),
                        Ok(_) => {}, // Not the action we want, keep waiting
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            // If the terminal action was dropped, timeout will catch it
                            tracing::warn!(skipped, "Action observer lagged, {} actions skipped", skipped);
                        },
                        Err(broadcast::error::RecvError::Closed) => {
                            return Err(StoreError::ChannelClosed);
                        },
                    }
                }
            })
            .await
            .map_err(|_| StoreError::Timeout)?
        }

        /// Subscribe to every action produced by effects
        ///
        /// Actions are broadcast after their state change is committed. Actions sent
        /// directly through [`Store::send`] are not broadcast.
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Subscribe to state changes
        ///
        /// The revision counter is bumped after every committed action.
        #[must_use]
        pub fn subscribe_changes(&self) -> watch::Receiver<u64> {
            self.revision.subscribe()
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let count = store.state(|s| s.count).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&*state)
        }

        /// Number of effect tasks currently running
        #[must_use]
        pub fn pending_effects(&self) -> usize {
            self.pending_effects.load(Ordering::SeqCst)
        }

        /// Number of cancellation keys with at least one in-flight effect
        #[must_use]
        pub fn registered_cancellations(&self) -> usize {
            self.registry.len()
        }

        /// Whether an effect is in flight under `id`
        #[must_use]
        pub fn is_in_flight(&self, id: &CancelId) -> bool {
            self.registry.is_registered(id)
        }

        /// Internal send implementation
        ///
        /// `origin` is the token of the effect that emitted the action, if any. It is
        /// checked under the state lock so no action from a cancelled effect is
        /// applied once the cancellation has been processed.
        async fn send_internal(
            &self,
            action: A,
            origin: Option<CancellationToken>,
        ) -> Result<EffectHandle, StoreError> {
            // Check if store is shutting down
            if self.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected action: store is shutting down");
                StoreMetrics::record_rejected();
                return Err(StoreError::ShutdownInProgress);
            }

            let (handle, tracking) = EffectHandle::new();
            let mut state = self.state.write().await;
            tracing::trace!("Acquired write lock on state");

            if origin.as_ref().is_some_and(CancellationToken::is_cancelled) {
                tracing::trace!("Dropping action from cancelled effect");
                StoreMetrics::record_suppressed();
                return Ok(EffectHandle::completed());
            }

            tracing::debug!("Processing action");
            let observed = origin.is_some().then(|| action.clone());

            let effects = {
                let span = tracing::debug_span!("reducer_execution");
                let _enter = span.enter();

                let start = std::time::Instant::now();
                let effects = self.reducer.reduce(&mut *state, action, &self.environment);
                StoreMetrics::record_action(start.elapsed(), effects.len());

                tracing::trace!("Reducer completed, returned {} effects", effects.len());
                effects
            };

            for effect in effects {
                if let Some(task) = self.prepare(effect, &self.root_token) {
                    self.spawn_tracked(task, &tracking);
                }
            }

            drop(state);
            self.revision.send_modify(|revision| *revision += 1);

            if let Some(action) = observed {
                // No receivers is fine
                let _ = self.action_broadcast.send(action);
            }

            tracing::debug!("Action processing completed, returning handle");
            Ok(handle)
        }

        /// Perform the synchronous part of an effect and return its async part
        ///
        /// Cancellations and registrations happen here, before the caller releases
        /// the state lock. `parent` is the token the effect's own token derives from.
        fn prepare(&self, effect: Effect<A>, parent: &CancellationToken) -> Option<BoxFuture<'static, ()>> {
            match effect {
                Effect::None => {
                    tracing::trace!("Executing Effect::None (no-op)");
                    None
                },
                Effect::Cancel(id) => {
                    tracing::trace!(?id, "Executing Effect::Cancel");
                    EffectMetrics::record_executed("cancel");
                    let cancelled = self.registry.cancel(&id);
                    if cancelled > 0 {
                        EffectMetrics::record_cancelled(cancelled);
                    }
                    None
                },
                Effect::Cancellable {
                    id,
                    cancel_in_flight,
                    effect,
                } => {
                    tracing::trace!(?id, cancel_in_flight, "Executing Effect::Cancellable");
                    if cancel_in_flight {
                        let cancelled = self.registry.cancel(&id);
                        if cancelled > 0 {
                            EffectMetrics::record_cancelled(cancelled);
                        }
                    }

                    let token = parent.child_token();
                    let registration = self.registry.register(id, token.clone());
                    let task = self.prepare(*effect, &token)?;

                    Some(Box::pin(async move {
                        let _registration = registration;
                        tokio::select! {
                            () = token.cancelled() => {
                                tracing::trace!("Cancellable effect cancelled");
                            }
                            () = task => {}
                        }
                    }))
                },
                Effect::Future(fut) => {
                    tracing::trace!("Executing Effect::Future");
                    EffectMetrics::record_executed("future");
                    let emitter = self.emitter(parent.clone());

                    Some(Box::pin(async move {
                        if let Some(action) = fut.await {
                            tracing::trace!("Effect::Future produced an action, sending to store");
                            emitter.send(action).await;
                        } else {
                            tracing::trace!("Effect::Future completed with no action");
                        }
                    }))
                },
                Effect::Delay { duration, action } => {
                    tracing::trace!("Executing Effect::Delay (duration: {:?})", duration);
                    EffectMetrics::record_executed("delay");
                    let emitter = self.emitter(parent.clone());

                    Some(Box::pin(async move {
                        tokio::time::sleep(duration).await;
                        tracing::trace!("Effect::Delay completed, sending action");
                        emitter.send(*action).await;
                    }))
                },
                Effect::Run(body) => {
                    tracing::trace!("Executing Effect::Run");
                    EffectMetrics::record_executed("run");
                    Some(body(self.emitter(parent.clone())))
                },
                Effect::Parallel(effects) => {
                    tracing::trace!("Executing Effect::Parallel with {} effects", effects.len());
                    EffectMetrics::record_executed("parallel");

                    let tasks: Vec<_> = effects
                        .into_iter()
                        .filter_map(|effect| self.prepare(effect, parent))
                        .collect();
                    if tasks.is_empty() {
                        return None;
                    }

                    Some(Box::pin(async move {
                        join_all(tasks).await;
                    }))
                },
                Effect::Sequential(effects) => {
                    let effect_count = effects.len();
                    tracing::trace!("Executing Effect::Sequential with {} effects", effect_count);
                    EffectMetrics::record_executed("sequential");

                    let store = self.clone();
                    let parent = parent.clone();

                    Some(Box::pin(async move {
                        // Each effect is prepared only once the previous one is done
                        for (idx, effect) in effects.into_iter().enumerate() {
                            tracing::trace!("Executing sequential effect {} of {}", idx + 1, effect_count);
                            if let Some(task) = store.prepare(effect, &parent) {
                                task.await;
                            }
                        }
                        tracing::trace!("Effect::Sequential completed");
                    }))
                },
            }
        }

        /// Emitter feeding actions back into this store under `token`
        fn emitter(&self, token: CancellationToken) -> Emitter<A> {
            let store = self.clone();
            Emitter::new(token, move |action, token| {
                let store = store.clone();
                Box::pin(async move { store.deliver(action, token).await }) as BoxFuture<'static, ()>
            })
        }

        async fn deliver(&self, action: A, token: CancellationToken) {
            match &self.feedback {
                Feedback::Auto => {
                    if let Err(error) = self.send_internal(action, Some(token)).await {
                        tracing::trace!(%error, "Effect action not applied");
                    }
                },
                Feedback::Queued(queue) => {
                    if queue.send(EmittedAction { action, token }).is_err() {
                        tracing::trace!("Feedback queue closed, dropping effect action");
                    }
                },
            }
        }

        /// Spawn an effect task, tracked for its handle and for shutdown
        fn spawn_tracked(&self, task: BoxFuture<'static, ()>, tracking: &EffectTracking) {
            tracking.increment();
            let tracking_guard = DecrementGuard(tracking.clone());

            // Track global pending effects for shutdown
            self.pending_effects.fetch_add(1, Ordering::SeqCst);
            let pending_guard = AtomicCounterGuard(Arc::clone(&self.pending_effects));

            let root = self.root_token.clone();
            let name = self.config.name.clone();

            tokio::spawn(async move {
                let _guard = tracking_guard;
                let _pending_guard = pending_guard; // Decrement on drop

                let outcome = tokio::select! {
                    () = root.cancelled() => Ok(()),
                    outcome = AssertUnwindSafe(task).catch_unwind() => outcome,
                };

                if let Err(panic) = outcome {
                    let message = panic
                        .downcast_ref::<&str>()
                        .map(ToString::to_string)
                        .or_else(|| panic.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "<non-string panic>".to_string());
                    tracing::error!(store = %name, panic = %message, "Effect task panicked");
                    EffectMetrics::record_panic();
                }
            });
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: Arc::clone(&self.reducer),
                environment: Arc::clone(&self.environment),
                config: Arc::clone(&self.config),
                registry: self.registry.clone(),
                root_token: self.root_token.clone(),
                shutdown: Arc::clone(&self.shutdown),
                pending_effects: Arc::clone(&self.pending_effects),
                revision: Arc::clone(&self.revision),
                action_broadcast: self.action_broadcast.clone(),
                feedback: self.feedback.clone(),
            }
        }
    }

    impl<S, A, E, R> std::fmt::Debug for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("Store")
                .field("name", &self.config.name)
                .field("pending_effects", &self.pending_effects.load(Ordering::SeqCst))
                .field("registry", &self.registry)
                .finish_non_exhaustive()
        }
    }
}

// Re-export for convenience
pub use store::Store;
