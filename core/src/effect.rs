//! Effect descriptions.
//!
//! Effects are values returned by reducers. They describe side effects; the Store
//! executes them. This keeps reducers pure and lets tests inspect effects without
//! running them.

use crate::cancel::CancelId;
use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Async body of an [`Effect::Run`]
pub type RunBody<Action> = Box<dyn FnOnce(Emitter<Action>) -> BoxFuture<'static, ()> + Send>;

type Sink<Action> = Arc<dyn Fn(Action, CancellationToken) -> BoxFuture<'static, ()> + Send + Sync>;

/// Side effect descriptions
///
/// Effects are NOT executed by reducers. They are descriptions returned as values
/// that the Store runtime executes.
///
/// # Example
///
/// ```
/// use composable_core::effect::Effect;
/// use std::time::Duration;
///
/// #[derive(Debug, Clone, PartialEq)]
/// enum Action {
///     Tick,
/// }
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// enum Cancel {
///     Timer,
/// }
///
/// let effect = Effect::Delay {
///     duration: Duration::from_secs(1),
///     action: Box::new(Action::Tick),
/// }
/// .cancellable(Cancel::Timer, true);
///
/// assert!(matches!(effect, Effect::Cancellable { cancel_in_flight: true, .. }));
/// ```
pub enum Effect<Action> {
    /// No-op effect
    None,

    /// Run effects in parallel
    Parallel(Vec<Effect<Action>>),

    /// Run effects sequentially, each starting after the previous one completes
    Sequential(Vec<Effect<Action>>),

    /// Delayed action (for timeouts, debouncing)
    Delay {
        /// How long to wait
        duration: Duration,
        /// Action to dispatch after delay
        action: Box<Action>,
    },

    /// Arbitrary async computation
    ///
    /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
    Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),

    /// Long-running async body that may emit any number of actions through its
    /// [`Emitter`]
    Run(RunBody<Action>),

    /// Register the wrapped effect under `id`
    Cancellable {
        /// Key the effect is registered under
        id: CancelId,
        /// Cancel every effect already registered under `id` first
        cancel_in_flight: bool,
        /// The registered effect
        effect: Box<Effect<Action>>,
    },

    /// Cancel every effect registered under the key
    Cancel(CancelId),
}

// Manual Debug implementation since Future doesn't implement Debug
impl<Action> fmt::Debug for Effect<Action>
where
    Action: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::None => write!(f, "Effect::None"),
            Effect::Parallel(effects) => f.debug_tuple("Effect::Parallel").field(effects).finish(),
            Effect::Sequential(effects) => {
                f.debug_tuple("Effect::Sequential").field(effects).finish()
            },
            Effect::Delay { duration, action } => f
                .debug_struct("Effect::Delay")
                .field("duration", duration)
                .field("action", action)
                .finish(),
            Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            Effect::Run(_) => write!(f, "Effect::Run(<task>)"),
            Effect::Cancellable {
                id,
                cancel_in_flight,
                effect,
            } => f
                .debug_struct("Effect::Cancellable")
                .field("id", id)
                .field("cancel_in_flight", cancel_in_flight)
                .field("effect", effect)
                .finish(),
            Effect::Cancel(id) => f.debug_tuple("Effect::Cancel").field(id).finish(),
        }
    }
}

impl<Action> Effect<Action> {
    /// Combine effects to run in parallel
    #[must_use]
    pub const fn merge(effects: Vec<Effect<Action>>) -> Effect<Action> {
        Effect::Parallel(effects)
    }

    /// Chain effects to run sequentially
    #[must_use]
    pub const fn chain(effects: Vec<Effect<Action>>) -> Effect<Action> {
        Effect::Sequential(effects)
    }

    /// No-op effect
    #[must_use]
    pub const fn none() -> Self {
        Effect::None
    }

    /// Whether this is [`Effect::None`]
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Effect::None)
    }

    /// Cancel every effect registered under `key`
    #[must_use]
    pub fn cancel<K>(key: K) -> Self
    where
        K: Hash + Eq + fmt::Debug + Send + Sync + 'static,
    {
        Effect::Cancel(CancelId::new(key))
    }

    /// Register this effect under `key`
    ///
    /// With `cancel_in_flight`, effects already registered under the key are
    /// cancelled before this one starts.
    #[must_use]
    pub fn cancellable<K>(self, key: K, cancel_in_flight: bool) -> Self
    where
        K: Hash + Eq + fmt::Debug + Send + Sync + 'static,
    {
        Effect::Cancellable {
            id: CancelId::new(key),
            cancel_in_flight,
            effect: Box::new(self),
        }
    }

    /// Qualify every cancellation key in this effect with `scope`
    ///
    /// Registrations and cancels inside the effect keep matching each other, but
    /// no longer match the same keys used under another scope.
    #[must_use]
    pub fn within_scope(self, scope: &CancelId) -> Self {
        match self {
            Effect::Parallel(effects) => {
                Effect::Parallel(effects.into_iter().map(|e| e.within_scope(scope)).collect())
            },
            Effect::Sequential(effects) => {
                Effect::Sequential(effects.into_iter().map(|e| e.within_scope(scope)).collect())
            },
            Effect::Cancellable {
                id,
                cancel_in_flight,
                effect,
            } => Effect::Cancellable {
                id: id.scoped(scope),
                cancel_in_flight,
                effect: Box::new(effect.within_scope(scope)),
            },
            Effect::Cancel(id) => Effect::Cancel(id.scoped(scope)),
            other => other,
        }
    }
}

impl<Action: Send + 'static> Effect<Action> {
    /// Long-running effect that emits through an [`Emitter`]
    ///
    /// # Example
    ///
    /// ```ignore
    /// Effect::run(move |send| async move {
    ///     loop {
    ///         clock.sleep(Duration::from_secs(1)).await;
    ///         send.send(CounterAction::TimerTick).await;
    ///     }
    /// })
    /// ```
    #[must_use]
    pub fn run<F, Fut>(body: F) -> Self
    where
        F: FnOnce(Emitter<Action>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Effect::Run(Box::new(move |emitter| Box::pin(body(emitter))))
    }

    /// Like [`Effect::run`], but a failing body is turned into an action by `catch`
    #[must_use]
    pub fn run_catching<F, Fut, E, C>(body: F, catch: C) -> Self
    where
        F: FnOnce(Emitter<Action>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Send + 'static,
        C: FnOnce(E) -> Action + Send + 'static,
    {
        Effect::run(move |emitter: Emitter<Action>| {
            let fallback = emitter.clone();
            async move {
                if let Err(error) = body(emitter).await {
                    fallback.send(catch(error)).await;
                }
            }
        })
    }

    /// Async computation yielding at most one action
    #[must_use]
    pub fn future<Fut>(future: Fut) -> Self
    where
        Fut: Future<Output = Option<Action>> + Send + 'static,
    {
        Effect::Future(Box::pin(future))
    }

    /// Feed `action` back into the Store immediately
    #[must_use]
    pub fn send(action: Action) -> Self {
        Effect::Future(Box::pin(async move { Some(action) }))
    }

    /// Transform every action this effect emits
    ///
    /// Used by scoping to lift a child's effects into the parent action type.
    /// Cancellation keys are preserved.
    #[must_use]
    pub fn map<B, F>(self, f: F) -> Effect<B>
    where
        B: Send + 'static,
        F: Fn(Action) -> B + Send + Sync + 'static,
    {
        self.map_shared(&(Arc::new(f) as Arc<dyn Fn(Action) -> B + Send + Sync>))
    }

    fn map_shared<B>(self, f: &Arc<dyn Fn(Action) -> B + Send + Sync>) -> Effect<B>
    where
        B: Send + 'static,
    {
        match self {
            Effect::None => Effect::None,
            Effect::Parallel(effects) => {
                Effect::Parallel(effects.into_iter().map(|e| e.map_shared(f)).collect())
            },
            Effect::Sequential(effects) => {
                Effect::Sequential(effects.into_iter().map(|e| e.map_shared(f)).collect())
            },
            Effect::Delay { duration, action } => Effect::Delay {
                duration,
                action: Box::new(f(*action)),
            },
            Effect::Future(future) => {
                let f = Arc::clone(f);
                Effect::Future(Box::pin(async move { future.await.map(|action| f(action)) }))
            },
            Effect::Run(body) => {
                let f = Arc::clone(f);
                Effect::Run(Box::new(move |emitter: Emitter<B>| {
                    body(emitter.contramap(move |action| f(action)))
                }))
            },
            Effect::Cancellable {
                id,
                cancel_in_flight,
                effect,
            } => Effect::Cancellable {
                id,
                cancel_in_flight,
                effect: Box::new(effect.map_shared(f)),
            },
            Effect::Cancel(id) => Effect::Cancel(id),
        }
    }
}

/// Handle through which a running effect feeds actions back into its Store
///
/// Each emitter carries the cancellation token of the effect that owns it. Once the
/// token is cancelled, [`Emitter::send`] drops actions instead of delivering them.
pub struct Emitter<Action> {
    sink: Sink<Action>,
    token: CancellationToken,
}

impl<Action> Clone for Emitter<Action> {
    fn clone(&self) -> Self {
        Self {
            sink: Arc::clone(&self.sink),
            token: self.token.clone(),
        }
    }
}

impl<Action> fmt::Debug for Emitter<Action> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("cancelled", &self.token.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl<Action: Send + 'static> Emitter<Action> {
    /// Build an emitter from a delivery function
    ///
    /// The token is passed along with every action so the receiver can re-check it
    /// at the point of application.
    pub fn new<F>(token: CancellationToken, sink: F) -> Self
    where
        F: Fn(Action, CancellationToken) -> BoxFuture<'static, ()> + Send + Sync + 'static,
    {
        Self {
            sink: Arc::new(sink),
            token,
        }
    }

    /// Deliver an action
    ///
    /// Returns `false` when the owning effect was cancelled and the action dropped.
    pub async fn send(&self, action: Action) -> bool {
        if self.token.is_cancelled() {
            tracing::trace!("Emitter cancelled, dropping action");
            return false;
        }
        (self.sink)(action, self.token.clone()).await;
        true
    }

    /// Emitter of another action type that converts through `f` into this one
    #[must_use]
    pub fn contramap<B, F>(self, f: F) -> Emitter<B>
    where
        F: Fn(B) -> Action + Send + Sync + 'static,
    {
        let sink = self.sink;
        Emitter {
            sink: Arc::new(move |action: B, token: CancellationToken| sink(f(action), token)),
            token: self.token,
        }
    }
}

impl<Action> Emitter<Action> {
    /// Whether the owning effect has been cancelled
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the owning effect is cancelled
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }

    /// Cancellation token of the owning effect
    #[must_use]
    pub const fn token(&self) -> &CancellationToken {
        &self.token
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Child {
        Ping(u32),
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Parent {
        Child(Child),
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Key {
        Work,
    }

    fn recording_emitter<A: Send + 'static>(
        token: CancellationToken,
    ) -> (Emitter<A>, Arc<Mutex<Vec<A>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let emitter = Emitter::new(token, move |action, _token| {
            sink.lock().unwrap().push(action);
            Box::pin(async {}) as BoxFuture<'static, ()>
        });
        (emitter, seen)
    }

    #[test]
    fn merge_and_chain_build_groups() {
        let merged: Effect<Child> = Effect::merge(vec![Effect::None, Effect::None]);
        assert!(matches!(merged, Effect::Parallel(ref v) if v.len() == 2));

        let chained: Effect<Child> = Effect::chain(vec![Effect::None]);
        assert!(matches!(chained, Effect::Sequential(ref v) if v.len() == 1));
    }

    #[test]
    fn cancellable_wraps_with_key() {
        let effect: Effect<Child> = Effect::send(Child::Ping(1)).cancellable(Key::Work, false);
        match effect {
            Effect::Cancellable {
                id,
                cancel_in_flight,
                effect,
            } => {
                assert_eq!(id, CancelId::new(Key::Work));
                assert!(!cancel_in_flight);
                assert!(matches!(*effect, Effect::Future(_)));
            },
            other => panic!("unexpected effect {other:?}"),
        }
    }

    #[tokio::test]
    async fn map_lifts_future_actions() {
        let effect = Effect::send(Child::Ping(7)).map(Parent::Child);
        let Effect::Future(future) = effect else {
            panic!("expected future");
        };
        assert_eq!(future.await, Some(Parent::Child(Child::Ping(7))));
    }

    #[test]
    fn map_preserves_cancellation_structure() {
        let effect = Effect::Delay {
            duration: Duration::from_millis(10),
            action: Box::new(Child::Ping(1)),
        }
        .cancellable(Key::Work, true)
        .map(Parent::Child);

        let Effect::Cancellable { id, effect, .. } = effect else {
            panic!("expected cancellable");
        };
        assert_eq!(id, CancelId::new(Key::Work));
        let Effect::Delay { action, .. } = *effect else {
            panic!("expected delay");
        };
        assert_eq!(*action, Parent::Child(Child::Ping(1)));

        let cancel = Effect::<Child>::cancel(Key::Work).map(Parent::Child);
        assert!(matches!(cancel, Effect::Cancel(id) if id == CancelId::new(Key::Work)));
    }

    #[tokio::test]
    async fn map_lifts_run_emissions() {
        let effect = Effect::run(|send: Emitter<Child>| async move {
            send.send(Child::Ping(1)).await;
            send.send(Child::Ping(2)).await;
        })
        .map(Parent::Child);

        let (emitter, seen) = recording_emitter::<Parent>(CancellationToken::new());
        let Effect::Run(body) = effect else {
            panic!("expected run");
        };
        body(emitter).await;

        assert_eq!(
            *seen.lock().unwrap(),
            vec![Parent::Child(Child::Ping(1)), Parent::Child(Child::Ping(2))]
        );
    }

    #[tokio::test]
    async fn cancelled_emitter_drops_actions() {
        let token = CancellationToken::new();
        let (emitter, seen) = recording_emitter::<Child>(token.clone());

        assert!(emitter.send(Child::Ping(1)).await);
        token.cancel();
        assert!(emitter.is_cancelled());
        assert!(!emitter.send(Child::Ping(2)).await);

        assert_eq!(*seen.lock().unwrap(), vec![Child::Ping(1)]);
    }

    #[tokio::test]
    async fn run_catching_turns_errors_into_actions() {
        let effect = Effect::run_catching(
            |_send: Emitter<Child>| async move { Err::<(), u32>(42) },
            Child::Ping,
        );

        let (emitter, seen) = recording_emitter::<Child>(CancellationToken::new());
        let Effect::Run(body) = effect else {
            panic!("expected run");
        };
        body(emitter).await;

        assert_eq!(*seen.lock().unwrap(), vec![Child::Ping(42)]);
    }
}
