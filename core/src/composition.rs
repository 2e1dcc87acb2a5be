//! Reducer composition utilities
//!
//! This module provides utilities for composing reducers in various ways:
//! - **`Reduce`**: Build a reducer from a closure
//! - **`combine_reducers`**: Run multiple reducers on the same state/action, in order
//! - **`scope_reducer`**: Focus a child reducer on a field of parent state and a case
//!   of the parent action
//!
//! Composition is structural: the parent state embeds child state as a field and the
//! parent action embeds child actions as an enum case. Explicit lens/prism functions
//! connect the two.
//!
//! # Examples
//!
//! ## Scoping two children into one parent
//!
//! ```
//! use composable_core::composition::{combine_reducers, scope_reducer, Reduce};
//! use composable_core::{smallvec, Effect, Reducer, SmallVec};
//!
//! #[derive(Clone, Debug, Default)]
//! struct Counter {
//!     count: i32,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum CounterAction {
//!     Increment,
//! }
//!
//! #[derive(Clone, Debug, Default)]
//! struct App {
//!     left: Counter,
//!     right: Counter,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum AppAction {
//!     Left(CounterAction),
//!     Right(CounterAction),
//! }
//!
//! fn counter() -> impl Reducer<State = Counter, Action = CounterAction, Environment = ()> + Send + Sync {
//!     Reduce::new(|state: &mut Counter, action: CounterAction, _env: &()| {
//!         match action {
//!             CounterAction::Increment => state.count += 1,
//!         }
//!         smallvec![Effect::None]
//!     })
//! }
//!
//! let app = combine_reducers(vec![
//!     Box::new(scope_reducer(
//!         counter(),
//!         |app: &mut App| &mut app.left,
//!         |action| match action {
//!             AppAction::Left(a) => Some(a),
//!             AppAction::Right(_) => None,
//!         },
//!         AppAction::Left,
//!     )),
//!     Box::new(scope_reducer(
//!         counter(),
//!         |app: &mut App| &mut app.right,
//!         |action| match action {
//!             AppAction::Right(a) => Some(a),
//!             AppAction::Left(_) => None,
//!         },
//!         AppAction::Right,
//!     )),
//! ]);
//!
//! let mut state = App::default();
//! let _ = app.reduce(&mut state, AppAction::Right(CounterAction::Increment), &());
//! assert_eq!(state.left.count, 0);
//! assert_eq!(state.right.count, 1);
//! ```

use crate::cancel::CancelId;
use crate::effect::Effect;
use crate::reducer::Reducer;
use smallvec::SmallVec;
use std::marker::PhantomData;
use uuid::Uuid;

/// Boxed reducer accepted by [`combine_reducers`]
pub type BoxedReducer<S, A, E> =
    Box<dyn Reducer<State = S, Action = A, Environment = E> + Send + Sync>;

/// A reducer backed by a closure
///
/// # Examples
///
/// ```
/// use composable_core::composition::Reduce;
/// use composable_core::{Effect, Reducer, SmallVec};
///
/// let noop = Reduce::new(|_state: &mut u8, _action: (), _env: &()| SmallVec::<[Effect<()>; 4]>::new());
/// let mut state = 3;
/// assert!(noop.reduce(&mut state, (), &()).is_empty());
/// ```
pub struct Reduce<S, A, E, F = fn(&mut S, A, &E) -> SmallVec<[Effect<A>; 4]>> {
    f: F,
    _phantom: PhantomData<fn(&mut S, A, &E)>,
}

impl<S, A, E, F> Reduce<S, A, E, F>
where
    F: Fn(&mut S, A, &E) -> SmallVec<[Effect<A>; 4]>,
{
    /// Wrap a reduce function
    #[must_use]
    pub const fn new(f: F) -> Self {
        Self {
            f,
            _phantom: PhantomData,
        }
    }
}

impl<S, A, E, F> Reducer for Reduce<S, A, E, F>
where
    F: Fn(&mut S, A, &E) -> SmallVec<[Effect<A>; 4]>,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        (self.f)(state, action, env)
    }
}

/// Combines multiple reducers that operate on the same state and action types.
///
/// Each reducer is run in declared order against the same action, and all effects
/// are collected and concatenated. Put child (scoped) reducers before the parent's
/// own logic so the parent observes the state children already produced.
///
/// # Type Parameters
///
/// - `S`: The state type
/// - `A`: The action type
/// - `E`: The environment type
#[must_use]
pub fn combine_reducers<S, A, E>(reducers: Vec<BoxedReducer<S, A, E>>) -> CombinedReducer<S, A, E>
where
    A: Clone,
{
    CombinedReducer { reducers }
}

/// A combined reducer that runs multiple reducers in sequence.
///
/// Created by [`combine_reducers`].
pub struct CombinedReducer<S, A, E> {
    reducers: Vec<BoxedReducer<S, A, E>>,
}

impl<S, A, E> Reducer for CombinedReducer<S, A, E>
where
    A: Clone,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let mut all_effects = SmallVec::new();

        for reducer in &self.reducers {
            let effects = reducer.reduce(state, action.clone(), env);
            all_effects.extend(effects.into_iter().filter(|effect| !effect.is_none()));
        }

        all_effects
    }
}

/// Scopes a child reducer to a field of parent state and a case of parent action.
///
/// - `state`: lens from the parent state to the child's field
/// - `to_child`: extracts the child action from a parent action; `None` means the
///   action is not for this child and the scoped reducer does nothing
/// - `from_child`: embeds child actions emitted by child effects into the parent
///   action type
///
/// Each scoped reducer gets its own cancellation scope: the child's keys are
/// qualified with it, so two scopes of the same child never cancel each other's
/// effects.
///
/// # Type Parameters
///
/// - `S`: The parent state type
/// - `A`: The parent action type
/// - `R`: The child reducer
pub fn scope_reducer<S, A, R>(
    reducer: R,
    state: fn(&mut S) -> &mut R::State,
    to_child: fn(A) -> Option<R::Action>,
    from_child: fn(R::Action) -> A,
) -> ScopedReducer<S, A, R>
where
    R: Reducer,
{
    ScopedReducer {
        reducer,
        state,
        to_child,
        from_child,
        scope: CancelId::new(ScopeId(Uuid::new_v4())),
    }
}

/// Identity of one [`ScopedReducer`]'s cancellation scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub Uuid);


/// A scoped reducer that operates on a subset of state.
///
/// Created by [`scope_reducer`].
pub struct ScopedReducer<S, A, R>
where
    R: Reducer,
{
    reducer: R,
    state: fn(&mut S) -> &mut R::State,
    to_child: fn(A) -> Option<R::Action>,
    from_child: fn(R::Action) -> A,
    scope: CancelId,
}

impl<S, A, R> ScopedReducer<S, A, R>
where
    R: Reducer,
{
    /// The scope qualifying this child's cancellation keys
    #[must_use]
    pub const fn scope(&self) -> &CancelId {
        &self.scope
    }
}

impl<S, A, R> Reducer for ScopedReducer<S, A, R>
where
    R: Reducer,
    R::Action: Send + 'static,
    A: Send + 'static,
{
    type State = S;
    type Action = A;
    type Environment = R::Environment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let Some(child_action) = (self.to_child)(action) else {
            return SmallVec::new();
        };

        let child_state = (self.state)(state);
        let from_child = self.from_child;

        self.reducer
            .reduce(child_state, child_action, env)
            .into_iter()
            .filter(|effect| !effect.is_none())
            .map(|effect| effect.map(from_child).within_scope(&self.scope))
            .collect()
    }
}
