//! # Composable Core
//!
//! Core traits and types for the composable reducer architecture.
//!
//! State evolves only through actions processed by reducers. Side effects are
//! described as values ([`Effect`]) and executed by a runtime Store, which feeds the
//! actions they emit back through the same reducer.
//!
//! ## Core Concepts
//!
//! - **State**: Domain state for a feature
//! - **Action**: All possible inputs to a reducer (user intent, effect responses, delegates)
//! - **Reducer**: Pure function `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: Cancellable side effect descriptions (not execution)
//! - **Environment**: Injected dependencies, usually a [`Dependencies`] container
//!
//! ## Composition
//!
//! - [`composition::combine_reducers`] runs reducers in declared order on shared state
//! - [`composition::scope_reducer`] lifts a child reducer into a parent's domain
//! - [`presentation::if_let`] drives an optional child feature in and out of existence
//!
//! ## Example
//!
//! ```
//! use composable_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
//!
//! #[derive(Clone, Debug, Default)]
//! struct CounterState {
//!     count: i64,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum CounterAction {
//!     Increment,
//!     Decrement,
//! }
//!
//! struct CounterReducer;
//!
//! impl Reducer for CounterReducer {
//!     type State = CounterState;
//!     type Action = CounterAction;
//!     type Environment = ();
//!
//!     fn reduce(
//!         &self,
//!         state: &mut CounterState,
//!         action: CounterAction,
//!         _env: &(),
//!     ) -> SmallVec<[Effect<CounterAction>; 4]> {
//!         match action {
//!             CounterAction::Increment => state.count += 1,
//!             CounterAction::Decrement => state.count -= 1,
//!         }
//!         smallvec![Effect::None]
//!     }
//! }
//!
//! let mut state = CounterState::default();
//! let _ = CounterReducer.reduce(&mut state, CounterAction::Increment, &());
//! assert_eq!(state.count, 1);
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use smallvec::{smallvec, SmallVec};
pub use tokio_util::sync::CancellationToken;

/// Cancellation identifiers
pub mod cancel;

/// Effect descriptions and the emitter handed to running effects
pub mod effect;

/// Reducer composition utilities
pub mod composition;

/// Optional child state and the reducer that drives it
pub mod presentation;

/// Keyed dependency resolution
pub mod dependencies;

/// Declarative macros for effect construction
pub mod effect_macros;

pub use cancel::CancelId;
pub use dependencies::{Dependencies, DependencyContext, DependencyKey};
pub use effect::{Effect, Emitter};
pub use presentation::{PresentationAction, PresentationState};
pub use reducer::Reducer;

/// Reducer module - The core trait for business logic
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`
///
/// They contain all business logic and are deterministic and testable. A reducer
/// must handle every action of its declared action type; Rust's exhaustive `match`
/// turns an unhandled case into a compile error.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The domain state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    ///
    /// # Example
    ///
    /// ```ignore
    /// impl Reducer for SearchReducer {
    ///     type State = SearchState;
    ///     type Action = SearchAction;
    ///     type Environment = Dependencies;
    ///
    ///     fn reduce(
    ///         &self,
    ///         state: &mut SearchState,
    ///         action: SearchAction,
    ///         env: &Dependencies,
    ///     ) -> SmallVec<[Effect<SearchAction>; 4]> {
    ///         match action {
    ///             SearchAction::QueryChanged(query) => {
    ///                 state.query = query;
    ///                 smallvec![Effect::None]
    ///             }
    ///         }
    ///     }
    /// }
    /// ```
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// This is a pure function that:
        /// 1. Updates state in place
        /// 2. Returns effect descriptions to be executed
        ///
        /// It never suspends and never fails.
        ///
        /// # Arguments
        ///
        /// - `state`: Mutable reference to current state
        /// - `action`: The action to process
        /// - `env`: Reference to injected dependencies
        ///
        /// # Returns
        ///
        /// The effects to be executed by the runtime, in order
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Environment module - Dependency traits
///
/// External capabilities are abstracted behind traits and resolved through
/// [`Dependencies`](crate::dependencies::Dependencies).
pub mod environment {
    use chrono::{DateTime, Utc};
    use futures::future::BoxFuture;
    use std::time::Duration;

    /// Clock trait - abstracts time operations for testability
    ///
    /// Effects never call `tokio::time` directly for feature logic; they sleep on a
    /// clock resolved from their dependencies so tests can drive time by hand.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let clock = env.resolve::<ClockKey>();
    /// Effect::run(move |send| async move {
    ///     loop {
    ///         clock.sleep(Duration::from_secs(1)).await;
    ///         send.send(Action::Tick).await;
    ///     }
    /// })
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;

        /// Suspend for `duration` of this clock's time
        fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()>;
    }

    /// Wall clock backed by the tokio timer
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }

        fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
            Box::pin(tokio::time::sleep(duration))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::environment::{Clock, SystemClock};
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn system_clock_sleeps_on_tokio_timer() {
        let clock = SystemClock;
        let before = tokio::time::Instant::now();
        clock.sleep(Duration::from_secs(5)).await;
        assert!(before.elapsed() >= Duration::from_secs(5));
    }
}
