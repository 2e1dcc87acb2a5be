//! # Counter Demo
//!
//! A counter with two side effects:
//! - a number fact fetched through the [`NumberFactKey`] dependency
//! - a once-per-second timer, started and stopped by the same button
//!
//! ## Architecture
//!
//! The timer is a long-running `Effect::Run` registered under
//! [`CounterCancel::Timer`]; toggling it off cancels that key. It sleeps on the
//! clock resolved from [`ClockKey`], so tests drive it with a virtual clock.
//!
//! ## Example
//!
//! ```no_run
//! use composable_core::Dependencies;
//! use composable_runtime::Store;
//! use counter::{CounterAction, CounterReducer, CounterState};
//!
//! # async fn example() {
//! let store = Store::new(CounterState::default(), CounterReducer, Dependencies::live());
//!
//! let _ = store.send(CounterAction::IncrementButtonTapped).await;
//! let count = store.state(|s| s.count).await;
//! assert_eq!(count, 1);
//! # }
//! ```

use composable_core::dependencies::ClockKey;
use composable_core::{async_effect, run_effect};
use composable_core::{effect::Effect, reducer::Reducer, smallvec, Dependencies, SmallVec};
use composable_macros::Action;
use std::time::Duration;

pub mod fact;

pub use fact::{FactError, NumberFactClient, NumberFactKey};

/// Interval between timer ticks
pub const TIMER_INTERVAL: Duration = Duration::from_secs(1);

/// Counter state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CounterState {
    /// Current count value
    pub count: i64,
    /// A fact request is in flight
    pub is_loading: bool,
    /// Fact about the count, once loaded
    pub fact: Option<String>,
    /// Why the last fact request failed
    pub error_message: Option<String>,
    /// The timer is ticking
    pub is_timer_running: bool,
}

impl CounterState {
    fn clear_fact(&mut self) {
        self.is_loading = false;
        self.fact = None;
        self.error_message = None;
    }
}

/// Counter actions
///
/// Cases are named after what the user did, not what the reducer does with it.
#[derive(Action, Debug, Clone, PartialEq, Eq)]
pub enum CounterAction {
    /// "+" tapped
    IncrementButtonTapped,
    /// "-" tapped
    DecrementButtonTapped,
    /// "Fact" tapped
    FactButtonTapped,
    /// Result of the fact request
    #[response]
    FactResponse(Result<String, FactError>),
    /// Timer start/stop tapped
    TimerToggleButtonTapped,
    /// One timer interval elapsed
    TimerTick,
}

/// Cancellation keys owned by the counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CounterCancel {
    /// The running timer
    Timer,
}

/// Counter reducer
#[derive(Debug, Clone, Copy, Default)]
pub struct CounterReducer;

impl Reducer for CounterReducer {
    type State = CounterState;
    type Action = CounterAction;
    type Environment = Dependencies;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            CounterAction::IncrementButtonTapped => {
                state.count += 1;
                state.clear_fact();
                smallvec![Effect::None]
            },
            CounterAction::DecrementButtonTapped => {
                state.count -= 1;
                state.clear_fact();
                smallvec![Effect::None]
            },
            CounterAction::FactButtonTapped => {
                state.clear_fact();
                state.is_loading = true;

                let client = env.resolve::<NumberFactKey>();
                let count = state.count;
                smallvec![async_effect! {
                    Some(CounterAction::FactResponse(client.fetch(count).await))
                }]
            },
            CounterAction::FactResponse(Ok(fact)) => {
                state.is_loading = false;
                state.fact = Some(fact);
                smallvec![Effect::None]
            },
            CounterAction::FactResponse(Err(error)) => {
                tracing::warn!(%error, "Number fact request failed");
                state.is_loading = false;
                state.error_message = Some(error.to_string());
                smallvec![Effect::None]
            },
            CounterAction::TimerToggleButtonTapped => {
                state.is_timer_running = !state.is_timer_running;

                if state.is_timer_running {
                    let clock = env.resolve::<ClockKey>();
                    smallvec![run_effect!(send => {
                        loop {
                            clock.sleep(TIMER_INTERVAL).await;
                            if !send.send(CounterAction::TimerTick).await {
                                break;
                            }
                        }
                    })
                    .cancellable(CounterCancel::Timer, true)]
                } else {
                    smallvec![Effect::cancel(CounterCancel::Timer)]
                }
            },
            CounterAction::TimerTick => {
                state.count += 1;
                state.clear_fact();
                smallvec![Effect::None]
            },
        }
    }
}
