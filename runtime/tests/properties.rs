//! Property tests for the Store dispatch loop
//!
//! Sending a sequence of effect-free actions through a Store must leave exactly
//! the state obtained by folding the reducer over them by hand, and must not touch
//! the cancellation registry.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use composable_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
use composable_runtime::Store;
use proptest::prelude::*;

#[derive(Debug, Clone, PartialEq, Default)]
struct Tally {
    total: i64,
    history: Vec<i64>,
    resets: u32,
}

#[derive(Debug, Clone)]
enum TallyAction {
    Add(i64),
    Multiply(i64),
    Reset,
}

struct TallyReducer;

impl Reducer for TallyReducer {
    type State = Tally;
    type Action = TallyAction;
    type Environment = ();

    fn reduce(&self, state: &mut Tally, action: TallyAction, _env: &()) -> SmallVec<[Effect<TallyAction>; 4]> {
        match action {
            TallyAction::Add(n) => state.total = state.total.wrapping_add(n),
            TallyAction::Multiply(n) => state.total = state.total.wrapping_mul(n),
            TallyAction::Reset => {
                state.total = 0;
                state.resets += 1;
            },
        }
        state.history.push(state.total);
        smallvec![Effect::None]
    }
}

fn action_strategy() -> impl Strategy<Value = TallyAction> {
    prop_oneof![
        (-1000i64..1000).prop_map(TallyAction::Add),
        (-5i64..5).prop_map(TallyAction::Multiply),
        Just(TallyAction::Reset),
    ]
}

fn run_through_store(initial: Tally, actions: Vec<TallyAction>) -> (Tally, usize, usize) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to build runtime");

    runtime.block_on(async move {
        let store = Store::new(initial, TallyReducer, ());
        for action in actions {
            let _ = store.send(action).await.unwrap();
        }
        (
            store.state(Clone::clone).await,
            store.registered_cancellations(),
            store.pending_effects(),
        )
    })
}

proptest! {
    /// Property: the Store applies exactly the reducer, in send order
    #[test]
    fn prop_store_matches_hand_applied_reducer(
        start in -100i64..100,
        actions in prop::collection::vec(action_strategy(), 0..64),
    ) {
        let initial = Tally { total: start, ..Tally::default() };

        let mut expected = initial.clone();
        for action in actions.clone() {
            let _ = TallyReducer.reduce(&mut expected, action, &());
        }

        let (actual, registered, pending) = run_through_store(initial, actions);

        prop_assert_eq!(actual, expected);
        prop_assert_eq!(registered, 0, "effect-free actions must not register anything");
        prop_assert_eq!(pending, 0);
    }
}
