//! # Tabs Demo
//!
//! One store powering two independent counters, one per tab.
//!
//! The app reducer is built from parts: each tab's [`CounterReducer`] is scoped to
//! its own field of [`AppState`] and its own case of [`AppAction`], followed by
//! the app's own (empty) logic. A timer started in one tab only ever touches that
//! tab's count. Both tabs register their timer under `CounterCancel::Timer`, but
//! each scope qualifies the key, so stopping one tab's timer leaves the other's
//! running.

use composable_core::composition::{combine_reducers, scope_reducer, CombinedReducer, Reduce};
use composable_core::{smallvec, Dependencies, Effect};
use composable_macros::Action;
use counter::{CounterAction, CounterReducer, CounterState};

/// App state: one counter per tab
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppState {
    /// First tab
    pub tab1: CounterState,
    /// Second tab
    pub tab2: CounterState,
}

/// App actions, addressed to a tab
#[derive(Action, Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    /// Action for the first tab
    Tab1(CounterAction),
    /// Action for the second tab
    Tab2(CounterAction),
}

/// The composed app reducer
pub type AppReducer = CombinedReducer<AppState, AppAction, Dependencies>;

/// Build the app reducer: both tabs, then the app's own logic
#[must_use]
pub fn app_reducer() -> AppReducer {
    combine_reducers(vec![
        Box::new(scope_reducer(
            CounterReducer,
            |state: &mut AppState| &mut state.tab1,
            AppAction::try_into_tab1,
            AppAction::Tab1,
        )),
        Box::new(scope_reducer(
            CounterReducer,
            |state: &mut AppState| &mut state.tab2,
            AppAction::try_into_tab2,
            AppAction::Tab2,
        )),
        Box::new(Reduce::new(
            |_state: &mut AppState, action: AppAction, _env: &Dependencies| {
                tracing::trace!(case = action.case_name(), "App observed tab action");
                smallvec![Effect::None]
            },
        )),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use composable_core::Reducer;

    #[test]
    fn test_actions_reach_only_their_tab() {
        let app = app_reducer();
        let deps = Dependencies::test();
        let mut state = AppState::default();

        let _ = app.reduce(&mut state, AppAction::Tab1(CounterAction::IncrementButtonTapped), &deps);
        let _ = app.reduce(&mut state, AppAction::Tab2(CounterAction::DecrementButtonTapped), &deps);
        let _ = app.reduce(&mut state, AppAction::Tab1(CounterAction::IncrementButtonTapped), &deps);

        assert_eq!(state.tab1.count, 2);
        assert_eq!(state.tab2.count, -1);
    }

    #[test]
    fn test_pure_actions_produce_no_effects() {
        let app = app_reducer();
        let mut state = AppState::default();

        let effects = app.reduce(
            &mut state,
            AppAction::Tab2(CounterAction::IncrementButtonTapped),
            &Dependencies::test(),
        );

        assert!(effects.is_empty());
    }
}
