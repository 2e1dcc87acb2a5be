//! Movie detail screen.

use crate::movie::Movie;
use composable_core::{effect::Effect, reducer::Reducer, smallvec, Dependencies, SmallVec};
use composable_macros::Action;

/// Detail state
#[derive(Debug, Clone, PartialEq)]
pub struct MovieDetailState {
    /// The movie shown
    pub movie: Movie,
}

/// Detail actions
#[derive(Action, Debug, Clone, PartialEq, Eq)]
pub enum MovieDetailAction {
    /// The screen became visible
    OnAppear,
}

/// Detail reducer
#[derive(Debug, Clone, Copy, Default)]
pub struct MovieDetailReducer;

impl Reducer for MovieDetailReducer {
    type State = MovieDetailState;
    type Action = MovieDetailAction;
    type Environment = Dependencies;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            MovieDetailAction::OnAppear => {
                tracing::debug!(id = state.movie.id, title = %state.movie.title, "Detail appeared");
                smallvec![Effect::None]
            },
        }
    }
}
