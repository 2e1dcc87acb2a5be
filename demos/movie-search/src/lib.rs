//! # Movie Search Demo
//!
//! Search-as-you-type over a movie catalogue, with a detail screen for the movie
//! the user taps.
//!
//! ## Architecture
//!
//! Every keystroke sends [`SearchAction::SearchQueryChanged`]. The search effect
//! sleeps for [`DEBOUNCE`] on the [`ClockKey`] clock before calling the
//! [`MovieSearchClient`], and is registered under [`SearchCancel::Search`] with
//! `cancel_in_flight`, so a newer keystroke cancels the older search wherever it
//! is: still debouncing, or already waiting on the client. Only the latest query
//! ever produces a [`SearchAction::SearchResponse`].
//!
//! Tapping a movie presents a [`Destination`]; [`search_reducer`] binds it to the
//! search with [`if_let`].
//!
//! ## Example
//!
//! ```no_run
//! use composable_core::Dependencies;
//! use composable_runtime::Store;
//! use movie_search::{search_reducer, SearchAction, SearchState};
//!
//! # async fn example() {
//! let store = Store::new(SearchState::default(), search_reducer(), Dependencies::live());
//! let _ = store.send(SearchAction::SearchQueryChanged("dark".to_string())).await;
//! # }
//! ```

use composable_core::dependencies::ClockKey;
use composable_core::presentation::{if_let, IfLetReducer};
use composable_core::run_effect;
use composable_core::{
    effect::Effect, reducer::Reducer, smallvec, Dependencies, PresentationAction, PresentationState,
    SmallVec,
};
use composable_macros::Action;
use std::time::Duration;

pub mod client;
pub mod detail;
pub mod movie;

pub use client::{MovieSearchClient, SearchError, SearchMoviesKey, SearchMoviesUseCase};
pub use detail::{MovieDetailAction, MovieDetailReducer, MovieDetailState};
pub use movie::Movie;

/// Quiet period after the last keystroke before a search runs
pub const DEBOUNCE: Duration = Duration::from_millis(500);

/// Search screen state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    /// Text in the search field
    pub search_query: String,
    /// Results of the latest search
    pub movies: Vec<Movie>,
    /// A search is debouncing or in flight
    pub is_loading: bool,
    /// Why the latest search failed
    pub error_message: Option<String>,
    /// Screen presented on top of the search
    pub destination: PresentationState<Destination>,
}

/// Screens the search can present
#[derive(Debug, Clone, PartialEq)]
pub enum Destination {
    /// Movie detail
    Detail(MovieDetailState),
}

/// Actions for a presented [`Destination`]
#[derive(Action, Debug, Clone, PartialEq, Eq)]
pub enum DestinationAction {
    /// Action for the detail screen
    Detail(MovieDetailAction),
}

/// Routes destination actions to the screen currently presented
#[derive(Debug, Clone, Copy, Default)]
pub struct DestinationReducer;

impl Reducer for DestinationReducer {
    type State = Destination;
    type Action = DestinationAction;
    type Environment = Dependencies;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match (state, action) {
            (Destination::Detail(detail), DestinationAction::Detail(action)) => MovieDetailReducer
                .reduce(detail, action, env)
                .into_iter()
                .map(|effect| effect.map(DestinationAction::Detail))
                .collect(),
        }
    }
}

/// Search screen actions
#[derive(Action, Debug, Clone, PartialEq)]
pub enum SearchAction {
    /// The search field changed
    SearchQueryChanged(String),
    /// Result of the search for the current query
    #[response]
    SearchResponse(Result<Vec<Movie>, SearchError>),
    /// A result row was tapped
    MovieTapped(Movie),
    /// Action from or for the presented screen
    Destination(PresentationAction<DestinationAction>),
}

/// Cancellation keys owned by the search screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchCancel {
    /// The debounced search
    Search,
}

/// The search screen's own logic, without the destination
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchReducer;

impl Reducer for SearchReducer {
    type State = SearchState;
    type Action = SearchAction;
    type Environment = Dependencies;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            SearchAction::SearchQueryChanged(query) => {
                state.search_query.clone_from(&query);
                state.error_message = None;

                if query.is_empty() {
                    state.movies.clear();
                    state.is_loading = false;
                    return smallvec![Effect::cancel(SearchCancel::Search)];
                }

                state.is_loading = true;

                let clock = env.resolve::<ClockKey>();
                let client = env.resolve::<SearchMoviesKey>();
                smallvec![run_effect!(send => {
                    clock.sleep(DEBOUNCE).await;
                    tracing::debug!(%query, "Searching");
                    let result = client.search(&query).await;
                    send.send(SearchAction::SearchResponse(result)).await;
                })
                .cancellable(SearchCancel::Search, true)]
            },
            SearchAction::SearchResponse(Ok(movies)) => {
                state.is_loading = false;
                state.movies = movies;
                state.error_message = None;
                smallvec![Effect::None]
            },
            SearchAction::SearchResponse(Err(error)) => {
                tracing::warn!(%error, query = %state.search_query, "Search failed");
                state.is_loading = false;
                state.movies.clear();
                state.error_message = Some(error.to_string());
                smallvec![Effect::None]
            },
            SearchAction::MovieTapped(movie) => {
                state
                    .destination
                    .present(Destination::Detail(MovieDetailState { movie }));
                smallvec![Effect::None]
            },
            SearchAction::Destination(_) => smallvec![Effect::None],
        }
    }
}

/// The composed search reducer
pub type SearchFeature = IfLetReducer<SearchReducer, DestinationReducer>;

/// Build the search reducer with its destination bound to it
#[must_use]
pub fn search_reducer() -> SearchFeature {
    if_let(
        SearchReducer,
        DestinationReducer,
        |state: &mut SearchState| &mut state.destination,
        SearchAction::try_into_destination,
        SearchAction::Destination,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use composable_core::CancelId;
    use composable_testing::{assertions, ReducerTest};

    #[test]
    fn test_query_starts_debounced_search() {
        ReducerTest::new(SearchReducer)
            .with_env(Dependencies::test())
            .given_state(SearchState {
                error_message: Some("No movies found.".to_string()),
                ..SearchState::default()
            })
            .when_action(SearchAction::SearchQueryChanged("dark".to_string()))
            .then_state(|state| {
                assert_eq!(state.search_query, "dark");
                assert!(state.is_loading);
                assert_eq!(state.error_message, None);
            })
            .then_effects(|effects| {
                assertions::assert_cancellable(effects, &CancelId::new(SearchCancel::Search));
                assertions::assert_has_run_effect(effects);
            })
            .run();
    }

    #[test]
    fn test_empty_query_clears_and_cancels() {
        ReducerTest::new(SearchReducer)
            .with_env(Dependencies::test())
            .given_state(SearchState {
                search_query: "d".to_string(),
                is_loading: true,
                ..SearchState::default()
            })
            .when_action(SearchAction::SearchQueryChanged(String::new()))
            .then_state(|state| {
                assert!(!state.is_loading);
                assert!(state.movies.is_empty());
            })
            .then_effects(|effects| {
                assertions::assert_cancels(effects, &CancelId::new(SearchCancel::Search));
            })
            .run();
    }

    #[test]
    fn test_failure_clears_results() {
        ReducerTest::new(SearchReducer)
            .with_env(Dependencies::test())
            .given_state(SearchState {
                is_loading: true,
                ..SearchState::default()
            })
            .when_action(SearchAction::SearchResponse(Err(SearchError::NoResults)))
            .then_state(|state| {
                assert!(!state.is_loading);
                assert_eq!(state.error_message.as_deref(), Some("No movies found."));
            })
            .run();
    }
}
