//! Movie search client.
//!
//! Three layers, each behind a trait so tests can replace any of them:
//!
//! - [`MovieDataSource`] fetches raw TMDB results ([`MockTmdbDataSource`] serves an
//!   embedded payload after a simulated network delay)
//! - [`MovieRepository`] turns those results into [`Movie`]s
//! - [`SearchMoviesUseCase`] applies the search rules and is what the feature talks
//!   to, as a [`MovieSearchClient`] resolved through [`SearchMoviesKey`]

use crate::movie::{Movie, MovieDto, MovieSearchResponseDto};
use composable_core::environment::{Clock, SystemClock};
use composable_core::DependencyKey;
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Simulated round trip of the mock data source
pub const MOCK_LATENCY: Duration = Duration::from_millis(500);

/// Shortest query the use case will run
pub const MIN_QUERY_LEN: usize = 2;

const SEARCH_FIXTURE: &str = include_str!("fixtures/search_movies.json");

/// Why a search produced no movies
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// Transport failure
    #[error("Check your network connection.")]
    Network,

    /// The response could not be decoded
    #[error("Something went wrong while reading the results.")]
    Decoding,

    /// The query is empty or too short
    #[error("Enter at least {MIN_QUERY_LEN} characters to search.")]
    InvalidQuery,

    /// Nothing matched
    #[error("No movies found.")]
    NoResults,
}

/// Raw TMDB search
pub trait MovieDataSource: Send + Sync {
    /// Results whose title matches `query`
    fn search_movies(&self, query: &str) -> BoxFuture<'static, Result<Vec<MovieDto>, SearchError>>;
}

/// Serves an embedded TMDB response, filtered by case-insensitive title match
pub struct MockTmdbDataSource {
    clock: Arc<dyn Clock>,
    latency: Duration,
}

impl MockTmdbDataSource {
    /// Answer after `latency` on `clock`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, latency: Duration) -> Self {
        Self { clock, latency }
    }

    /// Answer immediately
    #[must_use]
    pub fn instant() -> Self {
        Self::new(Arc::new(SystemClock), Duration::ZERO)
    }

    fn decode(query: &str) -> Result<Vec<MovieDto>, SearchError> {
        let response: MovieSearchResponseDto = serde_json::from_str(SEARCH_FIXTURE).map_err(|error| {
            tracing::error!(%error, "Failed to decode search fixture");
            SearchError::Decoding
        })?;

        let needle = query.to_lowercase();
        Ok(response
            .results
            .into_iter()
            .filter(|movie| movie.title.to_lowercase().contains(&needle))
            .collect())
    }
}

impl Default for MockTmdbDataSource {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock), MOCK_LATENCY)
    }
}

impl MovieDataSource for MockTmdbDataSource {
    fn search_movies(&self, query: &str) -> BoxFuture<'static, Result<Vec<MovieDto>, SearchError>> {
        let delay = self.clock.sleep(self.latency);
        let query = query.to_string();
        Box::pin(async move {
            delay.await;
            Self::decode(&query)
        })
    }
}

/// Movie lookup in domain terms
pub trait MovieRepository: Send + Sync {
    /// Movies whose title matches `query`
    fn search_movies(&self, query: &str) -> BoxFuture<'static, Result<Vec<Movie>, SearchError>>;
}

/// [`MovieRepository`] over a [`MovieDataSource`]
pub struct DataSourceRepository<D> {
    data_source: D,
}

impl<D: MovieDataSource> DataSourceRepository<D> {
    /// Wrap `data_source`
    #[must_use]
    pub const fn new(data_source: D) -> Self {
        Self { data_source }
    }
}

impl<D: MovieDataSource> MovieRepository for DataSourceRepository<D> {
    fn search_movies(&self, query: &str) -> BoxFuture<'static, Result<Vec<Movie>, SearchError>> {
        let fetch = self.data_source.search_movies(query);
        Box::pin(async move {
            let dtos = fetch.await?;
            Ok(dtos.into_iter().map(Movie::from).collect())
        })
    }
}

/// What the search feature depends on
pub trait MovieSearchClient: Send + Sync {
    /// Run a search for `query`
    fn search(&self, query: &str) -> BoxFuture<'static, Result<Vec<Movie>, SearchError>>;
}

/// The search rules
///
/// - the trimmed query must be at least [`MIN_QUERY_LEN`] characters
/// - an empty result is [`SearchError::NoResults`]
/// - results are ordered by vote average, best first
#[derive(Clone)]
pub struct SearchMoviesUseCase {
    repository: Arc<dyn MovieRepository>,
}

impl SearchMoviesUseCase {
    /// Search through `repository`
    #[must_use]
    pub fn new(repository: Arc<dyn MovieRepository>) -> Self {
        Self { repository }
    }
}

impl MovieSearchClient for SearchMoviesUseCase {
    fn search(&self, query: &str) -> BoxFuture<'static, Result<Vec<Movie>, SearchError>> {
        let trimmed = query.trim();
        if trimmed.chars().count() < MIN_QUERY_LEN {
            return Box::pin(futures::future::ready(Err(SearchError::InvalidQuery)));
        }

        let fetch = self.repository.search_movies(trimmed);
        Box::pin(async move {
            let mut movies = fetch.await?;
            if movies.is_empty() {
                return Err(SearchError::NoResults);
            }
            movies.sort_by(|a, b| b.vote_average.total_cmp(&a.vote_average));
            Ok(movies)
        })
    }
}

/// Dependency key for the movie search client
#[derive(Debug)]
pub struct SearchMoviesKey;

impl DependencyKey for SearchMoviesKey {
    type Value = Arc<dyn MovieSearchClient>;

    fn live_value() -> Self::Value {
        Arc::new(SearchMoviesUseCase::new(Arc::new(DataSourceRepository::new(
            MockTmdbDataSource::default(),
        ))))
    }

    fn test_value() -> Self::Value {
        Arc::new(SearchMoviesUseCase::new(Arc::new(DataSourceRepository::new(
            MockTmdbDataSource::instant(),
        ))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn use_case() -> SearchMoviesUseCase {
        SearchMoviesUseCase::new(Arc::new(DataSourceRepository::new(MockTmdbDataSource::instant())))
    }

    struct Failing;

    impl MovieDataSource for Failing {
        fn search_movies(&self, _query: &str) -> BoxFuture<'static, Result<Vec<MovieDto>, SearchError>> {
            Box::pin(async { Err(SearchError::Network) })
        }
    }

    #[tokio::test]
    async fn test_matches_titles_case_insensitively() {
        let movies = use_case().search("DARK").await.unwrap();
        let titles: Vec<_> = movies.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["The Dark Knight"]);
    }

    #[tokio::test]
    async fn test_results_sorted_by_vote_average() {
        let movies = use_case().search("  in ").await.unwrap();
        let votes: Vec<_> = movies.iter().map(|m| m.vote_average).collect();

        assert!(votes.len() > 1);
        assert!(votes.windows(2).all(|pair| pair[0] >= pair[1]));
    }

    #[tokio::test]
    async fn test_short_or_blank_query_is_invalid() {
        assert_eq!(use_case().search("").await, Err(SearchError::InvalidQuery));
        assert_eq!(use_case().search("   ").await, Err(SearchError::InvalidQuery));
        assert_eq!(use_case().search(" a ").await, Err(SearchError::InvalidQuery));
    }

    #[tokio::test]
    async fn test_no_match_is_no_results() {
        assert_eq!(use_case().search("zzz").await, Err(SearchError::NoResults));
    }

    #[tokio::test]
    async fn test_data_source_errors_pass_through() {
        let use_case = SearchMoviesUseCase::new(Arc::new(DataSourceRepository::new(Failing)));
        assert_eq!(use_case.search("godfather").await, Err(SearchError::Network));
    }

    #[test]
    fn test_fixture_decodes() {
        assert_eq!(MockTmdbDataSource::decode("").map(|m| m.len()), Ok(5));
    }
}
