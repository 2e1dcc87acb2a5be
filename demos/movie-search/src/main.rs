//! Movie search demo binary
//!
//! Types a query one keystroke at a time, faster than the debounce, then opens the
//! best result.

use composable_core::Dependencies;
use composable_runtime::{Store, StoreConfig};
use movie_search::{search_reducer, Destination, SearchAction, SearchState};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Delay between simulated keystrokes
const KEYSTROKE: Duration = Duration::from_millis(120);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "movie_search=debug,composable_runtime=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("=== Movie Search Demo ===\n");

    let store = Store::with_config(
        SearchState::default(),
        search_reducer(),
        Dependencies::live(),
        StoreConfig::default().with_name("movie_search"),
    );

    let query = "the";
    let mut typed = String::new();
    let mut chars = query.chars().peekable();
    while let Some(ch) = chars.next() {
        typed.push(ch);
        println!(">>> Query: {typed:?}");
        if chars.peek().is_some() {
            store.send(SearchAction::SearchQueryChanged(typed.clone())).await?;
            tokio::time::sleep(KEYSTROKE).await;
        } else {
            store
                .send_and_wait_for(
                    SearchAction::SearchQueryChanged(typed.clone()),
                    SearchAction::is_response,
                    Duration::from_secs(5),
                )
                .await?;
        }
    }

    let (movies, error) = store.state(|s| (s.movies.clone(), s.error_message.clone())).await;
    if let Some(error) = error {
        println!("\nSearch failed: {error}");
    }
    println!("\nResults:");
    for movie in &movies {
        println!(
            "  {:<28} {:.1}/5  {}",
            movie.title,
            movie.normalized_rating(),
            movie.poster_url().unwrap_or_default()
        );
    }

    if let Some(best) = movies.first().cloned() {
        println!("\n>>> Opening {}", best.title);
        store.send(SearchAction::MovieTapped(best)).await?;
        let showing = store
            .state(|s| match s.destination.as_ref() {
                Some(Destination::Detail(detail)) => Some(detail.movie.title.clone()),
                None => None,
            })
            .await;
        println!("Detail showing: {}", showing.unwrap_or_default());
    }

    store.shutdown(Duration::from_secs(5)).await?;
    println!("\n=== Movie Search Demo Complete ===");
    Ok(())
}
