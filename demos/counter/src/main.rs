//! Counter demo binary
//!
//! Walks through increments, a number fact and a few timer ticks.

use composable_core::Dependencies;
use composable_runtime::{metrics::register_metrics, Store, StoreConfig};
use counter::{CounterAction, CounterReducer, CounterState, TIMER_INTERVAL};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "counter=debug,composable_runtime=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
    register_metrics();

    println!("=== Counter Demo ===\n");

    let store = Store::with_config(
        CounterState::default(),
        CounterReducer,
        Dependencies::live(),
        StoreConfig::default().with_name("counter"),
    );

    println!(">>> Sending: IncrementButtonTapped x2");
    store.send(CounterAction::IncrementButtonTapped).await?;
    store.send(CounterAction::IncrementButtonTapped).await?;
    println!("Count: {}", store.state(|s| s.count).await);

    println!("\n>>> Sending: FactButtonTapped");
    let fact = store
        .send_and_wait_for(
            CounterAction::FactButtonTapped,
            CounterAction::is_response,
            Duration::from_secs(5),
        )
        .await?;
    tracing::debug!(action = fact.case_name(), "Fact request finished");
    match store.state(|s| (s.fact.clone(), s.error_message.clone())).await {
        (Some(fact), _) => println!("Fact: {fact}"),
        (None, Some(error)) => println!("Fact failed: {error}"),
        (None, None) => println!("No fact"),
    }

    println!("\n>>> Sending: TimerToggleButtonTapped (start)");
    store.send(CounterAction::TimerToggleButtonTapped).await?;
    tokio::time::sleep(TIMER_INTERVAL * 3 + TIMER_INTERVAL / 2).await;
    println!("Count after ~3 ticks: {}", store.state(|s| s.count).await);

    println!("\n>>> Sending: TimerToggleButtonTapped (stop)");
    store.send(CounterAction::TimerToggleButtonTapped).await?;
    let stopped_at = store.state(|s| s.count).await;
    tokio::time::sleep(TIMER_INTERVAL * 2).await;
    println!(
        "Count two intervals after stopping: {} (was {stopped_at})",
        store.state(|s| s.count).await
    );

    store.shutdown(Duration::from_secs(5)).await?;
    println!("\n=== Counter Demo Complete ===");
    Ok(())
}
