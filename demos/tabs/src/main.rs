//! Tabs demo binary
//!
//! Drives both tabs through one store and shows that their state stays apart.

use composable_core::Dependencies;
use composable_runtime::{Store, StoreConfig};
use counter::CounterAction;
use std::time::Duration;
use tabs::{app_reducer, AppAction, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tabs=debug,composable_runtime=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("=== Tabs Demo ===\n");

    let store = Store::with_config(
        AppState::default(),
        app_reducer(),
        Dependencies::live(),
        StoreConfig::default().with_name("tabs"),
    );

    for action in [
        AppAction::Tab1(CounterAction::IncrementButtonTapped),
        AppAction::Tab1(CounterAction::IncrementButtonTapped),
        AppAction::Tab2(CounterAction::DecrementButtonTapped),
    ] {
        println!(">>> Sending: {action:?}");
        store.send(action).await?;
    }

    let mut handle = store.send(AppAction::Tab2(CounterAction::FactButtonTapped)).await?;
    handle.wait_with_timeout(Duration::from_secs(5)).await?;

    let (tab1, tab2) = store.state(|s| (s.tab1.clone(), s.tab2.clone())).await;
    println!("\nTab 1 count: {}", tab1.count);
    println!("Tab 2 count: {} ({})", tab2.count, tab2.fact.as_deref().unwrap_or("no fact"));

    store.shutdown(Duration::from_secs(5)).await?;
    println!("\n=== Tabs Demo Complete ===");
    Ok(())
}
