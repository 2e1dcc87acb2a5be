//! Store metrics.
//!
//! The Store records through the `metrics` facade; whichever recorder the host
//! application installs receives them. [`register_metrics`] attaches descriptions so
//! exporters can publish help text.
//!
//! # Example
//!
//! ```rust
//! composable_runtime::metrics::register_metrics();
//! ```

use metrics::{describe_counter, describe_histogram, Unit};
use std::time::Duration;

// Re-export metrics macros for use in other modules
pub use metrics::{counter, histogram};

/// Register all metric descriptions.
pub fn register_metrics() {
    // Dispatch
    describe_counter!("store.commands.total", "Total number of actions sent to a store");
    describe_histogram!(
        "store.reducer.duration_seconds",
        Unit::Seconds,
        "Time taken to run the reducer for one action"
    );
    describe_histogram!("store.effects.count", "Number of effects returned per action");
    describe_counter!(
        "store.actions.suppressed",
        "Effect actions dropped because their effect was cancelled first"
    );

    // Effects
    describe_counter!("store.effects.executed", "Effects started, labelled by type");
    describe_counter!("store.effects.cancelled", "Effects cancelled through their key");
    describe_counter!("store.effects.panicked", "Effect tasks that panicked");

    // Shutdown
    describe_counter!("store.shutdown.initiated", "Graceful shutdowns started");
    describe_counter!("store.shutdown.completed", "Graceful shutdowns that drained all effects");
    describe_counter!("store.shutdown.timeout", "Graceful shutdowns that timed out");
    describe_counter!(
        "store.shutdown.rejected_actions",
        "Actions rejected because the store was shutting down"
    );
}

/// Dispatch metrics recorder.
pub struct StoreMetrics;

impl StoreMetrics {
    /// Record an action entering the reducer.
    pub fn record_action(duration: Duration, effects: usize) {
        counter!("store.commands.total").increment(1);
        histogram!("store.reducer.duration_seconds").record(duration.as_secs_f64());
        // Note: Precision loss acceptable for metrics (effect counts < 2^52)
        #[allow(clippy::cast_precision_loss)]
        histogram!("store.effects.count").record(effects as f64);
    }

    /// Record an effect action dropped after cancellation.
    pub fn record_suppressed() {
        counter!("store.actions.suppressed").increment(1);
    }

    /// Record an action rejected during shutdown.
    pub fn record_rejected() {
        counter!("store.shutdown.rejected_actions").increment(1);
    }
}

/// Effect metrics recorder.
pub struct EffectMetrics;

impl EffectMetrics {
    /// Record an effect start.
    pub fn record_executed(kind: &'static str) {
        counter!("store.effects.executed", "type" => kind).increment(1);
    }

    /// Record effects cancelled through a key.
    pub fn record_cancelled(count: usize) {
        counter!("store.effects.cancelled").increment(count as u64);
    }

    /// Record an effect task panic.
    pub fn record_panic() {
        counter!("store.effects.panicked").increment(1);
    }
}
