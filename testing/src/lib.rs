//! # Composable Testing
//!
//! Testing utilities and helpers for the composable reducer architecture.
//!
//! This crate provides:
//! - [`TestStore`]: exhaustive step-by-step assertions over a live Store
//! - [`ReducerTest`]: Given-When-Then tests of a single reducer call
//! - [`TestClock`]: a virtual clock advanced by hand
//! - [`FixedClock`]: a clock frozen at one instant
//! - [`assertions`]: helpers for inspecting returned effects
//!
//! ## Example
//!
//! ```ignore
//! use composable_testing::TestStore;
//!
//! #[tokio::test]
//! async fn increments() {
//!     let mut store = TestStore::new(CounterState::default(), CounterReducer, Dependencies::test());
//!
//!     store.send(CounterAction::IncrementButtonTapped, |s| s.count = 1).await;
//!     store.send(CounterAction::DecrementButtonTapped, |s| s.count = 0).await;
//!
//!     store.finish().await;
//! }
//! ```

use chrono::{DateTime, Utc};
use composable_core::environment::Clock;

/// Virtual clock driven by the test
pub mod clock;

/// Exhaustive store harness
pub mod test_store;


/// Mock implementations of environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use futures::future::BoxFuture;
    use std::time::Duration;

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible. Sleeping still
    /// uses the tokio timer.
    ///
    /// # Example
    ///
    /// ```
    /// use composable_testing::mocks::FixedClock;
    /// use composable_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }

        fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
            Box::pin(tokio::time::sleep(duration))
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(super::clock::epoch())
    }
}

/// Test helpers and utilities
pub mod helpers {
    use tracing_subscriber::EnvFilter;

    /// Install a `tracing` subscriber that writes through the test harness
    ///
    /// Honors `RUST_LOG`; defaults to `warn`. Safe to call from every test, only the
    /// first call installs anything.
    pub fn init_tracing() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    }
}

// Re-export commonly used items
pub use clock::TestClock;
pub use mocks::{test_clock, FixedClock};
pub use reducer_test::{assertions, ReducerTest};
pub use test_store::TestStore;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
        assert_eq!(time1.to_rfc3339(), "2025-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_init_tracing_twice() {
        helpers::init_tracing();
        helpers::init_tracing();
    }
}
