//! A clock that only moves when the test says so.
//!
//! Effects sleep on the [`Clock`] they resolve from their dependencies. Handing them
//! a [`TestClock`] makes debounces and timers deterministic: nothing wakes until
//! [`TestClock::advance`] moves virtual time past its deadline.
//!
//! ```ignore
//! let clock = TestClock::new();
//! let deps = Dependencies::test().with(|d| {
//!     d.set::<ClockKey>(Arc::new(clock.clone()));
//! });
//!
//! store.send(CounterAction::TimerToggleButtonTapped, |s| s.is_timer_running = true).await;
//! clock.advance(Duration::from_secs(1)).await;
//! store.receive(|a| matches!(a, CounterAction::TimerTick), |s| s.count = 1).await;
//! ```

use chrono::{DateTime, TimeDelta, Utc};
use composable_core::environment::Clock;
use futures::future::BoxFuture;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;

/// Yields handed to the scheduler after each wake-up so woken tasks can run.
const SETTLE_YIELDS: usize = 32;

/// 2025-01-01T00:00:00Z
pub(crate) fn epoch() -> DateTime<Utc> {
    DateTime::from_timestamp(1_735_689_600, 0).unwrap_or_default()
}

struct Sleeper {
    deadline: Duration,
    seq: u64,
    wake: oneshot::Sender<()>,
}

struct ClockState {
    start: DateTime<Utc>,
    elapsed: Duration,
    next_seq: u64,
    sleepers: Vec<Sleeper>,
}

/// Manually advanced virtual clock
///
/// Clones share the same timeline.
#[derive(Clone)]
pub struct TestClock {
    inner: Arc<Mutex<ClockState>>,
}

impl TestClock {
    /// A clock starting at 2025-01-01 00:00:00 UTC
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(epoch())
    }

    /// A clock starting at `start`
    #[must_use]
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ClockState {
                start,
                elapsed: Duration::ZERO,
                next_seq: 0,
                sleepers: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ClockState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Virtual time elapsed since the clock was created
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.lock().elapsed
    }

    /// Number of sleeps still waiting on this clock
    #[must_use]
    pub fn pending_sleepers(&self) -> usize {
        let mut state = self.lock();
        state.sleepers.retain(|s| !s.wake.is_closed());
        state.sleepers.len()
    }

    /// Move virtual time forward by `by`
    ///
    /// Every sleep whose deadline falls inside the window wakes in deadline order
    /// (ties in the order they started), with the clock reading that deadline. Woken
    /// tasks get to run before the next one fires, so a timer that re-arms inside
    /// the window fires again.
    pub async fn advance(&self, by: Duration) {
        let target = self.elapsed() + by;

        loop {
            settle().await;

            let due = {
                let mut state = self.lock();
                state.sleepers.retain(|s| !s.wake.is_closed());

                let next = state
                    .sleepers
                    .iter()
                    .enumerate()
                    .filter(|(_, s)| s.deadline <= target)
                    .min_by_key(|(_, s)| (s.deadline, s.seq))
                    .map(|(idx, _)| idx);

                match next {
                    Some(idx) => {
                        let sleeper = state.sleepers.swap_remove(idx);
                        state.elapsed = state.elapsed.max(sleeper.deadline);
                        Some(sleeper)
                    },
                    None => {
                        state.elapsed = target;
                        None
                    },
                }
            };

            let Some(sleeper) = due else { break };
            tracing::trace!(deadline = ?sleeper.deadline, "TestClock waking sleeper");
            let _ = sleeper.wake.send(());
        }

        settle().await;
    }

    /// Let spawned tasks run without moving time
    pub async fn run_pending(&self) {
        settle().await;
    }
}

impl Default for TestClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TestClock {
    fn now(&self) -> DateTime<Utc> {
        let state = self.lock();
        TimeDelta::from_std(state.elapsed)
            .ok()
            .and_then(|delta| state.start.checked_add_signed(delta))
            .unwrap_or(state.start)
    }

    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        if duration.is_zero() {
            return Box::pin(futures::future::ready(()));
        }

        let (wake, woken) = oneshot::channel();
        {
            let mut state = self.lock();
            let seq = state.next_seq;
            state.next_seq += 1;
            let deadline = state.elapsed + duration;
            state.sleepers.push(Sleeper { deadline, seq, wake });
        }

        Box::pin(async move {
            if woken.await.is_err() {
                // Clock dropped: the deadline can never be reached
                futures::future::pending::<()>().await;
            }
        })
    }
}

impl fmt::Debug for TestClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("TestClock")
            .field("elapsed", &state.elapsed)
            .field("sleepers", &state.sleepers.len())
            .finish()
    }
}

async fn settle() {
    for _ in 0..SETTLE_YIELDS {
        tokio::task::yield_now().await;
    }
}
