//! Store Performance Benchmarks
//!
//! Measures the cost of the dispatch path:
//! - Reducer execution in isolation
//! - Store throughput (send + state read)
//! - Effect overhead, including cancellable registration and cancellation
//!
//! Run with: `cargo bench`

#![allow(missing_docs)] // Benchmarks don't need extensive docs
#![allow(clippy::expect_used)] // Benchmarks can use expect for setup

use composable_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
use composable_runtime::Store;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use std::time::Duration;

#[derive(Clone, Debug)]
struct BenchState {
    counter: i64,
    data: Vec<u8>,
}

impl Default for BenchState {
    fn default() -> Self {
        Self {
            counter: 0,
            data: vec![0; 1024], // 1KB of data
        }
    }
}

#[derive(Clone, Debug)]
enum BenchAction {
    Increment,
    SetValue(i64),
    NoOp,
    Spawn,
    SpawnCancellable,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct BenchCancel;

#[derive(Clone, Debug)]
struct BenchEnv;

#[derive(Clone)]
struct BenchReducer;

impl Reducer for BenchReducer {
    type State = BenchState;
    type Action = BenchAction;
    type Environment = BenchEnv;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            BenchAction::Increment => {
                state.counter += 1;
                smallvec![Effect::None]
            },
            BenchAction::SetValue(v) => {
                state.counter = v;
                state.data[0] = state.data[0].wrapping_add(1);
                smallvec![Effect::None]
            },
            BenchAction::NoOp => smallvec![Effect::None],
            BenchAction::Spawn => smallvec![Effect::send(BenchAction::NoOp)],
            BenchAction::SpawnCancellable => smallvec![Effect::Delay {
                duration: Duration::from_secs(60),
                action: Box::new(BenchAction::NoOp),
            }
            .cancellable(BenchCancel, true)],
            BenchAction::Cancel => smallvec![Effect::cancel(BenchCancel)],
        }
    }
}

/// Benchmark reducer execution in isolation (no Store overhead)
fn benchmark_reducer_execution(c: &mut Criterion) {
    let mut group = c.benchmark_group("reducer");
    group.throughput(Throughput::Elements(1));

    let reducer = BenchReducer;
    let env = BenchEnv;

    group.bench_function("increment", |b| {
        let mut state = BenchState::default();
        b.iter(|| {
            let _effects = reducer.reduce(&mut state, black_box(BenchAction::Increment), &env);
        });
    });

    group.bench_function("set_value", |b| {
        let mut state = BenchState::default();
        b.iter(|| {
            let _effects = reducer.reduce(&mut state, black_box(BenchAction::SetValue(42)), &env);
        });
    });

    group.finish();
}

/// Benchmark Store throughput (actions/sec)
fn benchmark_store_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_throughput");
    group.throughput(Throughput::Elements(1));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to build runtime");

    group.bench_function("send_action", |b| {
        let store = Store::new(BenchState::default(), BenchReducer, BenchEnv);

        b.to_async(&runtime).iter(|| async {
            let _ = store.send(black_box(BenchAction::Increment)).await;
        });
    });

    group.bench_function("send_and_read_state", |b| {
        let store = Store::new(BenchState::default(), BenchReducer, BenchEnv);

        b.to_async(&runtime).iter(|| async {
            let _ = store.send(black_box(BenchAction::Increment)).await;
            let _value = store.state(|s| s.counter).await;
        });
    });

    group.finish();
}

/// Benchmark effect execution overhead
fn benchmark_effect_overhead(c: &mut Criterion) {
    let mut group = c.benchmark_group("effect_overhead");
    group.throughput(Throughput::Elements(1));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to build runtime");

    group.bench_function("effect_feedback", |b| {
        let store = Store::new(BenchState::default(), BenchReducer, BenchEnv);

        b.to_async(&runtime).iter(|| async {
            if let Ok(mut handle) = store.send(black_box(BenchAction::Spawn)).await {
                handle.wait().await;
            }
        });
    });

    group.bench_function("cancellable_restart", |b| {
        let store = Store::new(BenchState::default(), BenchReducer, BenchEnv);

        b.to_async(&runtime).iter(|| async {
            let _ = store.send(black_box(BenchAction::SpawnCancellable)).await;
        });
    });

    group.bench_function("register_then_cancel", |b| {
        let store = Store::new(BenchState::default(), BenchReducer, BenchEnv);

        b.to_async(&runtime).iter(|| async {
            let _ = store.send(BenchAction::SpawnCancellable).await;
            let _ = store.send(black_box(BenchAction::Cancel)).await;
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_reducer_execution,
    benchmark_store_throughput,
    benchmark_effect_overhead
);
criterion_main!(benches);
