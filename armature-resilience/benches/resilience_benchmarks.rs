//! Resilience guard benchmarks.
//!
//! Admission checks, state reads and the per-call overhead of each guard
//! and of a full pipeline.

use armature_resilience::*;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::time::Duration;

// =============================================================================
// Circuit Breaker Benchmarks
// =============================================================================

fn bench_circuit_breaker(c: &mut Criterion) {
    let mut group = c.benchmark_group("circuit_breaker");
    let runtime = tokio::runtime::Runtime::new().unwrap();

    group.bench_function("create_default", |b| {
        b.iter(|| CircuitBreaker::new(CircuitBreakerConfig::default()))
    });

    let cb = CircuitBreaker::new(CircuitBreakerConfig::default());

    group.bench_function("is_call_permitted", |b| {
        b.iter(|| black_box(cb.is_call_permitted()))
    });

    group.bench_function("state_check", |b| b.iter(|| black_box(cb.state())));

    group.bench_function("record_success", |b| b.iter(|| cb.record_success()));

    group.bench_function("record_failure", |b| {
        b.iter_batched(
            || CircuitBreaker::new(CircuitBreakerConfig::new("bench").failure_threshold(1000)),
            |cb| cb.record_failure(),
            criterion::BatchSize::SmallInput,
        )
    });

    group.bench_function("call_success", |b| {
        b.to_async(&runtime).iter(|| async {
            let result: std::result::Result<i32, ResilienceError> =
                cb.call(|| async { Ok(42) }).await;
            black_box(result)
        })
    });

    group.finish();
}

// =============================================================================
// Retry Benchmarks
// =============================================================================

fn bench_retry(c: &mut Criterion) {
    let mut group = c.benchmark_group("retry");
    let runtime = tokio::runtime::Runtime::new().unwrap();

    group.bench_function("config_default", |b| b.iter(RetryConfig::default));

    let policy = RetryPolicy::new(
        RetryConfig::new(10)
            .base_delay(Duration::from_millis(100))
            .max_delay(Duration::from_secs(30)),
    );
    for attempt in [1, 3, 5, 10] {
        group.bench_with_input(
            BenchmarkId::new("delay_for_attempt", attempt),
            &attempt,
            |b, &attempt| b.iter(|| policy.delay_for_attempt(black_box(attempt))),
        );
    }

    group.bench_function("execute_first_try", |b| {
        b.to_async(&runtime).iter(|| async {
            let result: std::result::Result<i32, ResilienceError> =
                policy.execute(|| async { Ok(42) }).await;
            black_box(result)
        })
    });

    group.finish();
}

// =============================================================================
// Rate Limiter Benchmarks
// =============================================================================

fn bench_rate_limiter(c: &mut Criterion) {
    let mut group = c.benchmark_group("rate_limiter");

    let limiter = RateLimiter::new(RateLimiterConfig::new("bench", 1_000_000.0, 1_000_000.0));

    group.bench_function("try_acquire", |b| {
        b.iter(|| black_box(limiter.try_acquire()))
    });

    group.bench_function("available_tokens", |b| {
        b.iter(|| black_box(limiter.available_tokens()))
    });

    let empty = RateLimiter::new(RateLimiterConfig::new("empty", 1.0, 0.001));
    let _ = empty.try_acquire();
    group.bench_function("acquire_rejected", |b| b.iter(|| black_box(empty.acquire())));

    group.finish();
}

// =============================================================================
// Bulkhead Benchmarks
// =============================================================================

fn bench_bulkhead(c: &mut Criterion) {
    let mut group = c.benchmark_group("bulkhead");
    let runtime = tokio::runtime::Runtime::new().unwrap();

    group.bench_function("create", |b| {
        b.iter(|| Bulkhead::new(BulkheadConfig::new("test", 10)))
    });

    let bulkhead = Bulkhead::new(BulkheadConfig::new("test", 100));
    group.bench_function("stats", |b| b.iter(|| black_box(bulkhead.stats())));

    for concurrency in [10, 50, 100] {
        let bulkhead = Bulkhead::new(BulkheadConfig::new("test", concurrency));

        group.bench_with_input(
            BenchmarkId::new("call_success", concurrency),
            &concurrency,
            |b, _| {
                b.to_async(&runtime).iter(|| async {
                    let _: std::result::Result<i32, ResilienceError> =
                        bulkhead.call(|| async { Ok(42) }).await;
                })
            },
        );
    }

    group.finish();
}

// =============================================================================
// Time Limiter Benchmarks
// =============================================================================

fn bench_time_limiter(c: &mut Criterion) {
    let mut group = c.benchmark_group("time_limiter");
    let runtime = tokio::runtime::Runtime::new().unwrap();

    group.bench_function("create", |b| {
        b.iter(|| TimeLimiter::with_timeout(Duration::from_secs(5)))
    });

    let limiter = TimeLimiter::with_timeout(Duration::from_secs(10));
    group.bench_function("run_fast_operation", |b| {
        b.to_async(&runtime).iter(|| async {
            let _: std::result::Result<i32, ResilienceError> =
                limiter.run(|| async { Ok(42) }).await;
        })
    });

    group.finish();
}

// =============================================================================
// Fallback Benchmarks
// =============================================================================

fn bench_fallback(c: &mut Criterion) {
    let mut group = c.benchmark_group("fallback");
    let runtime = tokio::runtime::Runtime::new().unwrap();

    let fallback = Fallback::<String, ResilienceError>::value("fallback".to_string());

    group.bench_function("fallback_not_needed", |b| {
        b.to_async(&runtime).iter(|| async {
            let result = fallback.call(|| async { Ok("primary".to_string()) }).await;
            black_box(result)
        })
    });

    group.bench_function("fallback_needed", |b| {
        b.to_async(&runtime).iter(|| async {
            let result = fallback
                .call(|| async { Err(ResilienceError::circuit_open("bench")) })
                .await;
            black_box(result)
        })
    });

    group.finish();
}

// =============================================================================
// Pipeline Benchmarks
// =============================================================================

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    let runtime = tokio::runtime::Runtime::new().unwrap();

    let pipeline = ResiliencePipeline::<i32, ResilienceError>::builder("bench")
        .fallback(Fallback::value(0))
        .rate_limiter(RateLimiter::new(RateLimiterConfig::new(
            "bench",
            1_000_000.0,
            1_000_000.0,
        )))
        .bulkhead(Bulkhead::new(BulkheadConfig::new("bench", 100)))
        .circuit_breaker(CircuitBreaker::new(CircuitBreakerConfig::new("bench")))
        .retry(RetryPolicy::new(RetryConfig::new(3)))
        .time_limiter(TimeLimiter::with_timeout(Duration::from_secs(30)))
        .build();

    group.bench_function("full_stack_overhead", |b| {
        b.to_async(&runtime).iter(|| async {
            black_box(pipeline.execute(|| async { Ok(42) }).await)
        })
    });

    group.finish();
}

criterion_group!(
    resilience_benches,
    bench_circuit_breaker,
    bench_retry,
    bench_rate_limiter,
    bench_bulkhead,
    bench_time_limiter,
    bench_fallback,
    bench_pipeline,
);

criterion_main!(resilience_benches);
