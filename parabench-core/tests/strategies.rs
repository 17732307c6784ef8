//! End-to-end trials through the public runner API.
//!
//! Process-pool trials need a worker binary and are covered by the CLI's
//! integration tests.

use std::collections::HashSet;
use std::time::Duration;

use parabench_core::{
    BenchmarkRunner, CallContext, FailurePolicy, ItemOutcome, StrategyConfig, StrategyKind,
    TrialError, TrialOutcome, WorkError, WorkFuture, WorkUnit,
};

#[derive(Debug)]
struct Primality;

impl WorkUnit for Primality {
    type Input = u64;
    type Output = bool;

    fn name(&self) -> &str {
        "primality"
    }

    fn call(&self, n: &u64, _ctx: &CallContext) -> Result<bool, WorkError> {
        let n = *n;
        if n < 2 {
            return Ok(false);
        }
        Ok((2..).take_while(|d| d * d <= n).all(|d| n % d != 0))
    }
}

/// Fails on one marked input, panics on another.
struct Flaky;

impl WorkUnit for Flaky {
    type Input = i64;
    type Output = i64;

    fn name(&self) -> &str {
        "flaky"
    }

    fn call(&self, n: &i64, _ctx: &CallContext) -> Result<i64, WorkError> {
        match *n {
            -1 => Err(WorkError::failed("connection refused")),
            -2 => panic!("unit exploded on {}", n),
            n => Ok(n * 10),
        }
    }
}

/// Sleeps for the given number of milliseconds, blocking or suspending.
struct Nap;

impl WorkUnit for Nap {
    type Input = u64;
    type Output = u64;

    fn name(&self) -> &str {
        "nap"
    }

    fn call(&self, ms: &u64, _ctx: &CallContext) -> Result<u64, WorkError> {
        std::thread::sleep(Duration::from_millis(*ms));
        Ok(*ms)
    }

    fn call_async<'a>(&'a self, ms: &'a u64, _ctx: &'a CallContext) -> WorkFuture<'a, u64> {
        Box::pin(async move {
            tokio::time::sleep(Duration::from_millis(*ms)).await;
            Ok(*ms)
        })
    }
}

fn local_strategies() -> Vec<StrategyConfig> {
    vec![
        StrategyConfig::sequential(),
        StrategyConfig::thread_pool().with_width(2),
        StrategyConfig::cooperative(),
    ]
}

#[test]
fn primes_agree_under_every_local_strategy() {
    let runner =
        BenchmarkRunner::new(Primality, vec![4, 7, 9, 11]).strategies(local_strategies());

    let records = runner.run();
    assert_eq!(records.len(), 3);

    for record in &records {
        let result = record
            .result()
            .unwrap_or_else(|| panic!("{} aborted: {:?}", record.label, record.error()));
        assert_eq!(result.len(), 4);
        assert_eq!(result.failed(), 0);
        let values: Vec<Option<&bool>> = result.values();
        assert_eq!(
            values,
            vec![Some(&false), Some(&true), Some(&false), Some(&true)]
        );

        let seen: HashSet<usize> = result.completion_order().iter().copied().collect();
        assert_eq!(seen.len(), 4);
    }
}

#[test]
fn one_failing_item_is_recorded_and_siblings_finish() {
    let runner = BenchmarkRunner::new(Flaky, vec![1, -1, 2, 3]).strategies([
        StrategyConfig::sequential().with_policy(FailurePolicy::Isolate),
        StrategyConfig::thread_pool().with_width(4),
        StrategyConfig::cooperative(),
    ]);

    for record in runner.run() {
        let result = record.result().expect("trial should complete");
        assert_eq!(result.succeeded(), 3, "{}", record.label);
        assert_eq!(result.failed(), 1, "{}", record.label);

        let failure = result.failures().next().unwrap();
        assert_eq!(failure.index, 1);
        assert_eq!(failure.input, "-1");
        assert_eq!(failure.error, WorkError::failed("connection refused"));
        assert_eq!(
            failure.to_string(),
            "-1 generated an exception: connection refused"
        );
    }
}

#[test]
fn sequential_fails_fast_by_default() {
    let runner = BenchmarkRunner::new(Flaky, vec![1, -1, 2, 3])
        .strategy(StrategyConfig::sequential());

    let records = runner.run();
    let result = records[0].result().unwrap();

    // Every input still has an outcome.
    assert_eq!(result.len(), 4);
    assert_eq!(result.succeeded(), 1);
    assert_eq!(result.failed(), 3);
    // Skipped slots are appended after the items that actually ran.
    assert_eq!(result.completion_order(), &[0, 1, 2, 3]);
    for index in [2, 3] {
        match result.outcome(index) {
            Some(ItemOutcome::Failure(record)) => {
                assert!(matches!(record.error, WorkError::Skipped { .. }));
                assert!(record.error.to_string().contains("-1"));
            }
            other => panic!("expected skipped item, got {:?}", other),
        }
    }
}

#[test]
fn panics_are_item_failures() {
    let runner = BenchmarkRunner::new(Flaky, vec![5, -2, 6]).strategies([
        StrategyConfig::sequential().with_policy(FailurePolicy::Isolate),
        StrategyConfig::thread_pool().with_width(2),
        StrategyConfig::cooperative(),
    ]);

    for record in runner.run() {
        let result = record.result().expect("panic must not abort the trial");
        assert_eq!(result.succeeded(), 2);
        let failure = result.failures().next().unwrap();
        assert_eq!(failure.index, 1);
        match &failure.error {
            WorkError::Panic { message } => assert!(message.contains("exploded")),
            other => panic!("expected panic failure, got {:?}", other),
        }
    }
}

#[test]
fn empty_batch_yields_empty_results() {
    let runner = BenchmarkRunner::new(Primality, Vec::new())
        .strategies(local_strategies())
        .widths([1, 2]);

    for record in runner.run() {
        let result = record.result().expect("empty batch must complete");
        assert!(result.is_empty());
        assert_eq!(result.failed(), 0);
        assert!(result.completion_order().is_empty());
    }
}

#[test]
fn invalid_width_rejects_only_its_trial() {
    let runner = BenchmarkRunner::new(Primality, vec![4, 7])
        .strategy(StrategyConfig::thread_pool())
        .strategy(StrategyConfig::sequential())
        .widths([0, 2, -3]);

    let records = runner.run();
    assert_eq!(records.len(), 4);

    let aborted: Vec<Option<i64>> = records
        .iter()
        .filter(|r| !r.is_completed())
        .map(|r| r.label.width)
        .collect();
    assert_eq!(aborted, vec![Some(0), Some(-3)]);

    for record in records.iter().filter(|r| !r.is_completed()) {
        assert!(matches!(record.error(), Some(TrialError::Configuration(_))));
        assert_eq!(record.elapsed, Duration::ZERO);
    }

    assert_eq!(records.iter().filter(|r| r.is_completed()).count(), 2);
}

#[test]
fn runs_are_repeatable_and_leave_inputs_untouched() {
    let inputs = vec![2, 15, 17, 21, 23, 1_000_003];
    let runner = BenchmarkRunner::new(Primality, inputs.clone()).strategies(local_strategies());

    let first: Vec<Vec<Option<bool>>> = runner
        .run()
        .iter()
        .map(|r| r.result().unwrap().values().into_iter().map(|v| v.copied()).collect())
        .collect();
    let second: Vec<Vec<Option<bool>>> = runner
        .run()
        .iter()
        .map(|r| r.result().unwrap().values().into_iter().map(|v| v.copied()).collect())
        .collect();

    assert_eq!(first, second);
    assert!(first.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(runner.inputs(), inputs.as_slice());
}

#[test]
fn cooperative_timeout_fails_only_slow_items() {
    let runner = BenchmarkRunner::new(Nap, vec![5, 2_000, 5]).strategy(
        StrategyConfig::cooperative().with_timeout(Duration::from_millis(100)),
    );

    let records = runner.run();
    let result = records[0].result().unwrap();
    assert_eq!(result.succeeded(), 2);
    let failure = result.failures().next().unwrap();
    assert_eq!(failure.index, 1);
    assert_eq!(failure.error, WorkError::Timeout { limit_ms: 100 });
    assert!(records[0].elapsed < Duration::from_secs(2));
}

#[test]
fn cooperative_tasks_overlap_while_suspended() {
    let runner =
        BenchmarkRunner::new(Nap, vec![200; 5]).strategy(StrategyConfig::cooperative());

    let records = runner.run();
    assert_eq!(records[0].result().unwrap().succeeded(), 5);
    // Five 200ms naps in well under their serial sum.
    assert!(records[0].elapsed < Duration::from_millis(800));
}

#[test]
fn cooperative_gate_bounds_in_flight_tasks() {
    let runner = BenchmarkRunner::new(Nap, vec![100; 4])
        .strategy(StrategyConfig::cooperative().with_gate(1));

    let records = runner.run();
    assert_eq!(records[0].result().unwrap().succeeded(), 4);
    assert!(records[0].elapsed >= Duration::from_millis(400));
}

#[test]
fn wider_thread_pools_finish_blocking_work_sooner() {
    let runner = BenchmarkRunner::new(Nap, vec![100; 4])
        .strategy(StrategyConfig::thread_pool())
        .widths([1, 2, 4]);

    let records = runner.run();
    let elapsed: Vec<Duration> = records.iter().map(|r| r.elapsed).collect();
    assert_eq!(elapsed.len(), 3);

    let tolerance = Duration::from_millis(50);
    assert!(elapsed[1] <= elapsed[0] + tolerance, "{:?}", elapsed);
    assert!(elapsed[2] <= elapsed[1] + tolerance, "{:?}", elapsed);
    assert!(elapsed[0] >= Duration::from_millis(400));
}

#[test]
fn thread_pool_fail_fast_skips_queued_items() {
    let mut inputs = vec![-1];
    inputs.extend(1..=50);
    let runner = BenchmarkRunner::new(Flaky, inputs).strategy(
        StrategyConfig::thread_pool()
            .with_width(1)
            .with_policy(FailurePolicy::FailFast),
    );

    let records = runner.run();
    let result = records[0].result().unwrap();
    assert_eq!(result.len(), 51);
    let skipped = result
        .failures()
        .filter(|f| matches!(f.error, WorkError::Skipped { .. }))
        .count();
    assert!(skipped > 0);
    assert_eq!(result.succeeded() + result.failed(), 51);
}

#[test]
fn summaries_count_successes_and_failures() {
    let runner = BenchmarkRunner::new(Flaky, vec![1, -1, 2])
        .strategy(StrategyConfig::new(StrategyKind::ThreadPool).with_width(3));

    let summary = runner.run()[0].summary();
    assert_eq!(summary.label.strategy, StrategyKind::ThreadPool);
    assert_eq!(summary.label.width, Some(3));
    assert_eq!(summary.items, 3);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 1);
    assert!(!summary.is_aborted());
    assert_eq!(summary.failures.len(), 1);
    assert!(matches!(
        runner.run()[0].outcome,
        TrialOutcome::Completed(_)
    ));
}
