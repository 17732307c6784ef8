// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Bounded pool of worker threads sharing the process's memory.
//!
//! A fresh rayon pool is built for every trial so thread startup and
//! teardown land inside the measured window.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use crate::error::{TrialError, WorkError};
use crate::outcome::{skip_reason, OutcomeCollector};
use crate::types::{FailurePolicy, StrategyKind};
use crate::work::{guarded_call, CallContext, WorkUnit};

use super::{BatchRun, TrialSettings};

pub(super) fn run<W: WorkUnit>(
    settings: &TrialSettings,
    batch: &[W::Input],
    work: &W,
) -> Result<BatchRun<W::Output>, TrialError> {
    let width = settings
        .effective_width(batch.len())
        .map(|w| w.get())
        .unwrap_or(1);

    let pool = ThreadPoolBuilder::new()
        .num_threads(width)
        .thread_name(|i| format!("parabench-thread-{}", i))
        .build()
        .map_err(|e| TrialError::PoolStartFailed {
            strategy: StrategyKind::ThreadPool,
            reason: e.to_string(),
        })?;

    tracing::debug!(width, items = batch.len(), "Thread pool started");

    let ctx = CallContext::new(settings.timeout);
    let abort = AtomicBool::new(false);
    let collector = Mutex::new(OutcomeCollector::new(batch.len()));

    pool.install(|| {
        batch
            .par_iter()
            .enumerate()
            // One item per task, so a slow item never holds back a chunk
            .with_max_len(1)
            .for_each(|(index, input)| {
                if abort.load(Ordering::Acquire) {
                    return;
                }
                let result = guarded_call(settings.timeout, || work.call(input, &ctx));
                if result.is_err() && settings.policy == FailurePolicy::FailFast {
                    abort.store(true, Ordering::Release);
                }
                record(&collector, index, input, result);
            });
    });
    drop(pool);

    let collector = collector
        .into_inner()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let reason = skip_reason(batch, collector.first_failure());
    let (outcomes, completion_order) = collector.finish(batch, &reason);
    Ok(BatchRun {
        outcomes,
        completion_order,
    })
}

fn record<I: std::fmt::Debug, O>(
    collector: &Mutex<OutcomeCollector<O>>,
    index: usize,
    input: &I,
    result: Result<O, WorkError>,
) {
    let mut guard = collector
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.record(index, input, result);
}
