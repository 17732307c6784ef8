// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Single-threaded cooperative scheduling.
//!
//! Each trial builds its own current-thread runtime and `LocalSet`; every
//! item becomes a local task that suspends only where the work unit awaits
//! I/O. The runtime is dropped before the strategy returns.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::runtime::Builder;
use tokio::sync::Semaphore;
use tokio::task::{JoinSet, LocalSet};

use crate::error::{TrialError, WorkError};
use crate::outcome::{skip_reason, OutcomeCollector};
use crate::types::FailurePolicy;
use crate::work::{panic_message, CallContext, WorkUnit};

use super::{BatchRun, TrialSettings};

pub(super) fn run<W: WorkUnit>(
    settings: &TrialSettings,
    batch: &Arc<[W::Input]>,
    work: &Arc<W>,
) -> Result<BatchRun<W::Output>, TrialError> {
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| TrialError::RuntimeStartFailed {
            reason: e.to_string(),
        })?;
    let local = LocalSet::new();

    let gate = settings.gate.map(|permits| Arc::new(Semaphore::new(permits)));
    let timeout = settings.timeout;
    let fail_fast = settings.policy == FailurePolicy::FailFast;

    let collector = local.block_on(&runtime, async {
        let mut tasks = JoinSet::new();
        for index in 0..batch.len() {
            let batch = Arc::clone(batch);
            let work = Arc::clone(work);
            let gate = gate.clone();
            tasks.spawn_local(async move {
                let _permit = match &gate {
                    Some(gate) => match gate.acquire().await {
                        Ok(permit) => Some(permit),
                        Err(_) => {
                            let skipped = WorkError::Skipped {
                                reason: "concurrency gate closed".to_string(),
                            };
                            return (index, Err(skipped));
                        }
                    },
                    None => None,
                };
                let input = &batch[index];
                let ctx = CallContext::new(timeout);
                let call = AssertUnwindSafe(work.call_async(input, &ctx)).catch_unwind();
                let result = match timeout {
                    Some(limit) => match tokio::time::timeout(limit, call).await {
                        Ok(caught) => flatten(caught),
                        Err(_) => Err(WorkError::timeout(limit)),
                    },
                    None => flatten(call.await),
                };
                (index, result)
            });
        }

        let mut collector = OutcomeCollector::new(batch.len());
        while let Some(joined) = tasks.join_next().await {
            // Panics are caught inside the task; a join error means it was aborted.
            let Ok((index, result)) = joined else {
                continue;
            };
            let failed = result.is_err();
            collector.record(index, &batch[index], result);
            if failed && fail_fast {
                tracing::debug!(index, "Cooperative batch aborting after failure");
                tasks.abort_all();
            }
        }
        collector
    });
    drop(local);
    drop(runtime);

    let reason = skip_reason(batch, collector.first_failure());
    let (outcomes, completion_order) = collector.finish(batch, &reason);
    Ok(BatchRun {
        outcomes,
        completion_order,
    })
}

fn flatten<O>(caught: std::thread::Result<Result<O, WorkError>>) -> Result<O, WorkError> {
    match caught {
        Ok(result) => result,
        Err(payload) => Err(WorkError::Panic {
            message: panic_message(payload.as_ref()),
        }),
    }
}
