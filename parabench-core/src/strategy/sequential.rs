// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! One item at a time on the calling thread.

use crate::outcome::{skip_reason, OutcomeCollector};
use crate::types::FailurePolicy;
use crate::work::{guarded_call, CallContext, WorkUnit};

use super::{BatchRun, TrialSettings};

pub(super) fn run<W: WorkUnit>(
    settings: &TrialSettings,
    batch: &[W::Input],
    work: &W,
) -> BatchRun<W::Output> {
    let ctx = CallContext::new(settings.timeout);
    let mut collector = OutcomeCollector::new(batch.len());

    for (index, input) in batch.iter().enumerate() {
        if settings.policy == FailurePolicy::FailFast && collector.first_failure().is_some() {
            break;
        }
        let result = guarded_call(settings.timeout, || work.call(input, &ctx));
        if let Err(error) = &result {
            tracing::debug!(index, input = ?input, error = %error, "Sequential item failed");
        }
        collector.record(index, input, result);
    }

    let reason = skip_reason(batch, collector.first_failure());
    let (outcomes, completion_order) = collector.finish(batch, &reason);
    BatchRun {
        outcomes,
        completion_order,
    }
}
