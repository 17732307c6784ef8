// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Execution strategies.
//!
//! Every variant takes the same batch and work unit and returns one outcome
//! per input. The variant is picked by [`StrategyKind`] and dispatched with a
//! `match`; there is no runtime type inspection.

mod cooperative;
mod process_pool;
mod sequential;
mod thread_pool;

use std::sync::Arc;
use std::time::Duration;

use crate::error::TrialError;
use crate::outcome::ItemOutcome;
use crate::types::{FailurePolicy, StrategyKind, Width};
use crate::work::{RemoteCodec, WorkUnit};

pub use process_pool::WorkerCommand;

/// Fully validated parameters for one trial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialSettings {
    pub strategy: StrategyKind,
    /// Pool width; `None` picks the strategy default
    pub width: Option<Width>,
    pub policy: FailurePolicy,
    /// Per-call timeout
    pub timeout: Option<Duration>,
    /// Cooperative in-flight limit
    pub gate: Option<usize>,
}

impl TrialSettings {
    pub fn new(strategy: StrategyKind) -> Self {
        Self {
            strategy,
            width: None,
            policy: strategy.default_policy(),
            timeout: None,
            gate: None,
        }
    }

    /// Width actually used for a batch of `batch_len` items.
    pub fn effective_width(&self, batch_len: usize) -> Option<Width> {
        match self.strategy {
            StrategyKind::ThreadPool => {
                Some(self.width.unwrap_or_else(|| default_thread_width(batch_len)))
            }
            StrategyKind::ProcessPool => Some(self.width.unwrap_or_else(default_process_width)),
            StrategyKind::Sequential | StrategyKind::Cooperative => None,
        }
    }
}

/// Default thread count: the batch size, capped at `min(32, cpus + 4)`.
pub fn default_thread_width(batch_len: usize) -> Width {
    let cap = (num_cpus::get() + 4).min(32);
    Width::clamped(batch_len.clamp(1, cap))
}

/// Default process count: one per CPU.
pub fn default_process_width() -> Width {
    Width::clamped(num_cpus::get())
}

/// Outcomes of a strategy run, before timing is attached.
pub(crate) struct BatchRun<O> {
    pub(crate) outcomes: Vec<ItemOutcome<O>>,
    pub(crate) completion_order: Vec<usize>,
}

/// Process-pool requirements captured at configuration time.
pub(crate) struct RemoteSetup<'a, W: WorkUnit> {
    pub(crate) codec: RemoteCodec<W>,
    pub(crate) command: &'a WorkerCommand,
}

/// Run one batch under the given settings.
pub(crate) fn execute<W: WorkUnit>(
    settings: &TrialSettings,
    batch: &Arc<[W::Input]>,
    work: &Arc<W>,
    remote: Option<RemoteSetup<'_, W>>,
) -> Result<BatchRun<W::Output>, TrialError> {
    match settings.strategy {
        StrategyKind::Sequential => Ok(sequential::run(settings, batch, work.as_ref())),
        StrategyKind::ThreadPool => thread_pool::run(settings, batch, work.as_ref()),
        StrategyKind::ProcessPool => {
            // Planning rejects process-pool trials without a codec.
            let remote = remote.ok_or_else(|| TrialError::PoolStartFailed {
                strategy: StrategyKind::ProcessPool,
                reason: format!("work unit '{}' cannot cross a process boundary", work.name()),
            })?;
            process_pool::run(settings, batch, work.name(), remote)
        }
        StrategyKind::Cooperative => cooperative::run(settings, batch, work),
    }
}
