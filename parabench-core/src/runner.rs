// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Benchmark runner: plans trials, runs them one at a time, returns records.
//!
//! The runner holds explicit configuration and never prints. Rendering the
//! records is a separate step (see the `parabench-report` crate).

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, TrialError};
use crate::outcome::{ExecutionResult, FailureRecord};
use crate::strategy::{self, RemoteSetup, TrialSettings, WorkerCommand};
use crate::timer::measure_unwind;
use crate::types::{FailurePolicy, StrategyKind, Width};
use crate::work::{panic_message, RemoteCodec, RemoteWorkUnit, WorkUnit};

/// One configured strategy, as written by the user.
///
/// Values are raw; they are validated when trials are planned so a bad entry
/// only rejects its own trials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub kind: StrategyKind,
    /// Pool width; sweeps the runner's widths when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_policy: Option<FailurePolicy>,
    /// Per-call timeout in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    /// Cooperative in-flight limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate: Option<i64>,
}

impl StrategyConfig {
    pub fn new(kind: StrategyKind) -> Self {
        Self {
            kind,
            width: None,
            failure_policy: None,
            timeout_ms: None,
            gate: None,
        }
    }

    pub fn sequential() -> Self {
        Self::new(StrategyKind::Sequential)
    }

    pub fn thread_pool() -> Self {
        Self::new(StrategyKind::ThreadPool)
    }

    pub fn process_pool() -> Self {
        Self::new(StrategyKind::ProcessPool)
    }

    pub fn cooperative() -> Self {
        Self::new(StrategyKind::Cooperative)
    }

    pub fn with_width(mut self, width: i64) -> Self {
        self.width = Some(width);
        self
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = Some(policy);
        self
    }

    /// Sub-millisecond timeouts round up to 1ms.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let millis = timeout.as_nanos().div_ceil(1_000_000);
        self.timeout_ms = Some(u64::try_from(millis).unwrap_or(u64::MAX));
        self
    }

    pub fn with_gate(mut self, gate: i64) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Validate this entry at one width.
    fn settings(&self, width: Option<i64>) -> Result<TrialSettings, ConfigurationError> {
        let mut settings = TrialSettings::new(self.kind);

        // Non-pool kinds ignore a valid width but still reject a bad one.
        let width = width.map(|raw| Width::new(self.kind, raw)).transpose()?;
        if self.kind.is_pool() {
            settings.width = width;
        }
        if let Some(policy) = self.failure_policy {
            settings.policy = policy;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            if timeout_ms == 0 {
                return Err(ConfigurationError::InvalidFieldValue {
                    field: "timeout_ms",
                    value: "0".to_string(),
                    reason: "Timeout must be greater than 0".to_string(),
                });
            }
            settings.timeout = Some(Duration::from_millis(timeout_ms));
        }
        if let Some(gate) = self.gate {
            if self.kind != StrategyKind::Cooperative {
                return Err(ConfigurationError::InvalidFieldValue {
                    field: "gate",
                    value: gate.to_string(),
                    reason: format!("gate only applies to cooperative, not {}", self.kind),
                });
            }
            let permits = usize::try_from(gate).ok().filter(|&g| g > 0).ok_or_else(|| {
                ConfigurationError::InvalidFieldValue {
                    field: "gate",
                    value: gate.to_string(),
                    reason: "Gate must be a positive number of tasks".to_string(),
                }
            })?;
            settings.gate = Some(permits);
        }
        Ok(settings)
    }
}

/// Identity of a trial for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialLabel {
    pub strategy: StrategyKind,
    /// Width as configured (raw) or as resolved from defaults
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<i64>,
}

impl fmt::Display for TrialLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.width {
            Some(width) => write!(f, "{} (width {})", self.strategy, width),
            None => write!(f, "{}", self.strategy),
        }
    }
}

/// A planned trial: ready to run, or rejected at configuration time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedTrial {
    Ready {
        label: TrialLabel,
        settings: TrialSettings,
    },
    Rejected {
        label: TrialLabel,
        error: ConfigurationError,
    },
}

impl PlannedTrial {
    pub fn label(&self) -> TrialLabel {
        match self {
            PlannedTrial::Ready { label, .. } | PlannedTrial::Rejected { label, .. } => *label,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, PlannedTrial::Ready { .. })
    }
}

/// How a trial ended.
#[derive(Debug, Clone)]
pub enum TrialOutcome<O> {
    Completed(ExecutionResult<O>),
    Aborted(TrialError),
}

/// Result of one (strategy, width) trial.
#[derive(Debug, Clone)]
pub struct TrialRecord<O> {
    pub label: TrialLabel,
    /// Measured execution window; zero for trials rejected before running
    pub elapsed: Duration,
    /// Batch size the trial was given
    pub items: usize,
    pub outcome: TrialOutcome<O>,
}

impl<O> TrialRecord<O> {
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    pub fn result(&self) -> Option<&ExecutionResult<O>> {
        match &self.outcome {
            TrialOutcome::Completed(result) => Some(result),
            TrialOutcome::Aborted(_) => None,
        }
    }

    pub fn error(&self) -> Option<&TrialError> {
        match &self.outcome {
            TrialOutcome::Completed(_) => None,
            TrialOutcome::Aborted(error) => Some(error),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.result().is_some()
    }

    /// Output-independent summary used by reporters.
    pub fn summary(&self) -> TrialSummary {
        let (succeeded, failed, failures) = match &self.outcome {
            TrialOutcome::Completed(result) => (
                result.succeeded(),
                result.failed(),
                result.failures().cloned().collect(),
            ),
            TrialOutcome::Aborted(_) => (0, 0, Vec::new()),
        };
        TrialSummary {
            label: self.label,
            elapsed_secs: self.elapsed_secs(),
            items: self.items,
            succeeded,
            failed,
            error: self.error().map(ToString::to_string),
            failures,
        }
    }
}

/// Serializable, output-independent view of a trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialSummary {
    #[serde(flatten)]
    pub label: TrialLabel,
    pub elapsed_secs: f64,
    pub items: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Trial-level error, when the trial was aborted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FailureRecord>,
}

impl TrialSummary {
    pub fn is_aborted(&self) -> bool {
        self.error.is_some()
    }
}

/// Runs one batch through every configured strategy.
pub struct BenchmarkRunner<W: WorkUnit> {
    work: Arc<W>,
    batch: Arc<[W::Input]>,
    strategies: Vec<StrategyConfig>,
    widths: Vec<i64>,
    default_timeout: Option<Duration>,
    codec: Option<RemoteCodec<W>>,
    worker: Option<WorkerCommand>,
}

impl<W: WorkUnit> BenchmarkRunner<W> {
    /// Create a runner for a work unit and its input batch.
    pub fn new(work: W, inputs: Vec<W::Input>) -> Self {
        Self {
            work: Arc::new(work),
            batch: inputs.into(),
            strategies: Vec::new(),
            widths: Vec::new(),
            default_timeout: None,
            codec: None,
            worker: None,
        }
    }

    /// Add one strategy.
    pub fn strategy(mut self, config: StrategyConfig) -> Self {
        self.strategies.push(config);
        self
    }

    /// Replace the strategy list.
    pub fn strategies(mut self, configs: impl IntoIterator<Item = StrategyConfig>) -> Self {
        self.strategies = configs.into_iter().collect();
        self
    }

    /// Widths swept by pool strategies that do not pin one.
    pub fn widths(mut self, widths: impl IntoIterator<Item = i64>) -> Self {
        self.widths = widths.into_iter().collect();
        self
    }

    /// Timeout applied to strategies that do not set their own.
    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    pub fn inputs(&self) -> &[W::Input] {
        &self.batch
    }

    pub fn work(&self) -> &W {
        &self.work
    }

    /// Expand the configured strategies into trials, validating each one.
    pub fn plan(&self) -> Vec<PlannedTrial> {
        let mut plan = Vec::new();

        for config in &self.strategies {
            let widths: Vec<Option<i64>> = match (config.kind.is_pool(), config.width) {
                (false, width) => vec![width],
                (true, Some(width)) => vec![Some(width)],
                (true, None) if self.widths.is_empty() => vec![None],
                (true, None) => self.widths.iter().copied().map(Some).collect(),
            };

            for width in widths {
                plan.push(self.plan_one(config, width));
            }
        }

        plan
    }

    fn plan_one(&self, config: &StrategyConfig, width: Option<i64>) -> PlannedTrial {
        let mut label = TrialLabel {
            strategy: config.kind,
            width,
        };

        if config.kind == StrategyKind::ProcessPool {
            // Both are set together by `with_worker`, which needs serde types.
            if self.codec.is_none() || self.worker.is_none() {
                let error = ConfigurationError::SerializationUnavailable {
                    unit: self.work.name().to_string(),
                };
                return PlannedTrial::Rejected { label, error };
            }
        }

        match config.settings(width) {
            Ok(mut settings) => {
                if settings.timeout.is_none() {
                    settings.timeout = self.default_timeout;
                }
                label.width = settings
                    .effective_width(self.batch.len())
                    .map(|w| w.get() as i64);
                PlannedTrial::Ready { label, settings }
            }
            Err(error) => PlannedTrial::Rejected { label, error },
        }
    }

    /// Run every planned trial in order, one at a time.
    pub fn run(&self) -> Vec<TrialRecord<W::Output>> {
        self.plan()
            .into_iter()
            .map(|planned| self.run_planned(planned))
            .collect()
    }

    /// Run a single planned trial.
    pub fn run_planned(&self, planned: PlannedTrial) -> TrialRecord<W::Output> {
        match planned {
            PlannedTrial::Ready { label, settings } => self.run_trial(label, &settings),
            PlannedTrial::Rejected { label, error } => {
                tracing::warn!(trial = %label, error = %error, "Trial rejected");
                TrialRecord {
                    label,
                    elapsed: Duration::ZERO,
                    items: self.batch.len(),
                    outcome: TrialOutcome::Aborted(error.into()),
                }
            }
        }
    }

    fn run_trial(&self, label: TrialLabel, settings: &TrialSettings) -> TrialRecord<W::Output> {
        tracing::info!(
            strategy = %label.strategy,
            width = ?label.width,
            items = self.batch.len(),
            "Starting trial"
        );

        let remote = match (self.codec, &self.worker) {
            (Some(codec), Some(command)) => Some(RemoteSetup { codec, command }),
            _ => None,
        };

        let (result, elapsed) =
            measure_unwind(|| strategy::execute(settings, &self.batch, &self.work, remote));

        let outcome = match result {
            Ok(Ok(run)) => TrialOutcome::Completed(ExecutionResult::new(
                run.outcomes,
                run.completion_order,
                elapsed,
            )),
            Ok(Err(error)) => TrialOutcome::Aborted(error),
            Err(payload) => TrialOutcome::Aborted(TrialError::Panicked {
                message: panic_message(payload.as_ref()),
            }),
        };

        match &outcome {
            TrialOutcome::Completed(result) => tracing::info!(
                strategy = %label.strategy,
                width = ?label.width,
                elapsed_ms = elapsed.as_millis() as u64,
                succeeded = result.succeeded(),
                failed = result.failed(),
                "Trial completed"
            ),
            TrialOutcome::Aborted(error) => tracing::warn!(
                strategy = %label.strategy,
                width = ?label.width,
                error = %error,
                "Trial aborted"
            ),
        }

        TrialRecord {
            label,
            elapsed,
            items: self.batch.len(),
            outcome,
        }
    }
}

impl<W: RemoteWorkUnit> BenchmarkRunner<W> {
    /// Enable the process pool, launching workers with `command`.
    ///
    /// Only available for units whose inputs and outputs are serializable.
    pub fn with_worker(mut self, command: WorkerCommand) -> Self {
        self.codec = Some(RemoteCodec::new());
        self.worker = Some(command);
        self
    }
}
