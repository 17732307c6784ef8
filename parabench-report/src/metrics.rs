// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Report model for a benchmark run.
//!
//! Wraps the output-independent trial summaries from `parabench-core` with
//! host information, a timestamp and derived throughput figures.

use chrono::{DateTime, Utc};
use parabench_core::{StrategyKind, TrialRecord, TrialSummary};
use serde::{Deserialize, Serialize};
use sysinfo::System;

/// System information captured at benchmark time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    /// Operating system name
    pub os: String,
    /// OS version
    pub os_version: String,
    /// Kernel version
    pub kernel_version: Option<String>,
    /// CPU model name
    pub cpu_model: String,
    /// Number of logical CPUs
    pub cpu_cores: usize,
    /// Total system memory in bytes
    pub memory_bytes: u64,
    pub hostname: String,
}

impl SystemInfo {
    /// Collect current system information.
    pub fn collect() -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();

        Self {
            os: System::name().unwrap_or_else(|| "Unknown".to_string()),
            os_version: System::os_version().unwrap_or_else(|| "Unknown".to_string()),
            kernel_version: System::kernel_version(),
            cpu_model: sys
                .cpus()
                .first()
                .map(|cpu| cpu.brand().to_string())
                .unwrap_or_else(|| "Unknown".to_string()),
            cpu_cores: sys.cpus().len(),
            memory_bytes: sys.total_memory(),
            hostname: System::host_name().unwrap_or_else(|| "Unknown".to_string()),
        }
    }
}

/// One trial with derived figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialReport {
    #[serde(flatten)]
    pub summary: TrialSummary,
    /// Items per second over the whole trial window
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items_per_sec: Option<f64>,
    /// Sequential elapsed divided by this trial's elapsed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speedup: Option<f64>,
}

impl TrialReport {
    pub fn new(summary: TrialSummary) -> Self {
        let items_per_sec = if summary.is_aborted() || summary.elapsed_secs <= 0.0 {
            None
        } else {
            Some(summary.items as f64 / summary.elapsed_secs)
        };
        Self {
            summary,
            items_per_sec,
            speedup: None,
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.summary.is_aborted()
    }
}

/// Complete report for one suite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkReport {
    /// Suite identifier
    pub suite: String,
    /// Harness version
    pub version: String,
    /// Timestamp when the run finished
    pub timestamp: DateTime<Utc>,
    pub system_info: SystemInfo,
    pub trials: Vec<TrialReport>,
}

impl BenchmarkReport {
    /// Create an empty report for `suite`.
    pub fn new(suite: impl Into<String>) -> Self {
        Self {
            suite: suite.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
            system_info: SystemInfo::collect(),
            trials: Vec::new(),
        }
    }

    /// Build a report straight from runner records.
    pub fn from_records<O>(suite: impl Into<String>, records: &[TrialRecord<O>]) -> Self {
        let mut report = Self::new(suite);
        for record in records {
            report.add_trial(record.summary());
        }
        report
    }

    /// Add a trial and refresh speedups against the sequential baseline.
    pub fn add_trial(&mut self, summary: TrialSummary) {
        self.trials.push(TrialReport::new(summary));
        self.refresh_speedups();
    }

    /// First completed sequential trial, if any.
    pub fn baseline(&self) -> Option<&TrialReport> {
        self.trials.iter().find(|t| {
            t.summary.label.strategy == StrategyKind::Sequential && !t.is_aborted()
        })
    }

    /// Completed trial with the smallest elapsed time.
    pub fn fastest(&self) -> Option<&TrialReport> {
        self.trials
            .iter()
            .filter(|t| !t.is_aborted())
            .min_by(|a, b| a.summary.elapsed_secs.total_cmp(&b.summary.elapsed_secs))
    }

    pub fn aborted(&self) -> usize {
        self.trials.iter().filter(|t| t.is_aborted()).count()
    }

    fn refresh_speedups(&mut self) {
        let baseline = self.baseline().map(|t| t.summary.elapsed_secs);
        for trial in &mut self.trials {
            trial.speedup = match baseline {
                Some(base) if !trial.is_aborted() && trial.summary.elapsed_secs > 0.0 => {
                    Some(base / trial.summary.elapsed_secs)
                }
                _ => None,
            };
        }
    }
}
