// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Renderers for benchmark reports.
//!
//! Both renderers write to any `io::Write`; nothing is persisted.

use std::io::Write;

use parabench_core::WorkError;
use thiserror::Error;

use crate::metrics::{BenchmarkReport, TrialReport};

/// Errors that can occur while rendering a report.
#[derive(Debug, Error)]
pub enum ReporterError {
    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize report: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Human-readable summary: one line per trial plus failed items.
pub struct SummaryReporter {
    /// Individually listed failures per trial
    max_failures: usize,
}

impl SummaryReporter {
    pub fn new() -> Self {
        Self { max_failures: 10 }
    }

    /// Cap on failures listed under each trial.
    pub fn max_failures(mut self, max: usize) -> Self {
        self.max_failures = max;
        self
    }

    /// Format the summary line for one trial.
    pub fn trial_line(trial: &TrialReport) -> String {
        let summary = &trial.summary;
        if let Some(error) = &summary.error {
            return format!("{}: aborted: {}", summary.label, error);
        }

        let mut line = format!(
            "{}: {:.2} seconds, {} items, {} succeeded / {} failed",
            summary.label, summary.elapsed_secs, summary.items, summary.succeeded, summary.failed
        );
        if let Some(speedup) = trial.speedup {
            line.push_str(&format!(", {:.2}x vs sequential", speedup));
        }
        line
    }

    /// Write the whole report.
    pub fn write<W: Write>(
        &self,
        report: &BenchmarkReport,
        out: &mut W,
    ) -> Result<(), ReporterError> {
        writeln!(out, "{} (parabench {})", report.suite, report.version)?;
        writeln!(
            out,
            "{} logical CPUs, {}",
            report.system_info.cpu_cores, report.system_info.cpu_model
        )?;
        writeln!(out)?;

        for trial in &report.trials {
            writeln!(out, "{}", Self::trial_line(trial))?;
            self.write_failures(trial, out)?;
        }

        if let Some(fastest) = report.fastest() {
            writeln!(out)?;
            writeln!(
                out,
                "Fastest: {} in {:.2} seconds",
                fastest.summary.label, fastest.summary.elapsed_secs
            )?;
        }
        let aborted = report.aborted();
        if aborted > 0 {
            writeln!(out, "{} trial(s) aborted", aborted)?;
        }
        Ok(())
    }

    fn write_failures<W: Write>(
        &self,
        trial: &TrialReport,
        out: &mut W,
    ) -> Result<(), ReporterError> {
        let (skipped, failed): (Vec<_>, Vec<_>) = trial
            .summary
            .failures
            .iter()
            .partition(|f| matches!(f.error, WorkError::Skipped { .. }));

        for failure in failed.iter().take(self.max_failures) {
            writeln!(out, "  {}", failure)?;
        }
        if failed.len() > self.max_failures {
            writeln!(out, "  ... and {} more", failed.len() - self.max_failures)?;
        }
        if !skipped.is_empty() {
            writeln!(out, "  {} item(s) not run", skipped.len())?;
        }
        Ok(())
    }
}

impl Default for SummaryReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Structured JSON renderer.
pub struct JsonReporter;

impl JsonReporter {
    pub fn write<W: Write>(report: &BenchmarkReport, out: &mut W) -> Result<(), ReporterError> {
        serde_json::to_writer_pretty(&mut *out, report)?;
        writeln!(out)?;
        Ok(())
    }

    pub fn to_string(report: &BenchmarkReport) -> Result<String, ReporterError> {
        Ok(serde_json::to_string_pretty(report)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parabench_core::{FailureRecord, StrategyKind, TrialLabel, TrialSummary};

    fn summary(strategy: StrategyKind, width: Option<i64>, secs: f64) -> TrialSummary {
        TrialSummary {
            label: TrialLabel { strategy, width },
            elapsed_secs: secs,
            items: 4,
            succeeded: 4,
            failed: 0,
            error: None,
            failures: Vec::new(),
        }
    }

    fn render(report: &BenchmarkReport) -> String {
        let mut out = Vec::new();
        SummaryReporter::new().write(report, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_trial_line_two_decimals() {
        let trial = TrialReport::new(summary(StrategyKind::ThreadPool, Some(4), 1.23456));
        assert_eq!(
            SummaryReporter::trial_line(&trial),
            "thread_pool (width 4): 1.23 seconds, 4 items, 4 succeeded / 0 failed"
        );
    }

    #[test]
    fn test_failed_items_listed_by_identity() {
        let mut trial = summary(StrategyKind::Cooperative, None, 0.5);
        trial.succeeded = 3;
        trial.failed = 1;
        trial.failures.push(FailureRecord {
            index: 2,
            input: "\"http://nonexistant-subdomain.python.org/\"".to_string(),
            error: WorkError::failed("dns error"),
        });

        let mut report = BenchmarkReport::new("io");
        report.add_trial(trial);
        let text = render(&report);

        assert!(text.contains("cooperative: 0.50 seconds, 4 items, 3 succeeded / 1 failed"));
        assert!(text.contains(
            "  \"http://nonexistant-subdomain.python.org/\" generated an exception: dns error"
        ));
    }

    #[test]
    fn test_skipped_items_are_counted_not_listed() {
        let mut trial = summary(StrategyKind::Sequential, None, 0.1);
        trial.succeeded = 1;
        trial.failed = 3;
        trial.failures.push(FailureRecord {
            index: 1,
            input: "-1".to_string(),
            error: WorkError::failed("bad input"),
        });
        for index in 2..4 {
            trial.failures.push(FailureRecord {
                index,
                input: index.to_string(),
                error: WorkError::Skipped {
                    reason: "batch aborted after -1 failed".to_string(),
                },
            });
        }

        let mut report = BenchmarkReport::new("primes");
        report.add_trial(trial);
        let text = render(&report);

        assert!(text.contains("  -1 generated an exception: bad input"));
        assert!(text.contains("  2 item(s) not run"));
        assert!(!text.contains("not run: batch aborted"));
    }

    #[test]
    fn test_aborted_and_fastest_lines() {
        let mut rejected = summary(StrategyKind::ThreadPool, Some(0), 0.0);
        rejected.succeeded = 0;
        rejected.error = Some("Rejected configuration: Invalid width 0".to_string());

        let mut report = BenchmarkReport::new("primes");
        report.add_trial(summary(StrategyKind::Sequential, None, 2.0));
        report.add_trial(summary(StrategyKind::ProcessPool, Some(4), 0.5));
        report.add_trial(rejected);
        let text = render(&report);

        assert!(text.contains("process_pool (width 4): 0.50 seconds"));
        assert!(text.contains("4.00x vs sequential"));
        assert!(text.contains("thread_pool (width 0): aborted: Rejected configuration"));
        assert!(text.contains("Fastest: process_pool (width 4) in 0.50 seconds"));
        assert!(text.contains("1 trial(s) aborted"));
    }

    #[test]
    fn test_json_report_round_trips() {
        let mut report = BenchmarkReport::new("primes");
        report.add_trial(summary(StrategyKind::Sequential, None, 1.0));

        let json = JsonReporter::to_string(&report).unwrap();
        let loaded: BenchmarkReport = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.suite, "primes");
        assert_eq!(loaded.trials, report.trials);
    }
}
