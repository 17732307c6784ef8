// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Parabench reporting.
//!
//! Turns trial records into a report (host info, timestamp, throughput and
//! speedup against the sequential baseline) and renders it as summary text
//! or JSON.

pub mod metrics;
pub mod reporter;

pub use metrics::{BenchmarkReport, SystemInfo, TrialReport};
pub use reporter::{JsonReporter, ReporterError, SummaryReporter};
