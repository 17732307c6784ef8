// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `parabench io` command - fetch a fixed list of pages.

use std::time::Duration;

use parabench_core::{BenchmarkRunner, FailurePolicy, StrategyConfig};

use crate::workloads::{urls, UrlFetchUnit, Workload};

pub fn execute(timeout_ms: u64, widths: Vec<i64>, json: bool) -> anyhow::Result<()> {
    let inputs = urls::batch();

    if !json {
        println!("Loading {} URLs...", inputs.len());
        println!();
    }

    let unit = UrlFetchUnit::new()?;
    let runner = BenchmarkRunner::new(unit, inputs)
        .strategies([
            // One dead site should not hide the timing of the rest.
            StrategyConfig::sequential().with_policy(FailurePolicy::Isolate),
            StrategyConfig::process_pool(),
            StrategyConfig::thread_pool(),
            StrategyConfig::cooperative(),
        ])
        .widths(widths)
        .default_timeout(Duration::from_millis(timeout_ms))
        .with_worker(super::worker_command(Workload::Urls.name())?);

    super::run_and_report(Workload::Urls.name(), &runner, json)
}
