// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `parabench cpu` command - primality over large numbers.
//!
//! Runs sequential, a thread-pool sweep, a process-pool sweep and
//! cooperative over the same batch.

use parabench_core::{BenchmarkRunner, StrategyConfig};

use crate::workloads::{primes, PrimalityUnit, Workload};

/// Widths swept when none are given.
const DEFAULT_WIDTHS: [i64; 10] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10];
const QUICK_WIDTHS: [i64; 3] = [1, 2, 4];

pub fn execute(widths: Vec<i64>, quick: bool, json: bool) -> anyhow::Result<()> {
    let widths = match (widths.is_empty(), quick) {
        (false, _) => widths,
        (true, false) => DEFAULT_WIDTHS.to_vec(),
        (true, true) => QUICK_WIDTHS.to_vec(),
    };
    let inputs = primes::batch(quick);

    if !json {
        println!("Calculating {} primes...", inputs.len());
        println!();
    }

    let runner = BenchmarkRunner::new(PrimalityUnit, inputs)
        .strategies([
            StrategyConfig::sequential(),
            StrategyConfig::thread_pool(),
            StrategyConfig::process_pool(),
            StrategyConfig::cooperative(),
        ])
        .widths(widths)
        .with_worker(super::worker_command(Workload::Primes.name())?);

    super::run_and_report(Workload::Primes.name(), &runner, json)
}
