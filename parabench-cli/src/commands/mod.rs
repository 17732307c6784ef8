// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! CLI command modules.

pub mod cpu;
pub mod io;
pub mod run;
pub mod validate;
pub mod worker;

use anyhow::Context;
use parabench_core::{BenchmarkRunner, RemoteWorkUnit, WorkUnit, WorkerCommand};
use parabench_report::{BenchmarkReport, JsonReporter, SummaryReporter};

/// Command that re-executes this binary as a worker for `unit`.
pub(crate) fn worker_command(unit: &str) -> anyhow::Result<WorkerCommand> {
    let command = WorkerCommand::current_exe()
        .context("Failed to locate the parabench executable for worker processes")?;
    Ok(command.arg("worker").arg(unit))
}

/// Run every trial and print the report to stdout.
pub(crate) fn run_and_report<W: RemoteWorkUnit>(
    suite: &str,
    runner: &BenchmarkRunner<W>,
    json: bool,
) -> anyhow::Result<()> {
    tracing::info!(
        suite,
        unit = runner.work().name(),
        items = runner.inputs().len(),
        "Running benchmark"
    );

    let records = runner.run();
    let report = BenchmarkReport::from_records(suite, &records);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if json {
        JsonReporter::write(&report, &mut out)?;
    } else {
        SummaryReporter::new().write(&report, &mut out)?;
    }
    Ok(())
}
