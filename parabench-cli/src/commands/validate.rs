// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `parabench validate` command - check a suite and print its trial plan.

use std::path::Path;

use parabench_core::{BenchmarkRunner, PlannedTrial, RemoteWorkUnit, SuiteLoader};

use super::run::build_runner;
use crate::workloads::{primes, sleep, urls, PrimalityUnit, SleepUnit, UrlFetchUnit, Workload};

pub fn execute(file: &Path) -> anyhow::Result<()> {
    tracing::info!(file = %file.display(), "Validating suite");

    let suite = SuiteLoader::load_file(file)?;
    let plan = match suite.workload.parse::<Workload>()? {
        Workload::Primes => plan_of(build_runner(&suite, PrimalityUnit, primes::batch(false))?),
        Workload::Urls => plan_of(build_runner(&suite, UrlFetchUnit::new()?, urls::batch())?),
        Workload::Sleep => plan_of(build_runner(&suite, SleepUnit, sleep::batch())?),
    };

    println!("Suite:    {}", suite.name);
    println!("Workload: {} ({} inputs)", suite.workload, plan.items);
    if let Some(timeout) = suite.timeout {
        println!("Timeout:  {}ms", timeout.as_millis());
    }
    println!();
    println!("Trials ({}):", plan.trials.len());

    let mut rejected = 0;
    for trial in &plan.trials {
        match trial {
            PlannedTrial::Ready { label, settings } => {
                println!("  ✓ {} [{}]", label, settings.policy);
            }
            PlannedTrial::Rejected { label, error } => {
                rejected += 1;
                println!("  ✗ {}: {}", label, error);
            }
        }
    }

    if rejected > 0 {
        anyhow::bail!("{} of {} trial(s) rejected", rejected, plan.trials.len());
    }
    println!();
    println!("✓ Suite is valid");
    Ok(())
}

struct Plan {
    items: usize,
    trials: Vec<PlannedTrial>,
}

fn plan_of<W: RemoteWorkUnit>(runner: BenchmarkRunner<W>) -> Plan {
    Plan {
        items: runner.inputs().len(),
        trials: runner.plan(),
    }
}
