// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `parabench run` command - run a suite described in YAML.

use std::path::Path;

use parabench_core::{BenchmarkRunner, RemoteWorkUnit, SuiteConfig, SuiteLoader, WorkUnit};
use serde::de::DeserializeOwned;

use crate::workloads::{primes, sleep, urls, PrimalityUnit, SleepUnit, UrlFetchUnit, Workload};

pub fn execute(file: &Path, json: bool) -> anyhow::Result<()> {
    tracing::info!(file = %file.display(), "Loading suite");

    let suite = SuiteLoader::load_file(file)?;
    match suite.workload.parse::<Workload>()? {
        Workload::Primes => {
            let runner = build_runner(&suite, PrimalityUnit, primes::batch(false))?;
            super::run_and_report(&suite.name, &runner, json)
        }
        Workload::Urls => {
            let runner = build_runner(&suite, UrlFetchUnit::new()?, urls::batch())?;
            super::run_and_report(&suite.name, &runner, json)
        }
        Workload::Sleep => {
            let runner = build_runner(&suite, SleepUnit, sleep::batch())?;
            super::run_and_report(&suite.name, &runner, json)
        }
    }
}

/// Runner for `unit`, using the suite's inputs when it lists any.
pub(crate) fn build_runner<W>(
    suite: &SuiteConfig,
    unit: W,
    default_inputs: Vec<W::Input>,
) -> anyhow::Result<BenchmarkRunner<W>>
where
    W: RemoteWorkUnit,
    W::Input: DeserializeOwned,
{
    let inputs = suite.typed_inputs()?.unwrap_or(default_inputs);
    let command = super::worker_command(unit.name())?;
    let runner = BenchmarkRunner::new(unit, inputs).with_worker(command);
    Ok(suite.configure(runner))
}
