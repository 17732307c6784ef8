// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `parabench worker` command - serve one work unit over stdin/stdout.
//!
//! Spawned by the process pool. Stdout carries protocol frames only;
//! logging goes to stderr.

use std::io::{BufReader, BufWriter};

use anyhow::Context;

use crate::workloads::{self, Workload};

pub fn execute(unit: &str) -> anyhow::Result<()> {
    let workload: Workload = unit.parse()?;
    let registry = workloads::registry(workload)?;

    let unit = workload.name();
    tracing::debug!(unit, pid = std::process::id(), "Worker starting");

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    registry
        .serve(
            unit,
            BufReader::new(stdin.lock()),
            BufWriter::new(stdout.lock()),
        )
        .with_context(|| format!("Worker for '{}' failed", unit))?;

    Ok(())
}
