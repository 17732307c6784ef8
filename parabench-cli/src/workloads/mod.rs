// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Reference workloads shipped with the binary.
//!
//! A worker process registers only the workload it was started for, under
//! its unit name, so the process pool can re-execute this binary to serve it.

pub mod primes;
pub mod sleep;
pub mod urls;

use std::fmt;
use std::str::FromStr;

use parabench_core::{ParabenchError, WorkerRegistry};
use thiserror::Error;

pub use primes::PrimalityUnit;
pub use sleep::SleepUnit;
pub use urls::UrlFetchUnit;

#[derive(Debug, Error)]
pub enum WorkloadError {
    #[error("Unknown workload: {name} (expected one of: primes, urls, sleep)")]
    Unknown { name: String },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error(transparent)]
    Core(#[from] ParabenchError),
}

/// Workloads a suite can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workload {
    Primes,
    Urls,
    Sleep,
}

impl Workload {
    /// Unit name, also used on the worker command line.
    pub fn name(&self) -> &'static str {
        match self {
            Workload::Primes => "primes",
            Workload::Urls => "urls",
            Workload::Sleep => "sleep",
        }
    }
}

impl fmt::Display for Workload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Workload {
    type Err = WorkloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "primes" | "cpu" => Ok(Workload::Primes),
            "urls" | "io" => Ok(Workload::Urls),
            "sleep" => Ok(Workload::Sleep),
            _ => Err(WorkloadError::Unknown {
                name: s.to_string(),
            }),
        }
    }
}

/// Registry serving a single workload.
///
/// HTTP clients are only built for `urls`, so other workers start without
/// that setup.
pub fn registry(workload: Workload) -> Result<WorkerRegistry, WorkloadError> {
    let registry = WorkerRegistry::new();
    match workload {
        Workload::Primes => registry.register(PrimalityUnit)?,
        Workload::Sleep => registry.register(SleepUnit)?,
        Workload::Urls => registry.register(UrlFetchUnit::new()?)?,
    }
    Ok(registry)
}
