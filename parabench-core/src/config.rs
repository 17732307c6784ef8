// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! YAML suite files.
//!
//! A suite names a workload, optionally overrides its inputs, and lists the
//! strategies and widths to compare. Structure is validated at load time;
//! widths are validated per trial so one bad width only rejects its trial.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ConfigurationError, ParabenchError, ParabenchResult};
use crate::runner::{BenchmarkRunner, StrategyConfig};
use crate::types::{FailurePolicy, StrategyKind};
use crate::work::WorkUnit;

/// Raw strategy entry as parsed from YAML (before validation).
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawStrategyConfig {
    kind: String,
    #[serde(default)]
    width: Option<i64>,
    #[serde(default)]
    failure_policy: Option<String>,
    #[serde(default)]
    timeout_ms: Option<u64>,
    #[serde(default)]
    gate: Option<i64>,
}

/// Raw root of a suite file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSuiteConfig {
    #[serde(default = "default_suite_name")]
    name: String,
    workload: String,
    #[serde(default)]
    inputs: Option<Vec<serde_yaml::Value>>,
    #[serde(default)]
    widths: Vec<i64>,
    #[serde(default)]
    timeout_ms: Option<u64>,
    #[serde(default = "default_strategies")]
    strategies: Vec<RawStrategyConfig>,
}

fn default_suite_name() -> String {
    "parabench".to_string()
}

fn default_strategies() -> Vec<RawStrategyConfig> {
    StrategyKind::ALL
        .iter()
        .map(|kind| RawStrategyConfig {
            kind: kind.to_string(),
            width: None,
            failure_policy: None,
            timeout_ms: None,
            gate: None,
        })
        .collect()
}

/// Validated suite.
#[derive(Debug, Clone)]
pub struct SuiteConfig {
    pub name: String,
    /// Workload name, resolved by the driver
    pub workload: String,
    /// Input override; the workload's own batch is used when absent
    pub inputs: Option<Vec<serde_yaml::Value>>,
    pub widths: Vec<i64>,
    /// Per-call timeout for strategies that do not set one
    pub timeout: Option<Duration>,
    pub strategies: Vec<StrategyConfig>,
}

impl SuiteConfig {
    /// Copy strategies, widths and timeout onto a runner.
    pub fn configure<W: WorkUnit>(&self, runner: BenchmarkRunner<W>) -> BenchmarkRunner<W> {
        let runner = runner
            .strategies(self.strategies.iter().cloned())
            .widths(self.widths.iter().copied());
        match self.timeout {
            Some(timeout) => runner.default_timeout(timeout),
            None => runner,
        }
    }

    /// Decode the input override into the workload's input type.
    pub fn typed_inputs<T: serde::de::DeserializeOwned>(&self) -> ParabenchResult<Option<Vec<T>>> {
        let Some(values) = &self.inputs else {
            return Ok(None);
        };
        values
            .iter()
            .enumerate()
            .map(|(index, value)| {
                serde_yaml::from_value(value.clone()).map_err(|e| {
                    ConfigurationError::InvalidFieldValue {
                        field: "inputs",
                        value: format!("entry {}", index),
                        reason: e.to_string(),
                    }
                    .into()
                })
            })
            .collect::<ParabenchResult<Vec<T>>>()
            .map(Some)
    }
}

/// Suite loader with strict validation.
pub struct SuiteLoader;

impl SuiteLoader {
    /// Load and validate a suite from a YAML file.
    pub fn load_file(path: impl AsRef<Path>) -> ParabenchResult<SuiteConfig> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ParabenchError::SuiteNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| ParabenchError::Io {
            context: "reading suite file",
            source: e,
        })?;

        Self::load_string(&content)
    }

    /// Load and validate a suite from a YAML string.
    pub fn load_string(content: &str) -> ParabenchResult<SuiteConfig> {
        let raw: RawSuiteConfig =
            serde_yaml::from_str(content).map_err(|e| ParabenchError::SuiteParse {
                message: format!("YAML parse error: {}", e),
            })?;

        Self::validate(raw)
    }

    fn validate(raw: RawSuiteConfig) -> ParabenchResult<SuiteConfig> {
        if raw.name.trim().is_empty() {
            return Err(ConfigurationError::InvalidFieldValue {
                field: "name",
                value: raw.name,
                reason: "Suite name cannot be empty".to_string(),
            }
            .into());
        }

        if raw.workload.trim().is_empty() {
            return Err(ConfigurationError::MissingRequiredField {
                field: "workload",
                context: format!("suite '{}'", raw.name),
            }
            .into());
        }

        if raw.strategies.is_empty() {
            return Err(ConfigurationError::InvalidFieldValue {
                field: "strategies",
                value: "[]".to_string(),
                reason: "At least one strategy must be listed".to_string(),
            }
            .into());
        }

        let timeout = match raw.timeout_ms {
            Some(0) => {
                return Err(ConfigurationError::InvalidFieldValue {
                    field: "timeout_ms",
                    value: "0".to_string(),
                    reason: "Timeout must be greater than 0".to_string(),
                }
                .into());
            }
            Some(ms) => Some(Duration::from_millis(ms)),
            None => None,
        };

        let strategies = raw
            .strategies
            .into_iter()
            .map(Self::validate_strategy)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SuiteConfig {
            name: raw.name,
            workload: raw.workload.trim().to_string(),
            inputs: raw.inputs,
            widths: raw.widths,
            timeout,
            strategies,
        })
    }

    fn validate_strategy(raw: RawStrategyConfig) -> Result<StrategyConfig, ConfigurationError> {
        let kind: StrategyKind = raw.kind.parse()?;
        let failure_policy = raw
            .failure_policy
            .as_deref()
            .map(str::parse::<FailurePolicy>)
            .transpose()?;

        Ok(StrategyConfig {
            kind,
            width: raw.width,
            failure_policy,
            timeout_ms: raw.timeout_ms,
            gate: raw.gate,
        })
    }
}
