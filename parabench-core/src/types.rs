// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Newtype wrappers and closed enums for strategy configuration.
//!
//! Values validate their invariants at creation time, so a [`Width`] in hand
//! is always usable as a worker count.

use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Upper bound on pool width.
pub const MAX_WIDTH: usize = 1024;

/// The closed set of execution strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// One item at a time on the calling thread
    Sequential,
    /// Bounded pool of worker threads sharing memory
    ThreadPool,
    /// Bounded pool of isolated worker processes
    ProcessPool,
    /// Single-threaded event loop with suspendable tasks
    Cooperative,
}

impl StrategyKind {
    /// All strategies, in the order the drivers compare them.
    pub const ALL: [StrategyKind; 4] = [
        StrategyKind::Sequential,
        StrategyKind::ThreadPool,
        StrategyKind::ProcessPool,
        StrategyKind::Cooperative,
    ];

    /// Whether width is meaningful for this strategy.
    pub fn is_pool(&self) -> bool {
        matches!(self, StrategyKind::ThreadPool | StrategyKind::ProcessPool)
    }

    /// Default failure policy for the strategy.
    ///
    /// Sequential stops at the first failure; everything else isolates.
    pub fn default_policy(&self) -> FailurePolicy {
        match self {
            StrategyKind::Sequential => FailurePolicy::FailFast,
            _ => FailurePolicy::Isolate,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Sequential => "sequential",
            StrategyKind::ThreadPool => "thread_pool",
            StrategyKind::ProcessPool => "process_pool",
            StrategyKind::Cooperative => "cooperative",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "sequential" => Ok(StrategyKind::Sequential),
            "thread_pool" | "threads" => Ok(StrategyKind::ThreadPool),
            "process_pool" | "processes" => Ok(StrategyKind::ProcessPool),
            "cooperative" | "async" => Ok(StrategyKind::Cooperative),
            _ => Err(ConfigurationError::UnknownStrategy {
                name: s.to_string(),
            }),
        }
    }
}

/// What a strategy does with the rest of the batch after an item fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Record the failure and keep going
    Isolate,
    /// Stop dispatching; items not yet run are recorded as skipped
    FailFast,
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::Isolate => write!(f, "isolate"),
            FailurePolicy::FailFast => write!(f, "fail_fast"),
        }
    }
}

impl FromStr for FailurePolicy {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "isolate" => Ok(FailurePolicy::Isolate),
            "fail_fast" => Ok(FailurePolicy::FailFast),
            _ => Err(ConfigurationError::UnknownFailurePolicy {
                name: s.to_string(),
            }),
        }
    }
}

/// Validated pool width (worker thread or process count).
/// Must be in range 1..=MAX_WIDTH.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "usize")]
pub struct Width(NonZeroUsize);

impl Width {
    /// Validate a raw, possibly negative, width for the given strategy.
    pub fn new(strategy: StrategyKind, raw: i64) -> Result<Self, ConfigurationError> {
        let invalid = || ConfigurationError::InvalidWidth {
            strategy,
            width: raw,
            max: MAX_WIDTH,
        };

        let value = usize::try_from(raw).map_err(|_| invalid())?;
        if value > MAX_WIDTH {
            return Err(invalid());
        }
        NonZeroUsize::new(value).map(Self).ok_or_else(invalid)
    }

    /// Width from a count already known to be positive, clamped to MAX_WIDTH.
    pub fn clamped(count: usize) -> Self {
        let value = count.clamp(1, MAX_WIDTH);
        Self(NonZeroUsize::new(value).unwrap_or(NonZeroUsize::MIN))
    }

    pub fn get(&self) -> usize {
        self.0.get()
    }
}

impl fmt::Display for Width {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Width> for usize {
    fn from(width: Width) -> Self {
        width.get()
    }
}
