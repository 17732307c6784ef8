//! Error types for the benchmark harness.
//!
//! Errors are split by blast radius: [`WorkError`] belongs to a single item,
//! [`TrialError`] aborts one (strategy, width) trial, and [`ConfigurationError`]
//! rejects a trial before it runs. None of them ever abort the whole run.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::StrategyKind;

/// Top-level error type for fallible library entry points.
#[derive(Debug, Error)]
pub enum ParabenchError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Suite file not found: {path}")]
    SuiteNotFound { path: PathBuf },

    #[error("Suite parse error: {message}")]
    SuiteParse { message: String },

    // =========================================================================
    // Execution Errors
    // =========================================================================
    #[error("Trial failed: {0}")]
    Trial(#[from] TrialError),

    #[error("Worker protocol error: {0}")]
    Frame(#[from] FrameError),

    #[error("Work unit already registered: {name}")]
    UnitAlreadyRegistered { name: String },

    #[error("Work unit not registered: {name}")]
    UnitNotRegistered { name: String },

    // =========================================================================
    // System Errors
    // =========================================================================
    #[error("IO error: {context} - {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Invalid strategy or suite configuration.
///
/// Raised while planning trials; a rejected entry is recorded as an aborted
/// trial and the remaining trials still run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("Invalid width {width} for {strategy}: must be between 1 and {max}")]
    InvalidWidth {
        strategy: StrategyKind,
        width: i64,
        max: usize,
    },

    #[error("Unknown strategy: {name}")]
    UnknownStrategy { name: String },

    #[error("Unknown failure policy: {name}")]
    UnknownFailurePolicy { name: String },

    #[error("Missing required field: {field} in {context}")]
    MissingRequiredField {
        field: &'static str,
        context: String,
    },

    #[error("Invalid field value: {field} = {value} - {reason}")]
    InvalidFieldValue {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("Work unit '{unit}' cannot run in process_pool: needs serde types and a worker command")]
    SerializationUnavailable { unit: String },
}

/// Strategy-level failure that is not attributable to one item.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrialError {
    #[error("Rejected configuration: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Failed to start {strategy} pool: {reason}")]
    PoolStartFailed {
        strategy: StrategyKind,
        reason: String,
    },

    #[error("Failed to build cooperative runtime: {reason}")]
    RuntimeStartFailed { reason: String },

    #[error("Failed to spawn worker process {program}: {reason}")]
    WorkerSpawnFailed { program: String, reason: String },

    #[error("Worker handshake failed: {reason}")]
    WorkerHandshake { reason: String },

    #[error("Strategy panicked: {message}")]
    Panicked { message: String },
}

/// Failure of a single work unit invocation.
///
/// Serializable because worker processes report it back over the pipe.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkError {
    #[error("{message}")]
    Failed { message: String },

    #[error("timed out after {limit_ms}ms")]
    Timeout { limit_ms: u64 },

    #[error("panicked: {message}")]
    Panic { message: String },

    #[error("worker crashed: {reason}")]
    WorkerCrashed { reason: String },

    #[error("not run: {reason}")]
    Skipped { reason: String },

    #[error("codec error: {message}")]
    Codec { message: String },
}

impl WorkError {
    /// Shorthand for a plain failure with a message.
    pub fn failed(message: impl std::fmt::Display) -> Self {
        Self::Failed {
            message: message.to_string(),
        }
    }

    /// Timeout failure for the given limit.
    pub fn timeout(limit: std::time::Duration) -> Self {
        Self::Timeout {
            limit_ms: limit.as_millis() as u64,
        }
    }

    /// Short label used in summaries.
    pub fn label(&self) -> &'static str {
        match self {
            WorkError::Failed { .. } => "error",
            WorkError::Timeout { .. } => "timeout",
            WorkError::Panic { .. } => "panic",
            WorkError::WorkerCrashed { .. } => "worker_crashed",
            WorkError::Skipped { .. } => "skipped",
            WorkError::Codec { .. } => "codec",
        }
    }
}

/// Errors on the supervisor/worker frame protocol.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Frame too large: {size} bytes (max {max} bytes)")]
    FrameTooLarge { size: usize, max: usize },

    #[error("Frame checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error("Invalid frame: {reason}")]
    InvalidFrame { reason: String },

    #[error("End of stream")]
    EndOfStream,
}

/// Result type alias using ParabenchError.
pub type ParabenchResult<T> = Result<T, ParabenchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_width_display() {
        let err = ConfigurationError::InvalidWidth {
            strategy: StrategyKind::ThreadPool,
            width: -2,
            max: 1024,
        };
        assert!(err.to_string().contains("-2"));
        assert!(err.to_string().contains("thread_pool"));
    }

    #[test]
    fn test_error_chain() {
        let config_err = ConfigurationError::UnknownStrategy {
            name: "fork_join".to_string(),
        };
        let trial_err: TrialError = config_err.clone().into();
        assert!(matches!(trial_err, TrialError::Configuration(_)));

        let top: ParabenchError = config_err.into();
        assert!(matches!(top, ParabenchError::Configuration(_)));
    }

    #[test]
    fn test_work_error_survives_json() {
        let err = WorkError::Timeout { limit_ms: 250 };
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"kind\":\"timeout\""));
        let back: WorkError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, err);
        assert_eq!(back.label(), "timeout");
    }
}
