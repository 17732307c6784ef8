//! Parabench Core Library
//!
//! Runs one batch of work through interchangeable execution strategies
//! (sequential, thread pool, process pool, cooperative), times each trial,
//! and returns structured records for comparison.

pub mod config;
pub mod error;
pub mod outcome;
pub mod protocol;
pub mod registry;
pub mod runner;
pub mod strategy;
pub mod timer;
pub mod types;
pub mod work;

// Re-export commonly used types
pub use config::{SuiteConfig, SuiteLoader};
pub use error::{
    ConfigurationError, FrameError, ParabenchError, ParabenchResult, TrialError, WorkError,
};
pub use outcome::{ExecutionResult, FailureRecord, ItemOutcome};
pub use registry::WorkerRegistry;
pub use runner::{
    BenchmarkRunner, PlannedTrial, StrategyConfig, TrialLabel, TrialOutcome, TrialRecord,
    TrialSummary,
};
pub use strategy::{TrialSettings, WorkerCommand};
pub use timer::Timer;
pub use types::{FailurePolicy, StrategyKind, Width};
pub use work::{CallContext, RemoteWorkUnit, WorkFuture, WorkUnit};
