// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Parabench CLI
//!
//! Compares sequential, thread-pool, process-pool and cooperative execution
//! of the same batch of work.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod workloads;

/// Parabench - compare concurrency strategies on CPU- and I/O-bound work
#[derive(Parser)]
#[command(name = "parabench")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Primality over large numbers (CPU-bound)
    Cpu {
        /// Pool widths to sweep, comma separated
        #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
        widths: Vec<i64>,

        /// Smaller batch and fewer widths
        #[arg(short, long)]
        quick: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Fetch a fixed list of pages (I/O-bound)
    Io {
        /// Per-request timeout in milliseconds
        #[arg(long, default_value_t = 60_000)]
        timeout_ms: u64,

        /// Pool widths to sweep, comma separated
        #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
        widths: Vec<i64>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a suite file
    Run {
        /// Path to the suite YAML file
        file: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a suite file and print its trial plan
    Validate {
        /// Path to the suite YAML file
        file: PathBuf,
    },

    /// Serve one work unit over stdin/stdout (used by the process pool)
    #[command(hide = true)]
    Worker {
        /// Unit name
        unit: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout is reserved for reports and worker frames
    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Dispatch to command handlers
    match cli.command {
        Commands::Cpu {
            widths,
            quick,
            json,
        } => commands::cpu::execute(widths, quick, json),
        Commands::Io {
            timeout_ms,
            widths,
            json,
        } => commands::io::execute(timeout_ms, widths, json),
        Commands::Run { file, json } => commands::run::execute(&file, json),
        Commands::Validate { file } => commands::validate::execute(&file),
        Commands::Worker { unit } => commands::worker::execute(&unit),
    }
}
