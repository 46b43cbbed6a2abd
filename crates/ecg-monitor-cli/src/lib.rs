//! ECG Monitor CLI
//!
//! Offline analysis of recorded ECG logs: loads a CSV record, runs
//! zero-phase filtering over the whole capture, detects beats against
//! a global threshold, and reports RR/BPM statistics.
//!
//! # Usage
//!
//! ```bash
//! # Analyze a capture and print the report table
//! ecg-monitor analyze --input ecg_log.csv
//!
//! # Also write the annotated per-sample CSV and a JSON summary
//! ecg-monitor analyze --input ecg_log.csv \
//!     --export annotated.csv --export-json summary.json
//! ```

use clap::{Parser, Subcommand};

pub mod analyze;

/// ECG monitor command line interface
#[derive(Parser, Debug)]
#[command(name = "ecg-monitor")]
#[command(author, version, about = "Offline ECG heart-rate analysis")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a recorded ECG log
    Analyze(analyze::AnalyzeArgs),

    /// Display version information
    Version,
}
