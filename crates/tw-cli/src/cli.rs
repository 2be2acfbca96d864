//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::report::ReportArgs;
use crate::commands::sample::SampleArgs;

/// Tool window usage analyzer.
///
/// Pairs "opened" and "closed" tool window events per user and reports how
/// long the window stays open, split by manual and automatic opens.
#[derive(Debug, Parser)]
#[command(name = "tw", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Pair events and print duration statistics.
    Report(ReportArgs),

    /// Write one user's events to a text file for inspection.
    Sample(SampleArgs),
}
