//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::{check::CheckArgs, sort::SortArgs};

/// Resequencer for smart-home sensor logs.
///
/// Reads JSON Lines event logs whose records arrive slightly out of order
/// and restores timestamp order.
#[derive(Debug, Parser)]
#[command(name = "reseq", version, about, long_about = None)]
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
    /// Restore timestamp order and write the events as JSON Lines.
    Sort(SortArgs),

    /// Measure how far out of order a log is, without reordering it.
    Check(CheckArgs),
}
