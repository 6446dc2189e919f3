//! Resequencer CLI library.
//!
//! This crate provides the command-line interface over `reseq-core`.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands};
pub use config::{Config, TimestampConfig};
