//! CLI subcommand implementations.

pub mod check;
pub mod sort;
pub mod util;
