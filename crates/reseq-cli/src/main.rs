use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use reseq_cli::commands::{check, sort};
use reseq_cli::{Cli, Commands, Config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Logs go to stderr so stdout stays a clean event stream
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    match &cli.command {
        Some(Commands::Sort(args)) => {
            let config = load_config(&cli)?;
            let stats = sort::run(args, &config)?;
            tracing::debug!(?stats, "sort finished");
        }
        Some(Commands::Check(args)) => {
            let config = load_config(&cli)?;
            check::run(args, &config)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<Config> {
    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}
