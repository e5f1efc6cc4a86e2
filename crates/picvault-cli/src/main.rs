//! Picvault CLI - archive library and image extraction from the command
//! line.

mod cli;
mod commands;
mod error;
mod output;
mod progress;

use anyhow::{Context, Result};
use clap::Parser;
use picvault_core::{Vault, VaultConfig};
use std::path::PathBuf;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter(&cli))),
        )
        .with_writer(std::io::stderr)
        .init();

    let formatter = output::create_formatter(cli.json, cli.verbose, cli.quiet);
    let vault = Vault::open(VaultConfig::new(data_dir(&cli)?))
        .context("failed to open the picvault data directory")?;

    // Session directories stay behind on purpose: `load` prints where
    // the images are, and `sweep` reclaims old ones later.
    match &cli.command {
        cli::Commands::Load(args) => commands::load::execute(&vault, args, &*formatter),
        cli::Commands::Extract(args) => commands::extract::execute(&vault, args, &*formatter),
        cli::Commands::Star(args) => commands::star::execute(&vault, args, &*formatter),
        cli::Commands::Usage => commands::usage::execute(&vault, &*formatter),
        cli::Commands::Clear(args) => commands::clear::execute(&vault, args, &*formatter),
        cli::Commands::List(args) => commands::list::execute(&vault, args, &*formatter),
        cli::Commands::History(args) => commands::history::execute(&vault, args, &*formatter),
        cli::Commands::Sweep => commands::sweep::execute(&vault, &*formatter),
        cli::Commands::Config(args) => commands::config::execute(&vault, args, &*formatter),
    }
}

fn data_dir(cli: &cli::Cli) -> Result<PathBuf> {
    if let Some(dir) = &cli.data_dir {
        return Ok(dir.clone());
    }
    dirs::data_dir()
        .map(|base| base.join("picvault"))
        .context("could not determine a data directory; pass --data-dir")
}

fn default_filter(cli: &cli::Cli) -> &'static str {
    if cli.verbose {
        "picvault_core=debug,picvault_cli=debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    }
}
