use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use vtree_core::{VtreeConfig, console};

mod cli;
mod commands;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Cli::parse();

    if let Err(err) = init_tracing(args.verbose) {
        eprintln!("failed to initialise logging: {err}");
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            console::error(&format!("{err}"));
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Cli) -> Result<()> {
    let config = VtreeConfig::from_env();
    tracing::debug!(
        "registry {} ({} scoped, {} attempts)",
        config.default_registry,
        config.scoped_registries.len(),
        config.retry.max_attempts()
    );

    match args.command {
        Command::Tree(tree_args) => commands::tree::run(tree_args, &config).await,
        Command::Manifest(manifest_args) => commands::manifest::run(manifest_args, &config).await,
    }
}

fn init_tracing(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("warn,vtree_core=debug,vtree_cli=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!(err.to_string()))?;

    Ok(())
}
