// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! slotswap - concurrent slot transfer simulator

mod commands;
mod output;
mod runner;
mod scenario;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{check, run};

#[derive(Parser)]
#[command(
    name = "slotswap",
    version,
    about = "Simulate concurrent component transfers between fixed-capacity devices"
)]
struct Cli {
    /// Log coordination decisions to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every transfer of a scenario concurrently and report the result
    Run(run::RunArgs),
    /// Validate a scenario and summarize it without running it
    Check(check::CheckArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Run(args) => run::run(args),
        Commands::Check(args) => check::check(args),
    }
}

fn setup_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}
