// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `slotswap run <scenario>` - Run every transfer of a scenario concurrently

use crate::output::{self, OutputFormat};
use crate::runner;
use crate::scenario::Scenario;
use anyhow::{bail, Result};
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct RunArgs {
    /// Scenario file (TOML)
    pub scenario: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

pub fn run(args: RunArgs) -> Result<()> {
    let scenario = Scenario::load(&args.scenario)?;
    let system = scenario.layout().build()?;

    tracing::info!(transfers = scenario.transfers.len(), "running scenario");
    let report = runner::run(&scenario, &system);
    let rejected = report.transfers.iter().filter(|t| !t.is_ok()).count();
    tracing::info!(rejected, "scenario finished");
    output::print(&report, args.format)?;

    if !report.is_consistent() {
        bail!(
            "final state violates {} invariant(s)",
            report.violations.len()
        );
    }
    Ok(())
}
