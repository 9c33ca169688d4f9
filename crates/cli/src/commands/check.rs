// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `slotswap check <scenario>` - Validate a scenario without running it

use crate::output::{self, OutputFormat};
use crate::scenario::Scenario;
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct CheckArgs {
    /// Scenario file (TOML)
    pub scenario: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

pub fn check(args: CheckArgs) -> Result<()> {
    let scenario = Scenario::load(&args.scenario)?;
    output::print(&scenario.summary(), args.format)?;
    Ok(())
}
