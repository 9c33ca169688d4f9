//! CLI help specs
//!
//! Verify the command surface is discoverable.

use crate::prelude::*;

#[test]
fn help_lists_subcommands() {
    let temp = Project::empty();
    temp.slotswap()
        .args(&["--help"])
        .passes()
        .stdout_has("run")
        .stdout_has("check")
        .stdout_has("--verbose");
}

#[test]
fn run_help_lists_formats() {
    let temp = Project::empty();
    temp.slotswap()
        .args(&["run", "--help"])
        .passes()
        .stdout_has("--format")
        .stdout_has("json");
}

#[test]
fn version_is_printed() {
    let temp = Project::empty();
    temp.slotswap()
        .args(&["--version"])
        .passes()
        .stdout_has("slotswap");
}

#[test]
fn missing_subcommand_fails() {
    let temp = Project::empty();
    temp.slotswap().args(&[]).fails().stderr_has("Usage");
}
