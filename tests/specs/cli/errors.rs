//! CLI error specs
//!
//! Verify that bad scenario files are rejected with a readable message
//! and a non-zero exit status, before any transfer runs.

use crate::prelude::*;

#[test]
fn missing_scenario_file_fails() {
    let temp = Project::empty();
    temp.slotswap()
        .args(&["run", "nowhere.toml"])
        .fails()
        .stderr_has("failed to read nowhere.toml");
}

#[test]
fn malformed_toml_fails() {
    let temp = Project::empty();
    temp.file("bad.toml", "[devices\nd1 = 1\n");
    temp.slotswap()
        .args(&["check", "bad.toml"])
        .fails()
        .stderr_has("TOML parse error");
}

#[test]
fn unknown_transfer_field_fails() {
    let temp = Project::empty();
    temp.file(
        "typo.toml",
        r#"
[devices]
d1 = 1

[[transfer]]
component = "a"
too = "d1"
"#,
    );
    temp.slotswap()
        .args(&["check", "typo.toml"])
        .fails()
        .stderr_has("too");
}

#[test]
fn overfull_layout_fails() {
    let temp = Project::empty();
    temp.file(
        "full.toml",
        r#"
[devices]
d1 = 1

[placements]
a = "d1"
b = "d1"
"#,
    );
    temp.slotswap()
        .args(&["run", "full.toml"])
        .fails()
        .stderr_has("holds 2 components but has only 1 slots");
}

#[test]
fn zero_capacity_device_fails() {
    let temp = Project::empty();
    temp.file("zero.toml", "[devices]\nd1 = 0\n");
    temp.slotswap()
        .args(&["check", "zero.toml"])
        .fails()
        .stderr_has("must have at least one slot");
}

#[test]
fn transfer_without_devices_fails() {
    let temp = Project::empty();
    temp.file(
        "shapeless.toml",
        r#"
[devices]
d1 = 1

[[transfer]]
component = "a"
"#,
    );
    temp.slotswap()
        .args(&["run", "shapeless.toml"])
        .fails()
        .stderr_has("names neither `from` nor `to`");
}

#[test]
fn unknown_format_fails() {
    let temp = Project::empty();
    temp.file("swap.toml", SWAP_SCENARIO);
    temp.slotswap()
        .args(&["run", "swap.toml", "--format", "yaml"])
        .fails()
        .stderr_has("invalid value 'yaml'");
}
