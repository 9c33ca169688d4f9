//! Scenario check specs
//!
//! Verify `slotswap check` validates and summarizes without running.

use crate::prelude::*;

const MIXED_SCENARIO: &str = r#"
[devices]
d1 = 2
d2 = 1

[placements]
a = "d1"
b = "d2"

[[transfer]]
component = "a"
from = "d1"
to = "d2"

[[transfer]]
component = "b"
from = "d2"

[[transfer]]
component = "c"
to = "d1"
start_after = "1h"
"#;

#[test]
fn check_summarizes_scenario() {
    let temp = Project::empty();
    temp.file("mixed.toml", MIXED_SCENARIO);

    temp.slotswap()
        .args(&["check", "mixed.toml"])
        .passes()
        .stdout_eq(
            "devices:    2 (3 slots)\n\
             components: 3 (2 placed)\n\
             transfers:  3 (1 add, 1 move, 1 remove)\n",
        );
}

#[test]
fn check_does_not_run_transfers() {
    // The add waits an hour before starting; check must return at once
    let temp = Project::empty();
    temp.file("mixed.toml", MIXED_SCENARIO);
    temp.slotswap()
        .args(&["check", "mixed.toml"])
        .passes()
        .stdout_lacks("COMPONENT");
}

#[test]
fn check_json_summary() {
    let temp = Project::empty();
    temp.file("mixed.toml", MIXED_SCENARIO);

    let summary = temp
        .slotswap()
        .args(&["check", "mixed.toml", "--format", "json"])
        .passes()
        .json();

    assert_eq!(summary["devices"], 2);
    assert_eq!(summary["components"], 3);
    assert_eq!(summary["transfers"]["move"], 1);
    assert_eq!(summary["transfers"]["add"], 1);
}

#[test]
fn check_accepts_absolute_paths() {
    let temp = Project::empty();
    temp.file("nested/swap.toml", SWAP_SCENARIO);
    let path = temp.path().join("nested/swap.toml");

    temp.slotswap()
        .args(&["check", path.to_str().unwrap()])
        .passes()
        .stdout_has("transfers:  2 (2 move)");
}
