//! Scenario run specs
//!
//! Verify `slotswap run` drives every transfer to an outcome and reports a
//! consistent final layout.

use crate::prelude::*;

const HANDOFF_SCENARIO: &str = r#"
[devices]
d1 = 1

[placements]
a = "d1"

[[transfer]]
component = "a"
from = "d1"
prepare = "20ms"

[[transfer]]
component = "b"
to = "d1"
start_after = "5ms"
"#;

const ROTATION_SCENARIO: &str = r#"
[devices]
d1 = 1
d2 = 1
d3 = 1

[placements]
a = "d1"
b = "d2"
c = "d3"

[[transfer]]
component = "a"
from = "d1"
to = "d2"

[[transfer]]
component = "b"
from = "d2"
to = "d3"

[[transfer]]
component = "c"
from = "d3"
to = "d1"
"#;

const REJECTED_SCENARIO: &str = r#"
[devices]
d1 = 2
d2 = 1

[placements]
a = "d1"

[[transfer]]
component = "a"
from = "d2"
to = "d1"

[[transfer]]
component = "a"
to = "d2"

[[transfer]]
component = "z"
from = "d1"

[[transfer]]
component = "a"
from = "d1"
to = "d1"

[[transfer]]
component = "x"
to = "d9"
"#;

#[test]
fn swap_completes() {
    let temp = Project::empty();
    temp.file("swap.toml", SWAP_SCENARIO);

    let report = temp
        .slotswap()
        .args(&["run", "swap.toml", "--format", "json"])
        .passes()
        .json();

    assert_eq!(report["transfers"][0]["outcome"], "ok");
    assert_eq!(report["transfers"][1]["outcome"], "ok");
    assert_eq!(report["snapshot"]["placements"]["a"], "d2");
    assert_eq!(report["snapshot"]["placements"]["b"], "d1");
    assert_eq!(report["violations"].as_array().unwrap().len(), 0);
}

#[test]
fn swap_text_report_lists_devices() {
    let temp = Project::empty();
    temp.file("swap.toml", SWAP_SCENARIO);

    temp.slotswap()
        .args(&["run", "swap.toml"])
        .passes()
        .stdout_has("COMPONENT")
        .stdout_has("DEVICE")
        .stdout_has("ok")
        .stdout_lacks("violation")
        .stdout_lacks("in flight");
}

#[test]
fn removal_hands_slot_to_waiting_add() {
    let temp = Project::empty();
    temp.file("handoff.toml", HANDOFF_SCENARIO);

    let report = temp
        .slotswap()
        .args(&["run", "handoff.toml", "--format", "json"])
        .passes()
        .json();

    assert_eq!(report["transfers"][0]["kind"], "remove");
    assert_eq!(report["transfers"][1]["kind"], "add");
    assert_eq!(report["snapshot"]["placements"]["b"], "d1");
    assert!(report["snapshot"]["placements"]["a"].is_null());
    assert_eq!(report["snapshot"]["devices"][0]["free_slots"], 0);
}

#[test]
fn three_way_rotation_completes() {
    let temp = Project::empty();
    temp.file("rotation.toml", ROTATION_SCENARIO);

    let report = temp
        .slotswap()
        .args(&["run", "rotation.toml", "--format", "json"])
        .passes()
        .json();

    let placements = &report["snapshot"]["placements"];
    assert_eq!(placements["a"], "d2");
    assert_eq!(placements["b"], "d3");
    assert_eq!(placements["c"], "d1");
    assert_eq!(report["snapshot"]["in_flight"].as_array().unwrap().len(), 0);
}

#[test]
fn rejected_transfers_report_their_error_kind() {
    let temp = Project::empty();
    temp.file("rejected.toml", REJECTED_SCENARIO);

    let report = temp
        .slotswap()
        .args(&["run", "rejected.toml", "--format", "json"])
        .passes()
        .json();

    let outcomes: Vec<&str> = report["transfers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["outcome"].as_str().unwrap())
        .collect();
    assert_eq!(
        outcomes,
        [
            "component_not_present",
            "component_already_present",
            "component_not_present",
            "noop_move",
            "unknown_device",
        ]
    );
    assert_eq!(report["snapshot"]["placements"]["a"], "d1");
}

#[test]
fn verbose_logs_rotation_to_stderr() {
    let temp = Project::empty();
    temp.file("swap.toml", SWAP_SCENARIO);

    temp.slotswap()
        .args(&["--verbose", "run", "swap.toml"])
        .passes()
        .stderr_has("resolving rotation");
}

#[test]
fn rust_log_overrides_verbose() {
    let temp = Project::empty();
    temp.file("swap.toml", SWAP_SCENARIO);

    let run = temp
        .slotswap()
        .env("RUST_LOG", "off")
        .args(&["--verbose", "run", "swap.toml"])
        .passes();
    assert_eq!(run.stderr(), "");
}
