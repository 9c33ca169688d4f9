// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runs a scenario's transfers against a storage system, one thread each

use crate::scenario::{Scenario, TransferEntry};
use serde::Serialize;
use slotswap_core::{ComponentId, FnTransfer, StorageSnapshot, StorageSystem, TransferError};
use std::fmt;
use std::thread;
use std::time::{Duration, Instant};

/// How one transfer ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferOutcome {
    pub component: ComponentId,
    pub kind: &'static str,
    /// `ok`, or the error kind
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(with = "humantime_serde")]
    pub elapsed: Duration,
}

impl TransferOutcome {
    fn new(entry: &TransferEntry, result: Result<(), TransferError>, elapsed: Duration) -> Self {
        let kind = entry.kind().map_or("invalid", |kind| kind.name());
        let (outcome, error) = match result {
            Ok(()) => ("ok", None),
            Err(err) => (err.kind(), Some(err.to_string())),
        };
        Self {
            component: entry.component.clone(),
            kind,
            outcome,
            error,
            elapsed,
        }
    }

    /// Outcome of a transfer whose phase panicked.
    ///
    /// Release builds abort on panic, so this is only seen in debug builds,
    /// and only when no other transfer claimed the panicked transfer's slot.
    /// Its record is never cleared, so a claimant linked to it waits forever
    /// and the run does not return.
    fn panicked(entry: &TransferEntry) -> Self {
        Self {
            component: entry.component.clone(),
            kind: entry.kind().map_or("invalid", |kind| kind.name()),
            outcome: "panicked",
            error: Some("transfer thread panicked".to_string()),
            elapsed: Duration::ZERO,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Everything `slotswap run` reports
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// In scenario order
    pub transfers: Vec<TransferOutcome>,
    pub snapshot: StorageSnapshot,
    pub violations: Vec<String>,
}

impl RunReport {
    pub fn is_consistent(&self) -> bool {
        self.violations.is_empty()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<12} {:<7} {:>10}  OUTCOME", "COMPONENT", "KIND", "ELAPSED")?;
        for t in &self.transfers {
            let elapsed = format!("{}ms", t.elapsed.as_millis());
            writeln!(
                f,
                "{:<12} {:<7} {:>10}  {}",
                t.component.as_str(),
                t.kind,
                elapsed,
                t.outcome
            )?;
        }
        writeln!(f)?;
        write!(f, "{}", self.snapshot)?;
        for violation in &self.violations {
            writeln!(f, "violation: {violation}")?;
        }
        Ok(())
    }
}

/// Submit every transfer from its own thread and wait for all of them.
///
/// Blocks for as long as any transfer waits for a slot; a scenario whose
/// transfers can never all be admitted does not return. Neither does one
/// where a phase panics while another transfer waits on its slot.
pub fn run(scenario: &Scenario, system: &StorageSystem) -> RunReport {
    let transfers = thread::scope(|s| {
        let handles: Vec<_> = scenario
            .transfers
            .iter()
            .map(|entry| s.spawn(move || run_one(entry, system)))
            .collect();

        handles
            .into_iter()
            .zip(&scenario.transfers)
            .map(|(handle, entry)| {
                handle
                    .join()
                    .unwrap_or_else(|_| TransferOutcome::panicked(entry))
            })
            .collect()
    });

    let snapshot = system.snapshot();
    let violations = snapshot.check_invariants();
    if !violations.is_empty() {
        tracing::warn!(count = violations.len(), "final state violates invariants");
    }
    RunReport {
        transfers,
        snapshot,
        violations,
    }
}

fn run_one(entry: &TransferEntry, system: &StorageSystem) -> TransferOutcome {
    if !entry.start_after.is_zero() {
        thread::sleep(entry.start_after);
    }

    let (prepare, perform) = (entry.prepare, entry.perform);
    let mut transfer = FnTransfer::new(
        entry.component.clone(),
        entry.from.clone(),
        entry.to.clone(),
    )
    .on_prepare(move || thread::sleep(prepare))
    .on_perform(move || thread::sleep(perform));

    let started = Instant::now();
    let result = system.execute(&mut transfer);
    let outcome = TransferOutcome::new(entry, result, started.elapsed());

    match &outcome.error {
        None => tracing::info!(
            component = %outcome.component,
            kind = outcome.kind,
            "transfer finished"
        ),
        Some(error) => tracing::info!(
            component = %outcome.component,
            error = %error,
            "transfer rejected"
        ),
    }
    outcome
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
