// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scenario files
//!
//! A scenario is a storage layout plus the transfers to run against it:
//!
//! ```toml
//! [devices]
//! d1 = 1
//! d2 = 1
//!
//! [placements]
//! a = "d1"
//! b = "d2"
//!
//! [[transfer]]
//! component = "a"
//! from = "d1"
//! to = "d2"
//! prepare = "10ms"
//!
//! [[transfer]]
//! component = "b"
//! from = "d2"
//! to = "d1"
//! start_after = "5ms"
//! ```

use serde::{Deserialize, Serialize};
use slotswap_core::{ComponentId, DeviceId, LayoutError, StorageLayout, TransferKind};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid layout: {0}")]
    Layout(#[from] LayoutError),
    #[error("transfer #{index} ({component}) names neither `from` nor `to`")]
    InvalidTransfer { index: usize, component: ComponentId },
}

/// One transfer to run, with simulated phase durations
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransferEntry {
    pub component: ComponentId,
    #[serde(default)]
    pub from: Option<DeviceId>,
    #[serde(default)]
    pub to: Option<DeviceId>,
    #[serde(with = "humantime_serde", default)]
    pub prepare: Duration,
    #[serde(with = "humantime_serde", default)]
    pub perform: Duration,
    /// Delay before the transfer is submitted
    #[serde(with = "humantime_serde", default)]
    pub start_after: Duration,
}

impl TransferEntry {
    pub fn kind(&self) -> Option<TransferKind> {
        TransferKind::classify(self.from.as_ref(), self.to.as_ref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    #[serde(default)]
    pub devices: BTreeMap<DeviceId, i64>,
    #[serde(default)]
    pub placements: BTreeMap<ComponentId, DeviceId>,
    #[serde(default, rename = "transfer")]
    pub transfers: Vec<TransferEntry>,
}

impl Scenario {
    /// Read, parse, and validate a scenario file
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let content = std::fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let scenario = Self::parse(&content)?;
        scenario.validate()?;
        tracing::debug!(
            path = %path.display(),
            transfers = scenario.transfers.len(),
            "scenario loaded"
        );
        Ok(scenario)
    }

    pub fn parse(content: &str) -> Result<Self, ScenarioError> {
        Ok(toml::from_str(content)?)
    }

    pub fn layout(&self) -> StorageLayout {
        StorageLayout {
            devices: self.devices.clone(),
            placements: self.placements.clone(),
        }
    }

    /// Check the layout and the shape of every transfer.
    ///
    /// Transfers that are well formed but invalid against the storage state
    /// (unknown devices, misplaced components) are left to fail at run time,
    /// where they are reported per transfer.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        self.layout().validate()?;
        for (index, transfer) in self.transfers.iter().enumerate() {
            if transfer.kind().is_none() {
                return Err(ScenarioError::InvalidTransfer {
                    index,
                    component: transfer.component.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn summary(&self) -> ScenarioSummary {
        let mut transfers = BTreeMap::new();
        for kind in self.transfers.iter().filter_map(TransferEntry::kind) {
            *transfers.entry(kind.name()).or_insert(0) += 1;
        }

        let components: BTreeSet<&ComponentId> = self
            .placements
            .keys()
            .chain(self.transfers.iter().map(|t| &t.component))
            .collect();

        ScenarioSummary {
            devices: self.devices.len(),
            slots: self
                .devices
                .values()
                .map(|&slots| usize::try_from(slots).unwrap_or(0))
                .sum(),
            components: components.len(),
            placed: self.placements.len(),
            transfers,
        }
    }
}

/// Static overview printed by `slotswap check`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioSummary {
    pub devices: usize,
    pub slots: usize,
    /// Distinct components, placed or mentioned by a transfer
    pub components: usize,
    pub placed: usize,
    /// Transfer count per kind
    pub transfers: BTreeMap<&'static str, usize>,
}

impl fmt::Display for ScenarioSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "devices:    {} ({} slots)", self.devices, self.slots)?;
        writeln!(f, "components: {} ({} placed)", self.components, self.placed)?;
        let total: usize = self.transfers.values().sum();
        write!(f, "transfers:  {total}")?;
        if !self.transfers.is_empty() {
            let counts: Vec<String> = self
                .transfers
                .iter()
                .map(|(kind, count)| format!("{count} {kind}"))
                .collect();
            write!(f, " ({})", counts.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "scenario_tests.rs"]
mod tests;
