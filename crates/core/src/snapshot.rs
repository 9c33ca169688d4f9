// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Point-in-time views of the storage system

use crate::id::{ComponentId, DeviceId};
use serde::Serialize;
use std::collections::BTreeMap;

/// One device as seen at snapshot time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceSnapshot {
    pub id: DeviceId,
    pub total_slots: usize,
    pub free_slots: usize,
    /// Components whose placement is this device
    pub occupants: Vec<ComponentId>,
    /// Occupants with a remove or move in progress
    pub departing: Vec<ComponentId>,
    pub vacated: Vec<ComponentId>,
    pub blocked: Vec<ComponentId>,
}

/// Consistent view of every device, placement, and in-flight transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageSnapshot {
    pub devices: Vec<DeviceSnapshot>,
    pub placements: BTreeMap<ComponentId, DeviceId>,
    pub in_flight: Vec<ComponentId>,
}

impl StorageSnapshot {
    /// True when no transfer is in progress
    pub fn is_quiescent(&self) -> bool {
        self.in_flight.is_empty()
    }

    pub fn device(&self, id: &DeviceId) -> Option<&DeviceSnapshot> {
        self.devices.iter().find(|d| &d.id == id)
    }

    /// Check slot accounting, returning a description of each violation.
    ///
    /// Occupants that are on their way out may briefly share a device with
    /// the component that took over their slot, so capacity is checked
    /// against free slots plus staying occupants. Exact accounting
    /// (`free + occupants == total`) only holds while quiescent.
    pub fn check_invariants(&self) -> Vec<String> {
        let mut violations = Vec::new();

        for device in &self.devices {
            let staying = device.occupants.len().saturating_sub(device.departing.len());
            if device.free_slots + staying > device.total_slots {
                violations.push(format!(
                    "device {}: {} free + {} staying exceed capacity {}",
                    device.id, device.free_slots, staying, device.total_slots
                ));
            }

            if self.is_quiescent() {
                if device.free_slots + device.occupants.len() != device.total_slots {
                    violations.push(format!(
                        "device {}: {} free + {} placed != {} total",
                        device.id,
                        device.free_slots,
                        device.occupants.len(),
                        device.total_slots
                    ));
                }
                if !device.vacated.is_empty() || !device.blocked.is_empty() {
                    violations.push(format!(
                        "device {}: leftover waiters while quiescent",
                        device.id
                    ));
                }
            }
        }

        violations
    }
}

impl std::fmt::Display for StorageSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{:<12} {:>5} {:>5}  COMPONENTS", "DEVICE", "FREE", "TOTAL")?;
        for device in &self.devices {
            let occupants: Vec<&str> = device.occupants.iter().map(ComponentId::as_str).collect();
            writeln!(
                f,
                "{:<12} {:>5} {:>5}  {}",
                device.id.as_str(),
                device.free_slots,
                device.total_slots,
                occupants.join(", ")
            )?;
        }
        if !self.in_flight.is_empty() {
            let in_flight: Vec<&str> = self.in_flight.iter().map(ComponentId::as_str).collect();
            writeln!(f, "in flight: {}", in_flight.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
