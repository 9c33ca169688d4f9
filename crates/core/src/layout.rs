// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Initial storage layout
//!
//! Describes device capacities and where components start out:
//!
//! ```toml
//! [devices]
//! d1 = 2
//! d2 = 1
//!
//! [placements]
//! a = "d1"
//! ```

use crate::device::Device;
use crate::error::LayoutError;
use crate::id::{ComponentId, DeviceId};
use crate::system::StorageSystem;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Device capacities and initial placements
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageLayout {
    /// Total slots per device
    #[serde(default)]
    pub devices: BTreeMap<DeviceId, i64>,
    /// Device each component starts on
    #[serde(default)]
    pub placements: BTreeMap<ComponentId, DeviceId>,
}

impl StorageLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a layout from TOML content
    pub fn parse(content: &str) -> Result<Self, LayoutError> {
        Ok(toml::from_str(content)?)
    }

    pub fn with_device(mut self, device: impl Into<DeviceId>, slots: i64) -> Self {
        self.devices.insert(device.into(), slots);
        self
    }

    pub fn with_placement(
        mut self,
        component: impl Into<ComponentId>,
        device: impl Into<DeviceId>,
    ) -> Self {
        self.placements.insert(component.into(), device.into());
        self
    }

    /// Components placed on each device
    pub fn occupancy(&self) -> BTreeMap<&DeviceId, usize> {
        let mut occupancy = BTreeMap::new();
        for device in self.placements.values() {
            *occupancy.entry(device).or_insert(0) += 1;
        }
        occupancy
    }

    /// Check the layout without building anything
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.devices.is_empty() {
            return Err(LayoutError::NoDevices);
        }

        for (device, &slots) in &self.devices {
            if slots <= 0 {
                return Err(LayoutError::InvalidCapacity {
                    device: device.clone(),
                    slots,
                });
            }
        }

        for (component, device) in &self.placements {
            if !self.devices.contains_key(device) {
                return Err(LayoutError::UnknownDevice {
                    component: component.clone(),
                    device: device.clone(),
                });
            }
        }

        for (device, placed) in self.occupancy() {
            let capacity = self.capacity(device);
            if placed > capacity {
                return Err(LayoutError::OverCapacity {
                    device: device.clone(),
                    placed,
                    capacity,
                });
            }
        }

        Ok(())
    }

    fn capacity(&self, device: &DeviceId) -> usize {
        self.devices
            .get(device)
            .and_then(|&slots| usize::try_from(slots).ok())
            .unwrap_or(0)
    }

    /// Validate and build a storage system in this layout
    pub fn build(&self) -> Result<StorageSystem, LayoutError> {
        self.validate()?;

        let occupancy = self.occupancy();
        let devices: HashMap<DeviceId, Device> = self
            .devices
            .keys()
            .map(|id| {
                let mut device = Device::new(id.clone(), self.capacity(id));
                let placed = occupancy.get(id).copied().unwrap_or(0);
                device.set_free_slots(device.total_slots() - placed);
                (id.clone(), device)
            })
            .collect();

        let placements: HashMap<ComponentId, DeviceId> = self
            .placements
            .iter()
            .map(|(component, device)| (component.clone(), device.clone()))
            .collect();

        tracing::debug!(
            devices = devices.len(),
            components = placements.len(),
            "storage system built"
        );
        Ok(StorageSystem::from_parts(devices, placements))
    }
}

#[cfg(test)]
#[path = "layout_tests.rs"]
mod tests;
