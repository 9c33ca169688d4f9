// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for transfers and storage layout construction

use crate::id::{ComponentId, DeviceId};
use thiserror::Error;

/// Reasons a transfer is rejected.
///
/// All of these are detected while validating the request, before any
/// bookkeeping is touched, so a rejected transfer leaves no trace.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    #[error("transfer of {component} names neither a source nor a destination")]
    InvalidTransfer { component: ComponentId },
    #[error("device not found: {device}")]
    UnknownDevice { device: DeviceId },
    #[error("component {component} already has a transfer in progress")]
    ComponentInTransfer { component: ComponentId },
    #[error("component {component} is not present on device {device}")]
    ComponentNotPresent {
        component: ComponentId,
        device: DeviceId,
    },
    #[error("component {component} is already present on device {device}")]
    ComponentAlreadyPresent {
        component: ComponentId,
        device: DeviceId,
    },
    #[error("component {component} is already on device {device}")]
    NoOpMove {
        component: ComponentId,
        device: DeviceId,
    },
}

impl TransferError {
    /// Stable snake_case name for reporting
    pub fn kind(&self) -> &'static str {
        match self {
            TransferError::InvalidTransfer { .. } => "invalid_transfer",
            TransferError::UnknownDevice { .. } => "unknown_device",
            TransferError::ComponentInTransfer { .. } => "component_in_transfer",
            TransferError::ComponentNotPresent { .. } => "component_not_present",
            TransferError::ComponentAlreadyPresent { .. } => "component_already_present",
            TransferError::NoOpMove { .. } => "noop_move",
        }
    }
}

/// Errors that can occur while building a storage system from a layout
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("layout declares no devices")]
    NoDevices,
    #[error("device {device} must have at least one slot, got {slots}")]
    InvalidCapacity { device: DeviceId, slots: i64 },
    #[error("component {component} is placed on unknown device {device}")]
    UnknownDevice {
        component: ComponentId,
        device: DeviceId,
    },
    #[error("device {device} holds {placed} components but has only {capacity} slots")]
    OverCapacity {
        device: DeviceId,
        placed: usize,
        capacity: usize,
    },
}
