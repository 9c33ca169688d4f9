// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! slotswap-core: concurrent slot coordination for fixed-capacity devices
//!
//! This crate provides:
//! - Devices with slot accounting, blocked queues, and vacated-slot pools
//! - A storage system that admits add, remove, and move transfers from many
//!   threads, handing slots directly between transfers and releasing closed
//!   rotations of moves without deadlock
//! - TOML-described initial layouts and serializable snapshots

pub mod device;
pub mod error;
pub mod id;
pub mod layout;
pub mod rotation;
pub mod snapshot;
pub mod system;
pub mod transfer;

pub use error::{LayoutError, TransferError};
pub use id::{ComponentId, DeviceId};
pub use layout::StorageLayout;
pub use rotation::{find_rotation, WaitGraph};
pub use snapshot::{DeviceSnapshot, StorageSnapshot};
pub use system::StorageSystem;
pub use transfer::{Admission, ComponentTransfer, FnTransfer, TransferKind, TransferState};
