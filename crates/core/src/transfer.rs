// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transfer descriptors and the per-transfer state machine
//!
//! A transfer asks the storage system to add, remove, or move one component.
//! The caller supplies the two phases (`prepare`, then `perform`); the
//! storage system decides when each may run.

use crate::id::{ComponentId, DeviceId};
use std::sync::{Arc, Condvar};

/// A request to add, remove, or move a component.
///
/// Absent source means add, absent destination means remove, both present
/// means move. `prepare` and `perform` are each called exactly once, in that
/// order, without the storage system's lock held.
pub trait ComponentTransfer: Send {
    fn component_id(&self) -> &ComponentId;

    fn source_device_id(&self) -> Option<&DeviceId>;

    fn destination_device_id(&self) -> Option<&DeviceId>;

    /// First phase: may overlap with any other transfer's phases
    fn prepare(&mut self);

    /// Second phase: runs only after the slot this transfer enters has been
    /// prepared for hand-over
    fn perform(&mut self);
}

/// What a transfer does, derived from which devices it names
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferKind {
    Add { destination: DeviceId },
    Remove { source: DeviceId },
    Move { source: DeviceId, destination: DeviceId },
}

impl TransferKind {
    /// Classify by presence of source and destination; `None` if both absent
    pub fn classify(source: Option<&DeviceId>, destination: Option<&DeviceId>) -> Option<Self> {
        match (source, destination) {
            (None, None) => None,
            (None, Some(destination)) => Some(TransferKind::Add {
                destination: destination.clone(),
            }),
            (Some(source), None) => Some(TransferKind::Remove {
                source: source.clone(),
            }),
            (Some(source), Some(destination)) => Some(TransferKind::Move {
                source: source.clone(),
                destination: destination.clone(),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TransferKind::Add { .. } => "add",
            TransferKind::Remove { .. } => "remove",
            TransferKind::Move { .. } => "move",
        }
    }

    pub fn source(&self) -> Option<&DeviceId> {
        match self {
            TransferKind::Add { .. } => None,
            TransferKind::Remove { source } | TransferKind::Move { source, .. } => Some(source),
        }
    }

    pub fn destination(&self) -> Option<&DeviceId> {
        match self {
            TransferKind::Remove { .. } => None,
            TransferKind::Add { destination } | TransferKind::Move { destination, .. } => {
                Some(destination)
            }
        }
    }
}

/// How a transfer obtained its place on the destination device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Took a free slot
    Free,
    /// Claimed a slot offered by an outgoing transfer
    Handoff,
    /// Waited in the blocked queue and was handed a slot by an outgoing transfer
    Woken,
    /// Released as a member of a rotation of moves
    Rotation,
    /// Removal; nothing to enter
    Leaving,
}

/// Lifecycle of a transfer inside the storage system
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    /// Validated, deciding whether a slot is available
    Admitting,
    /// Waiting in a device's blocked queue
    Queued,
    /// Granted a place by rotation resolution, waiting for its turn signal
    RotationPending,
    Admitted(Admission),
    Preparing,
    Prepared,
    /// Prepared, waiting for the vacator of its slot to finish preparing
    AwaitingPredecessor,
    Performing,
}

impl TransferState {
    pub fn name(&self) -> &'static str {
        match self {
            TransferState::Admitting => "admitting",
            TransferState::Queued => "queued",
            TransferState::RotationPending => "rotation_pending",
            TransferState::Admitted(_) => "admitted",
            TransferState::Preparing => "preparing",
            TransferState::Prepared => "prepared",
            TransferState::AwaitingPredecessor => "awaiting_predecessor",
            TransferState::Performing => "performing",
        }
    }

    /// Whether `prepare` has returned
    pub fn is_prepared(&self) -> bool {
        matches!(
            self,
            TransferState::Prepared | TransferState::AwaitingPredecessor | TransferState::Performing
        )
    }

    pub fn is_admitted(&self) -> bool {
        !matches!(
            self,
            TransferState::Admitting | TransferState::Queued | TransferState::RotationPending
        )
    }

    pub fn can_advance_to(&self, next: TransferState) -> bool {
        use TransferState::*;
        matches!(
            (self, next),
            (Admitting, Queued)
                | (Admitting, Admitted(_))
                | (Queued, Admitted(Admission::Woken))
                | (Queued, RotationPending)
                | (RotationPending, Admitted(Admission::Rotation))
                | (Admitted(_), Preparing)
                | (Preparing, Prepared)
                | (Prepared, AwaitingPredecessor)
                | (Prepared, Performing)
                | (AwaitingPredecessor, Performing)
        )
    }
}

/// Bookkeeping for one in-flight transfer, keyed by its component
#[derive(Debug)]
pub(crate) struct TransferRecord {
    pub kind: TransferKind,
    pub state: TransferState,
    /// The outgoing component whose slot this transfer took over
    pub claimed: Option<ComponentId>,
    /// The incoming component that took over this transfer's slot
    pub claimed_by: Option<ComponentId>,
    /// Waited on (with the global lock) for admission, then for the
    /// predecessor's prepare
    pub signal: Arc<Condvar>,
}

impl TransferRecord {
    pub fn new(kind: TransferKind) -> Self {
        Self {
            kind,
            state: TransferState::Admitting,
            claimed: None,
            claimed_by: None,
            signal: Arc::new(Condvar::new()),
        }
    }

    pub fn advance(&mut self, component: &ComponentId, next: TransferState) {
        let legal = self.state.can_advance_to(next);
        debug_assert!(legal, "illegal transition {:?} -> {:?}", self.state, next);
        if !legal {
            tracing::error!(
                component = %component,
                from = self.state.name(),
                to = next.name(),
                "illegal transfer state transition"
            );
        }
        self.state = next;
    }
}

type Phase = Box<dyn FnMut() + Send>;

/// A transfer built from closures.
///
/// Handy for callers whose phases are plain functions, and for tests.
pub struct FnTransfer {
    component: ComponentId,
    source: Option<DeviceId>,
    destination: Option<DeviceId>,
    prepare: Phase,
    perform: Phase,
}

impl FnTransfer {
    pub fn new(
        component: impl Into<ComponentId>,
        source: Option<DeviceId>,
        destination: Option<DeviceId>,
    ) -> Self {
        Self {
            component: component.into(),
            source,
            destination,
            prepare: Box::new(|| {}),
            perform: Box::new(|| {}),
        }
    }

    pub fn add(component: impl Into<ComponentId>, destination: impl Into<DeviceId>) -> Self {
        Self::new(component, None, Some(destination.into()))
    }

    pub fn remove(component: impl Into<ComponentId>, source: impl Into<DeviceId>) -> Self {
        Self::new(component, Some(source.into()), None)
    }

    pub fn relocate(
        component: impl Into<ComponentId>,
        source: impl Into<DeviceId>,
        destination: impl Into<DeviceId>,
    ) -> Self {
        Self::new(component, Some(source.into()), Some(destination.into()))
    }

    pub fn on_prepare(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.prepare = Box::new(f);
        self
    }

    pub fn on_perform(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.perform = Box::new(f);
        self
    }
}

impl std::fmt::Debug for FnTransfer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnTransfer")
            .field("component", &self.component)
            .field("source", &self.source)
            .field("destination", &self.destination)
            .finish_non_exhaustive()
    }
}

impl ComponentTransfer for FnTransfer {
    fn component_id(&self) -> &ComponentId {
        &self.component
    }

    fn source_device_id(&self) -> Option<&DeviceId> {
        self.source.as_ref()
    }

    fn destination_device_id(&self) -> Option<&DeviceId> {
        self.destination.as_ref()
    }

    fn prepare(&mut self) {
        (self.prepare)()
    }

    fn perform(&mut self) {
        (self.perform)()
    }
}

#[cfg(test)]
#[path = "transfer_tests.rs"]
mod tests;
