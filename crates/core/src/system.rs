// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Concurrent storage system
//!
//! Admits add, remove, and move transfers submitted from any number of
//! threads without exceeding any device's capacity. All bookkeeping lives in
//! one [`State`] behind a single mutex. The mutex is released around every
//! phase callback and every wait, so each resumed step re-reads state rather
//! than trusting what it saw before suspending.
//!
//! Slots move between transfers in three ways:
//! - a free slot is taken directly;
//! - an outgoing transfer hands its slot to the oldest blocked entrant, or
//!   offers it in the device's vacated pool for the next entrant to claim;
//! - moves that wait on each other in a closed rotation are all released at
//!   once, each taking the slot of the next.
//!
//! A claimant's `perform` never starts before the vacator of its slot has
//! finished `prepare`.

use crate::device::Device;
use crate::error::TransferError;
use crate::id::{ComponentId, DeviceId};
use crate::rotation::{find_rotation, WaitGraph};
use crate::snapshot::{DeviceSnapshot, StorageSnapshot};
use crate::transfer::{
    Admission, ComponentTransfer, TransferKind, TransferRecord, TransferState,
};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Shared bookkeeping, only touched with the lock held
#[derive(Debug, Default)]
pub(crate) struct State {
    devices: HashMap<DeviceId, Device>,
    placements: HashMap<ComponentId, DeviceId>,
    transfers: HashMap<ComponentId, TransferRecord>,
}

type Guard<'a> = MutexGuard<'a, State>;

static NOBODY_WAITING: VecDeque<ComponentId> = VecDeque::new();

/// Storage system coordinating concurrent transfers
#[derive(Debug)]
pub struct StorageSystem {
    state: Mutex<State>,
}

impl StorageSystem {
    /// Build from already validated devices and placements.
    ///
    /// [`crate::StorageLayout::build`] is the checked entry point.
    pub(crate) fn from_parts(
        devices: HashMap<DeviceId, Device>,
        placements: HashMap<ComponentId, DeviceId>,
    ) -> Self {
        Self {
            state: Mutex::new(State {
                devices,
                placements,
                transfers: HashMap::new(),
            }),
        }
    }

    fn lock(&self) -> Guard<'_> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run a transfer to completion.
    ///
    /// Blocks the calling thread until the transfer is admitted and both of
    /// its phases have run. Fails without side effects if the request is
    /// invalid for the current state.
    pub fn execute(&self, transfer: &mut dyn ComponentTransfer) -> Result<(), TransferError> {
        let component = transfer.component_id().clone();
        let mut state = self.lock();

        let kind = state.validate(
            &component,
            transfer.source_device_id(),
            transfer.destination_device_id(),
        )?;

        tracing::debug!(component = %component, kind = kind.name(), "transfer started");
        state
            .transfers
            .insert(component.clone(), TransferRecord::new(kind.clone()));

        match kind {
            TransferKind::Add { destination } => {
                state = self.enter(state, &component, &destination, None);
                state = self.prepare(state, &component, transfer);
                state = self.await_predecessor(state, &component);
                state = self.perform(state, &component, None, transfer);
                state.complete(&component, Some(destination));
            }
            TransferKind::Remove { source } => {
                state.advance(&component, TransferState::Admitted(Admission::Leaving));
                state.announce_vacancy(&component, &source);
                state = self.prepare(state, &component, transfer);
                state = self.perform(state, &component, Some(&source), transfer);
                state.complete(&component, None);
            }
            TransferKind::Move {
                source,
                destination,
            } => {
                state = self.enter(state, &component, &destination, Some(&source));
                if state.admission_of(&component) == Some(Admission::Rotation) {
                    state.signal_next_in_rotation(&component);
                } else {
                    state.announce_vacancy(&component, &source);
                }
                state = self.prepare(state, &component, transfer);
                state = self.await_predecessor(state, &component);
                state = self.perform(state, &component, Some(&source), transfer);
                state.complete(&component, Some(destination));
            }
        }

        Ok(())
    }

    /// Obtain a place on `destination`, waiting if there is none.
    ///
    /// `origin` is the device a move leaves; only moves search for rotations.
    fn enter<'a>(
        &'a self,
        mut state: Guard<'a>,
        component: &ComponentId,
        destination: &DeviceId,
        origin: Option<&DeviceId>,
    ) -> Guard<'a> {
        let Some(device) = state.devices.get_mut(destination) else {
            return state;
        };

        if device.take_free_slot() {
            tracing::debug!(component = %component, device = %destination, "admitted to free slot");
            state.advance(component, TransferState::Admitted(Admission::Free));
            return state;
        }

        if let Some(vacator) = device.claim_vacated() {
            tracing::debug!(
                component = %component,
                device = %destination,
                vacator = %vacator,
                "claimed vacated slot"
            );
            state.link(component, &vacator);
            state.advance(component, TransferState::Admitted(Admission::Handoff));
            return state;
        }

        device.enqueue_blocked(component.clone());
        state.advance(component, TransferState::Queued);
        tracing::debug!(component = %component, device = %destination, "queued for slot");

        if let Some(origin) = origin {
            if let Some(rotation) = find_rotation(&*state, component, origin) {
                state.resolve_rotation(&rotation);
                state.advance(component, TransferState::Admitted(Admission::Rotation));
                return state;
            }
        }

        self.wait_until(state, component, |state| {
            state
                .transfers
                .get(component)
                .is_some_and(|record| record.state.is_admitted())
        })
    }

    fn prepare<'a>(
        &'a self,
        mut state: Guard<'a>,
        component: &ComponentId,
        transfer: &mut dyn ComponentTransfer,
    ) -> Guard<'a> {
        state.advance(component, TransferState::Preparing);
        state = self.unlocked(state, || {
            tracing::trace!(component = %component, "prepare");
            transfer.prepare();
        });
        state.advance(component, TransferState::Prepared);

        // Whoever took over our slot may now be waiting to perform
        if let Some(claimant) = state.claimant_of(component) {
            state.notify(&claimant);
        }
        state
    }

    fn await_predecessor<'a>(&'a self, mut state: Guard<'a>, component: &ComponentId) -> Guard<'a> {
        if let Some(vacator) = state.vacator_of(component) {
            if !state.is_prepared(&vacator) {
                state.advance(component, TransferState::AwaitingPredecessor);
                tracing::debug!(component = %component, vacator = %vacator, "waiting for vacator to prepare");
                state = self.wait_until(state, component, |state| {
                    state.vacator_ready(component)
                });
            }
        }
        state
    }

    /// Run `perform`, then give back the source slot if nobody claimed it
    fn perform<'a>(
        &'a self,
        mut state: Guard<'a>,
        component: &ComponentId,
        source: Option<&DeviceId>,
        transfer: &mut dyn ComponentTransfer,
    ) -> Guard<'a> {
        state.advance(component, TransferState::Performing);
        state = self.unlocked(state, || {
            tracing::trace!(component = %component, "perform");
            transfer.perform();
        });

        // An unclaimed offer means the freed slot goes back to the free count
        if let Some(source) = source {
            if let Some(device) = state.devices.get_mut(source) {
                if device.withdraw_vacated(component) {
                    device.credit_slot();
                    tracing::debug!(component = %component, device = %source, "slot returned to free pool");
                }
            }
        }
        state
    }

    fn unlocked<'a>(&'a self, state: Guard<'a>, f: impl FnOnce()) -> Guard<'a> {
        drop(state);
        f();
        self.lock()
    }

    /// Sleep on the component's signal until `ready` holds
    fn wait_until<'a>(
        &'a self,
        mut state: Guard<'a>,
        component: &ComponentId,
        ready: impl Fn(&State) -> bool,
    ) -> Guard<'a> {
        let Some(signal) = state
            .transfers
            .get(component)
            .map(|record| Arc::clone(&record.signal))
        else {
            return state;
        };

        while !ready(&state) {
            state = signal.wait(state).unwrap_or_else(PoisonError::into_inner);
        }
        state
    }

    // === Inspection ===

    /// Device a component currently resides on
    pub fn placement_of(&self, component: &ComponentId) -> Option<DeviceId> {
        self.lock().placements.get(component).cloned()
    }

    pub fn free_slots(&self, device: &DeviceId) -> Option<usize> {
        self.lock().devices.get(device).map(Device::free_slots)
    }

    /// Number of transfers currently in progress
    pub fn in_flight(&self) -> usize {
        self.lock().transfers.len()
    }

    /// Consistent view of all bookkeeping
    pub fn snapshot(&self) -> StorageSnapshot {
        self.lock().snapshot()
    }
}

impl State {
    fn validate(
        &self,
        component: &ComponentId,
        source: Option<&DeviceId>,
        destination: Option<&DeviceId>,
    ) -> Result<TransferKind, TransferError> {
        let kind = TransferKind::classify(source, destination).ok_or_else(|| {
            TransferError::InvalidTransfer {
                component: component.clone(),
            }
        })?;

        for device in [kind.source(), kind.destination()].into_iter().flatten() {
            if !self.devices.contains_key(device) {
                return Err(TransferError::UnknownDevice {
                    device: device.clone(),
                });
            }
        }

        if self.transfers.contains_key(component) {
            return Err(TransferError::ComponentInTransfer {
                component: component.clone(),
            });
        }

        let placement = self.placements.get(component);
        match &kind {
            TransferKind::Add { .. } => {
                if let Some(device) = placement {
                    return Err(TransferError::ComponentAlreadyPresent {
                        component: component.clone(),
                        device: device.clone(),
                    });
                }
            }
            TransferKind::Remove { source } | TransferKind::Move { source, .. } => {
                if placement != Some(source) {
                    return Err(TransferError::ComponentNotPresent {
                        component: component.clone(),
                        device: source.clone(),
                    });
                }
            }
        }

        if let TransferKind::Move {
            source,
            destination,
        } = &kind
        {
            if source == destination {
                return Err(TransferError::NoOpMove {
                    component: component.clone(),
                    device: source.clone(),
                });
            }
        }

        Ok(kind)
    }

    fn advance(&mut self, component: &ComponentId, next: TransferState) {
        if let Some(record) = self.transfers.get_mut(component) {
            record.advance(component, next);
        }
    }

    fn notify(&self, component: &ComponentId) {
        if let Some(record) = self.transfers.get(component) {
            record.signal.notify_one();
        }
    }

    /// Record that `claimant` takes over the slot `vacator` is leaving
    fn link(&mut self, claimant: &ComponentId, vacator: &ComponentId) {
        if let Some(record) = self.transfers.get_mut(claimant) {
            record.claimed = Some(vacator.clone());
        }
        if let Some(record) = self.transfers.get_mut(vacator) {
            record.claimed_by = Some(claimant.clone());
        }
    }

    fn vacator_of(&self, component: &ComponentId) -> Option<ComponentId> {
        self.transfers.get(component)?.claimed.clone()
    }

    fn claimant_of(&self, component: &ComponentId) -> Option<ComponentId> {
        self.transfers.get(component)?.claimed_by.clone()
    }

    fn admission_of(&self, component: &ComponentId) -> Option<Admission> {
        match self.transfers.get(component)?.state {
            TransferState::Admitted(admission) => Some(admission),
            _ => None,
        }
    }

    /// A finished transfer has no record left and counts as prepared
    fn is_prepared(&self, component: &ComponentId) -> bool {
        match self.transfers.get(component) {
            Some(record) => record.state.is_prepared(),
            None => true,
        }
    }

    /// Whether the vacator of `component`'s slot has finished preparing.
    ///
    /// Reads the live link: once the vacator completes the link is cleared,
    /// and a later transfer reusing its component id is not consulted.
    fn vacator_ready(&self, component: &ComponentId) -> bool {
        self.vacator_of(component)
            .is_none_or(|vacator| self.is_prepared(&vacator))
    }

    /// Offer the slot `component` is leaving on `source`
    fn announce_vacancy(&mut self, component: &ComponentId, source: &DeviceId) {
        let Some(device) = self.devices.get_mut(source) else {
            return;
        };

        match device.pop_blocked() {
            Some(waiter) => {
                tracing::debug!(
                    component = %component,
                    device = %source,
                    waiter = %waiter,
                    "handing slot to blocked entrant"
                );
                self.link(&waiter, component);
                self.advance(&waiter, TransferState::Admitted(Admission::Woken));
                self.notify(&waiter);
            }
            None => {
                tracing::debug!(component = %component, device = %source, "slot offered");
                device.offer_vacated(component.clone());
            }
        }
    }

    /// Release every member of a rotation at once.
    ///
    /// Each member takes over the slot of the member before it in `rotation`
    /// and leaves the queue it was blocked in. Members stay asleep until the
    /// member whose slot they take signals them.
    fn resolve_rotation(&mut self, rotation: &[ComponentId]) {
        tracing::info!(
            members = rotation.len(),
            start = %rotation.first().map(ComponentId::as_str).unwrap_or_default(),
            "resolving rotation"
        );

        for (i, vacator) in rotation.iter().enumerate() {
            let claimant = &rotation[(i + 1) % rotation.len()];
            self.link(claimant, vacator);
            if let Some(home) = self.placements.get(vacator) {
                if let Some(device) = self.devices.get_mut(home) {
                    device.remove_blocked(claimant);
                }
            }
            self.advance(vacator, TransferState::RotationPending);
        }
    }

    /// Wake the rotation member taking over this component's slot, if it is
    /// still waiting for its turn
    fn signal_next_in_rotation(&mut self, component: &ComponentId) {
        let Some(next) = self.claimant_of(component) else {
            return;
        };
        let pending = self
            .transfers
            .get(&next)
            .is_some_and(|record| record.state == TransferState::RotationPending);
        if pending {
            tracing::debug!(component = %component, next = %next, "signalling next rotation member");
            self.advance(&next, TransferState::Admitted(Admission::Rotation));
            self.notify(&next);
        }
    }

    /// Drop all transient state of a transfer and record where it ended up
    fn complete(&mut self, component: &ComponentId, destination: Option<DeviceId>) {
        if let Some(record) = self.transfers.remove(component) {
            if let Some(vacator) = record.claimed {
                if let Some(other) = self.transfers.get_mut(&vacator) {
                    if other.claimed_by.as_ref() == Some(component) {
                        other.claimed_by = None;
                    }
                }
            }
            if let Some(claimant) = record.claimed_by {
                if let Some(other) = self.transfers.get_mut(&claimant) {
                    if other.claimed.as_ref() == Some(component) {
                        other.claimed = None;
                    }
                }
            }
        }

        match destination {
            Some(device) => {
                tracing::debug!(component = %component, device = %device, "transfer complete");
                self.placements.insert(component.clone(), device);
            }
            None => {
                tracing::debug!(component = %component, "component removed");
                self.placements.remove(component);
            }
        }
    }

    fn snapshot(&self) -> StorageSnapshot {
        let mut devices: Vec<DeviceSnapshot> = self
            .devices
            .values()
            .map(|device| {
                let mut occupants: Vec<ComponentId> = self
                    .placements
                    .iter()
                    .filter(|(_, home)| *home == device.id())
                    .map(|(component, _)| component.clone())
                    .collect();
                occupants.sort();

                let departing = occupants
                    .iter()
                    .filter(|component| {
                        self.transfers
                            .get(*component)
                            .is_some_and(|record| record.kind.source() == Some(device.id()))
                    })
                    .cloned()
                    .collect();

                DeviceSnapshot {
                    id: device.id().clone(),
                    total_slots: device.total_slots(),
                    free_slots: device.free_slots(),
                    occupants,
                    departing,
                    vacated: device.vacated().iter().cloned().collect(),
                    blocked: device.blocked().iter().cloned().collect(),
                }
            })
            .collect();
        devices.sort_by(|a, b| a.id.cmp(&b.id));

        let mut in_flight: Vec<ComponentId> = self.transfers.keys().cloned().collect();
        in_flight.sort();

        StorageSnapshot {
            devices,
            placements: self
                .placements
                .iter()
                .map(|(component, device)| (component.clone(), device.clone()))
                .collect(),
            in_flight,
        }
    }
}

impl WaitGraph for State {
    fn blocked(&self, device: &DeviceId) -> &VecDeque<ComponentId> {
        self.devices
            .get(device)
            .map(Device::blocked)
            .unwrap_or(&NOBODY_WAITING)
    }

    fn placement(&self, component: &ComponentId) -> Option<&DeviceId> {
        self.placements.get(component)
    }
}

#[cfg(test)]
#[path = "system_tests.rs"]
mod tests;
