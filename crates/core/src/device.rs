// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Device slot accounting
//!
//! A device tracks how many of its slots are free, which outgoing components
//! have offered their slot without anyone claiming it yet (the vacated pool),
//! and which incoming components are waiting for a slot (the blocked queue).
//!
//! Devices carry no synchronization of their own. They are only ever touched
//! while the storage system's global lock is held.

use crate::id::{ComponentId, DeviceId};
use std::collections::VecDeque;

/// A fixed-capacity storage device
#[derive(Clone, Debug)]
pub struct Device {
    id: DeviceId,
    total_slots: usize,
    free_slots: usize,
    /// Outgoing components whose slot is offered but not yet claimed
    vacated: VecDeque<ComponentId>,
    /// Incoming components waiting for a slot, in arrival order
    blocked: VecDeque<ComponentId>,
}

impl Device {
    pub fn new(id: DeviceId, total_slots: usize) -> Self {
        Self {
            id,
            total_slots,
            free_slots: total_slots,
            vacated: VecDeque::new(),
            blocked: VecDeque::new(),
        }
    }

    pub fn id(&self) -> &DeviceId {
        &self.id
    }

    pub fn total_slots(&self) -> usize {
        self.total_slots
    }

    pub fn free_slots(&self) -> usize {
        self.free_slots
    }

    pub fn set_free_slots(&mut self, free_slots: usize) {
        debug_assert!(free_slots <= self.total_slots);
        self.free_slots = free_slots;
    }

    /// Take one free slot if there is any
    pub fn take_free_slot(&mut self) -> bool {
        if self.free_slots == 0 {
            return false;
        }
        self.free_slots -= 1;
        true
    }

    /// Return a physically freed slot to the free count.
    ///
    /// Crediting a device that is already fully free is an accounting bug;
    /// it is logged and the count is left alone.
    pub fn credit_slot(&mut self) {
        let overflow = self.free_slots >= self.total_slots;
        debug_assert!(!overflow, "slot credited twice");
        if overflow {
            tracing::error!(
                device = %self.id,
                total_slots = self.total_slots,
                "slot credited on a device with no slot in use"
            );
            return;
        }
        self.free_slots += 1;
    }

    // === Blocked queue ===

    pub fn blocked(&self) -> &VecDeque<ComponentId> {
        &self.blocked
    }

    pub fn enqueue_blocked(&mut self, component: ComponentId) {
        self.blocked.push_back(component);
    }

    /// Remove and return the longest-waiting entrant
    pub fn pop_blocked(&mut self) -> Option<ComponentId> {
        self.blocked.pop_front()
    }

    /// Remove a specific entrant, wherever it sits in the queue
    pub fn remove_blocked(&mut self, component: &ComponentId) -> bool {
        match self.blocked.iter().position(|c| c == component) {
            Some(pos) => {
                self.blocked.remove(pos);
                true
            }
            None => false,
        }
    }

    // === Vacated pool ===

    pub fn vacated(&self) -> &VecDeque<ComponentId> {
        &self.vacated
    }

    pub fn offer_vacated(&mut self, component: ComponentId) {
        self.vacated.push_back(component);
    }

    pub fn has_vacated(&self, component: &ComponentId) -> bool {
        self.vacated.contains(component)
    }

    /// Claim the oldest unclaimed vacated slot
    pub fn claim_vacated(&mut self) -> Option<ComponentId> {
        self.vacated.pop_front()
    }

    pub fn withdraw_vacated(&mut self, component: &ComponentId) -> bool {
        match self.vacated.iter().position(|c| c == component) {
            Some(pos) => {
                self.vacated.remove(pos);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
#[path = "device_tests.rs"]
mod tests;
