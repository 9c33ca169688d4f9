// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rotation search over the wait-dependency graph
//!
//! A move that finds its destination full waits on every component queued
//! for its own device, because one of them leaving is what lets this move's
//! slot go. When following those waits leads back to the move itself, the
//! moves form a rotation: each can take the slot of the next without any
//! free capacity.

use crate::id::{ComponentId, DeviceId};
use std::collections::{HashSet, VecDeque};

/// Read-only view of who waits where
pub trait WaitGraph {
    /// Components queued to enter `device`, oldest first
    fn blocked(&self, device: &DeviceId) -> &VecDeque<ComponentId>;

    /// Device a component currently resides on
    fn placement(&self, component: &ComponentId) -> Option<&DeviceId>;
}

struct Frame<'g> {
    component: &'g ComponentId,
    device: &'g DeviceId,
    next: usize,
}

/// Look for a rotation that closes on `start`.
///
/// `start` must already be queued on its destination and reside on
/// `origin`. The search is depth-first from `origin`, visiting each device
/// at most once.
///
/// The returned path begins with `start`. Every later member is queued on
/// the device of the member before it, and `start` is queued on the device
/// of the last member.
pub fn find_rotation<'g, G: WaitGraph>(
    graph: &'g G,
    start: &'g ComponentId,
    origin: &'g DeviceId,
) -> Option<Vec<ComponentId>> {
    let mut visited: HashSet<&'g DeviceId> = HashSet::new();
    visited.insert(origin);

    let mut stack = vec![Frame {
        component: start,
        device: origin,
        next: 0,
    }];

    while let Some(frame) = stack.last_mut() {
        let waiting = graph.blocked(frame.device);
        let Some(candidate) = waiting.get(frame.next) else {
            stack.pop();
            continue;
        };
        frame.next += 1;

        // Entrants that are being added reside nowhere, so nothing waits on them
        let Some(device) = graph.placement(candidate) else {
            continue;
        };

        if visited.contains(device) {
            if candidate == start {
                return Some(stack.iter().map(|f| f.component.clone()).collect());
            }
            continue;
        }

        visited.insert(device);
        stack.push(Frame {
            component: candidate,
            device,
            next: 0,
        });
    }

    None
}

#[cfg(test)]
#[path = "rotation_tests.rs"]
mod tests;
