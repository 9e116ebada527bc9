// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Authoritative store of per-room state.
//!
//! The store is mutated only by the worker task; every other component
//! reads it through cloned snapshots behind the client's shared read lock.

use std::collections::BTreeMap;

use crate::codec::RoomField;
use crate::types::RoomId;

use super::RoomState;

/// Result of merging one reported field into the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// The room was not known before this frame.
    pub created: bool,
    /// A host-visible value changed.
    pub changed: bool,
    /// The room was stale and is now answering again.
    pub became_available: bool,
}

/// In-memory mapping of room id to last-known state.
#[derive(Debug, Default)]
pub struct RoomStore {
    rooms: BTreeMap<RoomId, Entry>,
}

#[derive(Debug)]
struct Entry {
    state: RoomState,
    missed_polls: u32,
}

impl Entry {
    fn new(room: RoomId) -> Self {
        Self {
            state: RoomState::new(room),
            missed_polls: 0,
        }
    }
}

impl RoomStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if no rooms have been discovered yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Returns `true` if the room has been discovered.
    #[must_use]
    pub fn contains(&self, room: RoomId) -> bool {
        self.rooms.contains_key(&room)
    }

    /// All discovered room ids, in order.
    #[must_use]
    pub fn room_ids(&self) -> Vec<RoomId> {
        self.rooms.keys().copied().collect()
    }

    /// Registers a discovered room. Returns `true` if it was new.
    pub fn discover(&mut self, room: RoomId) -> bool {
        if self.rooms.contains_key(&room) {
            return false;
        }
        self.rooms.insert(room, Entry::new(room));
        true
    }

    /// Merges a reported field into the room's state.
    ///
    /// Creates the entry if the device answered for a room it never
    /// announced. Any answer also clears the room's missed-poll count and
    /// restores availability.
    pub fn apply(&mut self, room: RoomId, field: RoomField) -> ApplyOutcome {
        let created = !self.rooms.contains_key(&room);
        let entry = self.rooms.entry(room).or_insert_with(|| Entry::new(room));

        entry.missed_polls = 0;
        let became_available = entry.state.set_available(true);
        let changed = entry.state.apply(field);

        ApplyOutcome {
            created,
            changed,
            became_available,
        }
    }

    /// A copy of one room's state.
    #[must_use]
    pub fn get(&self, room: RoomId) -> Option<RoomState> {
        self.rooms.get(&room).map(|e| e.state.clone())
    }

    /// An immutable copy of all room states, in room-id order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<RoomState> {
        self.rooms.values().map(|e| e.state.clone()).collect()
    }

    /// Closes a poll cycle, bumping the missed count of every room that
    /// did not answer.
    ///
    /// Rooms whose missed count reaches `max_missed_polls` are flagged
    /// unavailable; the newly unavailable ids are returned so the worker
    /// can notify subscribers.
    pub fn finish_poll_cycle(&mut self, answered: &[RoomId], max_missed_polls: u32) -> Vec<RoomId> {
        let mut newly_stale = Vec::new();
        for (id, entry) in &mut self.rooms {
            if answered.contains(id) {
                continue;
            }
            entry.missed_polls = entry.missed_polls.saturating_add(1);
            if entry.missed_polls >= max_missed_polls && entry.state.set_available(false) {
                newly_stale.push(*id);
            }
        }
        newly_stale
    }

    /// Marks every room unavailable, returning the ids that changed.
    ///
    /// Called when the connection is lost: rooms cannot answer polls
    /// through a dead socket, so their staleness counters are moot.
    pub fn mark_all_unavailable(&mut self) -> Vec<RoomId> {
        let mut changed = Vec::new();
        for (id, entry) in &mut self.rooms {
            entry.missed_polls = 0;
            if entry.state.set_available(false) {
                changed.push(*id);
            }
        }
        changed
    }

    /// Drops all rooms. Used when the client stops.
    pub fn clear(&mut self) {
        self.rooms.clear();
    }
}
