// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event types emitted by the client.

use serde::Serialize;

use crate::connection::ConnectionState;
use crate::state::RoomState;
use crate::types::RoomId;

/// Events delivered to subscribers of [`crate::TermowifiClient`].
///
/// Events are the only path by which the worker task reaches host code;
/// they are always delivered through the broadcast bus or the callback
/// registry, never by a direct cross-task call.
#[derive(Debug, Clone, Serialize)]
pub enum ClientEvent {
    /// The device announced a room during discovery.
    RoomDiscovered {
        /// The announced room.
        room: RoomId,
    },

    /// A host-visible field of a room changed.
    RoomUpdated {
        /// The room that changed.
        room: RoomId,
        /// The complete new state of the room.
        state: RoomState,
    },

    /// A room stopped (or resumed) answering polls.
    AvailabilityChanged {
        /// The affected room.
        room: RoomId,
        /// Whether the room is currently answering.
        available: bool,
    },

    /// The TCP connection to the device changed state.
    ConnectionChanged {
        /// The new connection state.
        state: ConnectionState,
    },
}

impl ClientEvent {
    /// Returns the room this event concerns, if any.
    #[must_use]
    pub fn room(&self) -> Option<RoomId> {
        match self {
            Self::RoomDiscovered { room }
            | Self::RoomUpdated { room, .. }
            | Self::AvailabilityChanged { room, .. } => Some(*room),
            Self::ConnectionChanged { .. } => None,
        }
    }

    /// Returns `true` if this is a connection event.
    #[must_use]
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::ConnectionChanged { .. })
    }

    /// Creates a room-discovered event.
    #[must_use]
    pub(crate) fn room_discovered(room: RoomId) -> Self {
        Self::RoomDiscovered { room }
    }

    /// Creates a room-updated event.
    #[must_use]
    pub(crate) fn room_updated(room: RoomId, state: RoomState) -> Self {
        Self::RoomUpdated { room, state }
    }

    /// Creates an availability event.
    #[must_use]
    pub(crate) fn availability(room: RoomId, available: bool) -> Self {
        Self::AvailabilityChanged { room, available }
    }

    /// Creates a connection event.
    #[must_use]
    pub(crate) fn connection(state: ConnectionState) -> Self {
        Self::ConnectionChanged { state }
    }
}
