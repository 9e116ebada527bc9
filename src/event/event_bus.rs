// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Broadcast bus distributing [`ClientEvent`]s to any number of listeners.

use tokio::sync::broadcast;
use tracing::trace;

use super::ClientEvent;

/// Default capacity of the broadcast channel.
///
/// A slow subscriber that falls more than this many events behind starts
/// receiving [`broadcast::error::RecvError::Lagged`] instead of events.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Fan-out channel for client events.
///
/// Cloning the bus is cheap; all clones publish into the same channel.
/// Publishing never blocks and never fails: events published while no
/// subscriber exists are dropped silently.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ClientEvent>,
}

impl EventBus {
    /// Creates a bus with [`DEFAULT_CHANNEL_CAPACITY`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Creates a bus with a custom channel capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero, mirroring [`broadcast::channel`].
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribes to all future events.
    ///
    /// Events published before this call are not replayed.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.sender.subscribe()
    }

    /// Publishes an event, returning the number of subscribers that
    /// received it.
    pub fn publish(&self, event: ClientEvent) -> usize {
        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(_) => {
                trace!("event dropped, no subscribers");
                0
            }
        }
    }

    /// Returns the current number of subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
