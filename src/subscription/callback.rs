// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Callback management for client subscriptions.
//!
//! This module provides the core types for managing subscription callbacks:
//!
//! - [`SubscriptionId`] - Unique identifier for unsubscribing
//! - [`CallbackRegistry`] - Internal registry for storing and dispatching callbacks

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::connection::ConnectionState;
use crate::state::RoomState;
use crate::types::RoomId;

/// Unique identifier for a subscription.
///
/// This ID is returned when creating a subscription and can be used to
/// unsubscribe later. IDs are unique within a client's lifetime.
///
/// # Examples
///
/// ```ignore
/// let sub_id = client.on_room_updated(|room, state| { /* ... */ });
///
/// // Later, unsubscribe
/// client.unsubscribe(sub_id);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Creates a new subscription ID with the given value.
    #[must_use]
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sub({})", self.0)
    }
}

/// Type alias for room update callbacks.
type RoomUpdatedCallback = Arc<dyn Fn(RoomId, &RoomState) + Send + Sync>;

/// Type alias for room discovery callbacks.
type RoomDiscoveredCallback = Arc<dyn Fn(RoomId) + Send + Sync>;

/// Type alias for room availability callbacks.
type AvailabilityCallback = Arc<dyn Fn(RoomId, bool) + Send + Sync>;

/// Type alias for connection state callbacks.
type ConnectionCallback = Arc<dyn Fn(&ConnectionState) + Send + Sync>;

/// Registry for managing client subscription callbacks.
///
/// This is an internal type used by the client to store and dispatch
/// callbacks. It uses thread-safe interior mutability via
/// `parking_lot::RwLock` for high performance in async contexts.
///
/// # Thread Safety
///
/// The registry is fully thread-safe and can be accessed from multiple tasks
/// concurrently. Callbacks are wrapped in `Arc` so they can be cloned cheaply.
pub struct CallbackRegistry {
    /// Counter for generating unique subscription IDs.
    next_id: AtomicU64,
    /// Room state update callbacks.
    room_updated_callbacks: RwLock<HashMap<SubscriptionId, RoomUpdatedCallback>>,
    /// Room discovery callbacks.
    room_discovered_callbacks: RwLock<HashMap<SubscriptionId, RoomDiscoveredCallback>>,
    /// Room availability callbacks.
    availability_callbacks: RwLock<HashMap<SubscriptionId, AvailabilityCallback>>,
    /// Connection state callbacks.
    connection_callbacks: RwLock<HashMap<SubscriptionId, ConnectionCallback>>,
}

impl CallbackRegistry {
    /// Creates a new empty callback registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            room_updated_callbacks: RwLock::new(HashMap::new()),
            room_discovered_callbacks: RwLock::new(HashMap::new()),
            availability_callbacks: RwLock::new(HashMap::new()),
            connection_callbacks: RwLock::new(HashMap::new()),
        }
    }

    /// Generates a new unique subscription ID.
    fn next_id(&self) -> SubscriptionId {
        SubscriptionId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    // =========================================================================
    // Registration methods
    // =========================================================================

    /// Registers a callback for room state updates.
    ///
    /// The callback receives the room and its complete new state.
    pub fn on_room_updated<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(RoomId, &RoomState) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.room_updated_callbacks
            .write()
            .insert(id, Arc::new(callback));
        id
    }

    /// Registers a callback for newly discovered rooms.
    pub fn on_room_discovered<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(RoomId) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.room_discovered_callbacks
            .write()
            .insert(id, Arc::new(callback));
        id
    }

    /// Registers a callback for room availability changes.
    pub fn on_availability_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(RoomId, bool) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.availability_callbacks
            .write()
            .insert(id, Arc::new(callback));
        id
    }

    /// Registers a callback for connection state changes.
    pub fn on_connection_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&ConnectionState) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.connection_callbacks
            .write()
            .insert(id, Arc::new(callback));
        id
    }

    // =========================================================================
    // Unsubscription
    // =========================================================================

    /// Unregisters a callback by its subscription ID.
    ///
    /// Returns `true` if a callback was found and removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        // Try each callback map until we find and remove the ID
        if self.room_updated_callbacks.write().remove(&id).is_some() {
            return true;
        }
        if self.room_discovered_callbacks.write().remove(&id).is_some() {
            return true;
        }
        if self.availability_callbacks.write().remove(&id).is_some() {
            return true;
        }
        if self.connection_callbacks.write().remove(&id).is_some() {
            return true;
        }
        false
    }

    /// Clears all callbacks.
    pub fn clear(&self) {
        self.room_updated_callbacks.write().clear();
        self.room_discovered_callbacks.write().clear();
        self.availability_callbacks.write().clear();
        self.connection_callbacks.write().clear();
    }

    // =========================================================================
    // Dispatch methods
    // =========================================================================

    /// Dispatches a room state update to all registered callbacks.
    ///
    /// Callbacks are called synchronously in an arbitrary order.
    pub fn dispatch_room_updated(&self, room: RoomId, state: &RoomState) {
        let callbacks = self.room_updated_callbacks.read();
        for callback in callbacks.values() {
            callback(room, state);
        }
    }

    /// Dispatches a room discovery to all registered callbacks.
    pub fn dispatch_room_discovered(&self, room: RoomId) {
        let callbacks = self.room_discovered_callbacks.read();
        for callback in callbacks.values() {
            callback(room);
        }
    }

    /// Dispatches a room availability change to all registered callbacks.
    pub fn dispatch_availability(&self, room: RoomId, available: bool) {
        let callbacks = self.availability_callbacks.read();
        for callback in callbacks.values() {
            callback(room, available);
        }
    }

    /// Dispatches a connection state change to all registered callbacks.
    pub fn dispatch_connection(&self, state: &ConnectionState) {
        let callbacks = self.connection_callbacks.read();
        for callback in callbacks.values() {
            callback(state);
        }
    }

    // =========================================================================
    // Statistics
    // =========================================================================

    /// Returns the total number of registered callbacks.
    #[must_use]
    pub fn callback_count(&self) -> usize {
        self.room_updated_callbacks.read().len()
            + self.room_discovered_callbacks.read().len()
            + self.availability_callbacks.read().len()
            + self.connection_callbacks.read().len()
    }

    /// Returns `true` if there are no registered callbacks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callback_count() == 0
    }
}

impl Default for CallbackRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("callback_count", &self.callback_count())
            .finish()
    }
}
