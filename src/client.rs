// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The public client facade.

use std::sync::Arc;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{RwLock, broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::connection::{ConnectionState, DeviceAddress};
use crate::error::{CommandError, Error, Result};
use crate::event::{ClientEvent, EventBus};
use crate::state::{RoomState, RoomStore};
use crate::subscription::{CallbackRegistry, SubscriptionId};
use crate::types::{HvacMode, RoomId, TargetTemperature};
use crate::worker::{Command, Worker};

/// Handles owned only while the worker task is alive.
struct Running {
    command_tx: mpsc::Sender<Command>,
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Builder for [`TermowifiClient`].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use termowifi::{ClientConfig, TermowifiClient};
///
/// let client = TermowifiClient::builder("192.168.1.50", 5000)
///     .with_config(ClientConfig::new().with_poll_interval(Duration::from_secs(30)))
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct TermowifiClientBuilder {
    address: DeviceAddress,
    config: ClientConfig,
}

impl TermowifiClientBuilder {
    /// Creates a builder for a controller at `host:port`.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            address: DeviceAddress::new(host, port),
            config: ClientConfig::default(),
        }
    }

    /// Replaces the whole configuration.
    #[must_use]
    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the interval between poll cycles.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: std::time::Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// Sets the command queue capacity.
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    /// Builds the client. The client does not connect until
    /// [`TermowifiClient::start`] is called.
    #[must_use]
    pub fn build(self) -> TermowifiClient {
        let (connection_tx, connection_rx) = watch::channel(ConnectionState::Disconnected);
        TermowifiClient {
            address: self.address,
            config: self.config,
            store: Arc::new(RwLock::new(RoomStore::new())),
            events: EventBus::new(),
            callbacks: Arc::new(CallbackRegistry::new()),
            connection_tx: Arc::new(connection_tx),
            connection_rx,
            running: parking_lot::Mutex::new(None),
        }
    }
}

/// Async client for an Orkli Termowifi thermostat controller.
///
/// The client mirrors the controller's room states into an in-memory store
/// and pushes write commands through a background worker task that owns the
/// TCP session. All methods are cheap: reads copy from the store, writes
/// enqueue and return immediately.
///
/// Dropping the client without calling [`stop`](Self::stop) also shuts the
/// worker down, because the command queue closes.
///
/// # Examples
///
/// ```no_run
/// use termowifi::{HvacMode, RoomId, TermowifiClient};
///
/// # async fn run() -> termowifi::Result<()> {
/// let client = TermowifiClient::new("192.168.1.50", 5000);
/// client.start();
///
/// let room = RoomId::new(0)?;
/// client.set_hvac_mode(room, HvacMode::Heat).await?;
/// client.set_target_temperature(room, 21.5).await?;
///
/// client.stop().await;
/// # Ok(())
/// # }
/// ```
pub struct TermowifiClient {
    address: DeviceAddress,
    config: ClientConfig,
    store: Arc<RwLock<RoomStore>>,
    events: EventBus,
    callbacks: Arc<CallbackRegistry>,
    connection_tx: Arc<watch::Sender<ConnectionState>>,
    connection_rx: watch::Receiver<ConnectionState>,
    running: parking_lot::Mutex<Option<Running>>,
}

impl TermowifiClient {
    /// Creates a client with default configuration.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self::builder(host, port).build()
    }

    /// Returns a builder for customizing the client.
    #[must_use]
    pub fn builder(host: impl Into<String>, port: u16) -> TermowifiClientBuilder {
        TermowifiClientBuilder::new(host, port)
    }

    /// The controller address this client talks to.
    #[must_use]
    pub fn address(&self) -> &DeviceAddress {
        &self.address
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Spawns the background worker and returns immediately.
    ///
    /// The worker connects, discovers rooms, and starts polling on its own;
    /// progress is observable through [`watch_connection`](Self::watch_connection)
    /// and [`subscribe`](Self::subscribe). Calling `start` on a running
    /// client is a no-op.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) {
        let mut running = self.running.lock();
        if running.is_some() {
            debug!("start called on a running client");
            return;
        }

        let (command_tx, command_rx) = mpsc::channel(self.config.queue_capacity);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let worker = Worker::new(
            self.address.clone(),
            self.config.clone(),
            Arc::clone(&self.store),
            self.events.clone(),
            Arc::clone(&self.callbacks),
            Arc::clone(&self.connection_tx),
            command_rx,
            shutdown_rx,
        );
        let handle = tokio::spawn(worker.run());

        *running = Some(Running {
            command_tx,
            shutdown_tx,
            handle,
        });
        debug!(address = %self.address, "client started");
    }

    /// Stops the worker and waits for it to finish.
    ///
    /// The room store is cleared; a later [`start`](Self::start) begins with
    /// fresh discovery. Stopping a stopped client is a no-op.
    pub async fn stop(&self) {
        let Some(running) = self.running.lock().take() else {
            return;
        };
        // The worker may already be gone; either signal is enough.
        let _ = running.shutdown_tx.send(true);
        if let Err(err) = running.handle.await {
            warn!(error = %err, "worker task ended abnormally");
        }
        self.store.write().await.clear();
        debug!("client stopped");
    }

    /// Returns `true` if the worker task is running.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.running.lock().is_some()
    }

    // =========================================================================
    // State reads
    // =========================================================================

    /// The rooms discovered so far, in id order.
    pub async fn rooms(&self) -> Vec<RoomId> {
        self.store.read().await.room_ids()
    }

    /// A copy of one room's current state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RoomNotFound`] if the room has not been discovered.
    pub async fn get_room_state(&self, room: RoomId) -> Result<RoomState> {
        self.store
            .read()
            .await
            .get(room)
            .ok_or(Error::RoomNotFound(room.value()))
    }

    /// A copy of every room's current state, in id order.
    pub async fn snapshot(&self) -> Vec<RoomState> {
        self.store.read().await.snapshot()
    }

    /// The current connection state.
    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        self.connection_rx.borrow().clone()
    }

    /// A watch channel that tracks the connection state.
    #[must_use]
    pub fn watch_connection(&self) -> watch::Receiver<ConnectionState> {
        self.connection_rx.clone()
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Queues a target temperature change for a room.
    ///
    /// Returns as soon as the command is queued; the store reflects the new
    /// target once the worker has put it on the wire.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Value`] for temperatures outside 15.0–35.0 °C or off
    /// the 0.5 °C grid, [`Error::RoomNotFound`] for undiscovered rooms,
    /// [`Error::NotStarted`] before [`start`](Self::start), and
    /// [`Error::Command`] when the queue is full or the worker died.
    pub async fn set_target_temperature(&self, room: RoomId, celsius: f32) -> Result<()> {
        let target = TargetTemperature::new(celsius)?;
        self.ensure_known(room).await?;
        self.submit(Command::SetTarget { room, target })
    }

    /// Queues an HVAC mode change for a room.
    ///
    /// [`HvacMode::Off`] switches the room off; [`HvacMode::Heat`] and
    /// [`HvacMode::Cool`] switch it on in the given mode.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`set_target_temperature`](Self::set_target_temperature),
    /// minus value validation.
    pub async fn set_hvac_mode(&self, room: RoomId, mode: HvacMode) -> Result<()> {
        self.ensure_known(room).await?;
        self.submit(Command::SetMode { room, mode })
    }

    /// Queues an immediate poll cycle, ahead of the regular interval.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotStarted`] before [`start`](Self::start), and
    /// [`Error::Command`] when the queue is full or the worker died.
    pub async fn refresh(&self) -> Result<()> {
        self.submit(Command::Refresh { room: None })
    }

    /// Queues an immediate poll of a single room.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`refresh`](Self::refresh), plus
    /// [`Error::RoomNotFound`] for undiscovered rooms.
    pub async fn refresh_room(&self, room: RoomId) -> Result<()> {
        self.ensure_known(room).await?;
        self.submit(Command::Refresh { room: Some(room) })
    }

    async fn ensure_known(&self, room: RoomId) -> Result<()> {
        if self.store.read().await.contains(room) {
            Ok(())
        } else {
            Err(Error::RoomNotFound(room.value()))
        }
    }

    fn submit(&self, command: Command) -> Result<()> {
        let running = self.running.lock();
        let Some(running) = running.as_ref() else {
            return Err(Error::NotStarted);
        };
        match running.command_tx.try_send(command) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                Err(CommandError::QueueFull(self.config.queue_capacity).into())
            }
            Err(TrySendError::Closed(_)) => Err(CommandError::WorkerStopped.into()),
        }
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Subscribes to the event stream.
    ///
    /// Every room and connection change is delivered as a [`ClientEvent`].
    /// Slow receivers that fall behind the channel capacity see lag errors
    /// rather than blocking the worker.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    /// Registers a callback for room state updates.
    pub fn on_room_updated<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(RoomId, &RoomState) + Send + Sync + 'static,
    {
        self.callbacks.on_room_updated(callback)
    }

    /// Registers a callback for newly discovered rooms.
    pub fn on_room_discovered<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(RoomId) + Send + Sync + 'static,
    {
        self.callbacks.on_room_discovered(callback)
    }

    /// Registers a callback for room availability changes.
    pub fn on_availability_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(RoomId, bool) + Send + Sync + 'static,
    {
        self.callbacks.on_availability_changed(callback)
    }

    /// Registers a callback for connection state changes.
    pub fn on_connection_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&ConnectionState) + Send + Sync + 'static,
    {
        self.callbacks.on_connection_changed(callback)
    }

    /// Removes a callback registered through any of the `on_*` methods.
    ///
    /// Returns `true` if the subscription existed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.callbacks.unsubscribe(id)
    }
}

impl std::fmt::Debug for TermowifiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TermowifiClient")
            .field("address", &self.address)
            .field("started", &self.is_started())
            .finish_non_exhaustive()
    }
}
