// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The background task that owns the controller session.
//!
//! All socket I/O, frame decoding, and store writes happen on this task;
//! the facade only reads the store and pushes [`Command`]s into a bounded
//! queue. A session-level error of any kind tears the connection down and
//! re-enters the reconnect loop with exponential backoff.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{RwLock, mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep};
use tracing::{debug, info, trace, warn};

use crate::codec::{Frame, FrameDecoder, RoomField, TraceBuilder, discovery_trace};
use crate::config::ClientConfig;
use crate::connection::{Backoff, ConnectionState, DeviceAddress, DeviceConnection};
use crate::error::{Error, ParseError};
use crate::event::{ClientEvent, EventBus};
use crate::state::RoomStore;
use crate::subscription::CallbackRegistry;
use crate::types::{HvacMode, RoomId, TargetTemperature};

/// Wait for trailing frames once the first answer of a burst arrived.
const FOLLOW_UP_WAIT: Duration = Duration::from_millis(150);

/// Wait for confirmations after a write command.
const CONFIRM_WAIT: Duration = Duration::from_millis(300);

/// A write request queued by the facade.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Command {
    /// Set a room's target temperature.
    SetTarget {
        room: RoomId,
        target: TargetTemperature,
    },
    /// Switch a room off, or on with an operating mode.
    SetMode { room: RoomId, mode: HvacMode },
    /// Poll one room, or all rooms, ahead of schedule.
    Refresh { room: Option<RoomId> },
}

/// Why a session ended.
enum SessionEnd {
    /// Shutdown was requested; the worker should exit.
    Shutdown,
    /// The session broke; the worker should reconnect.
    Broken(Error),
}

/// Owns the connection and serializes all device traffic.
pub(crate) struct Worker {
    address: DeviceAddress,
    config: ClientConfig,
    store: Arc<RwLock<RoomStore>>,
    events: EventBus,
    callbacks: Arc<CallbackRegistry>,
    connection_tx: Arc<watch::Sender<ConnectionState>>,
    command_rx: mpsc::Receiver<Command>,
    shutdown_rx: watch::Receiver<bool>,
    decoder: FrameDecoder,
    backoff: Backoff,
}

impl Worker {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        address: DeviceAddress,
        config: ClientConfig,
        store: Arc<RwLock<RoomStore>>,
        events: EventBus,
        callbacks: Arc<CallbackRegistry>,
        connection_tx: Arc<watch::Sender<ConnectionState>>,
        command_rx: mpsc::Receiver<Command>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        let backoff = Backoff::new(config.reconnection.clone());
        Self {
            address,
            config,
            store,
            events,
            callbacks,
            connection_tx,
            command_rx,
            shutdown_rx,
            decoder: FrameDecoder::new(),
            backoff,
        }
    }

    /// Runs until shutdown is requested.
    pub(crate) async fn run(mut self) {
        debug!(address = %self.address, "worker started");
        loop {
            self.set_state(ConnectionState::Connecting);
            let connect = DeviceConnection::connect(
                &self.address,
                self.config.connect_timeout,
                self.config.read_timeout,
                self.config.write_timeout,
            );
            let connected = tokio::select! {
                _ = self.shutdown_rx.changed() => break,
                result = connect => result,
            };

            match connected {
                Ok(mut conn) => {
                    self.backoff.record_connected();
                    info!(address = %self.address, "session established");
                    self.set_state(ConnectionState::Connected);

                    let end = self.run_session(&mut conn).await;
                    conn.close().await;
                    match end {
                        SessionEnd::Shutdown => break,
                        SessionEnd::Broken(err) => {
                            warn!(error = %err, "session lost");
                            self.backoff.record_failure();
                            self.set_state(ConnectionState::Failed(err.to_string()));
                            self.mark_all_unavailable().await;
                        }
                    }
                }
                Err(err) => {
                    debug!(
                        error = %err,
                        attempt = self.backoff.attempt(),
                        "connect attempt failed"
                    );
                    self.backoff.record_failure();
                    self.set_state(ConnectionState::Failed(err.to_string()));
                }
            }

            let delay = self.backoff.next_delay();
            debug!(?delay, "waiting before reconnect");
            tokio::select! {
                _ = self.shutdown_rx.changed() => break,
                () = sleep(delay) => {}
            }
        }
        self.set_state(ConnectionState::Disconnected);
        debug!("worker stopped");
    }

    /// Drives one connected session: discovery, then polls and commands
    /// until something breaks or shutdown arrives.
    async fn run_session(&mut self, conn: &mut DeviceConnection) -> SessionEnd {
        self.decoder.clear();

        if let Err(err) = self.discover(conn).await {
            return SessionEnd::Broken(err);
        }
        if let Err(err) = self.poll_cycle(conn).await {
            return SessionEnd::Broken(err);
        }

        let mut ticker = interval_at(
            Instant::now() + self.config.poll_interval,
            self.config.poll_interval,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let step = tokio::select! {
                _ = self.shutdown_rx.changed() => return SessionEnd::Shutdown,
                command = self.command_rx.recv() => match command {
                    Some(command) => self.execute(conn, command).await,
                    None => return SessionEnd::Shutdown,
                },
                _ = ticker.tick() => self.poll_cycle(conn).await,
            };
            if let Err(err) = step {
                return SessionEnd::Broken(err);
            }
        }
    }

    /// Asks the controller which rooms exist and ingests the answers.
    async fn discover(&mut self, conn: &mut DeviceConnection) -> Result<(), Error> {
        let trace = discovery_trace();
        for _ in 0..self.config.discovery_repeats {
            conn.send(&trace).await?;
        }
        let mut answered = Vec::new();
        self.drain(conn, self.config.read_timeout, &mut answered)
            .await?;
        let known = self.store.read().await.room_ids();
        debug!(rooms = known.len(), "discovery finished");
        Ok(())
    }

    /// Polls every known room and settles staleness counters.
    async fn poll_cycle(&mut self, conn: &mut DeviceConnection) -> Result<(), Error> {
        let rooms = self.store.read().await.room_ids();
        if rooms.is_empty() {
            // Nothing answered discovery yet; try again instead of polling.
            return self.discover(conn).await;
        }

        for room in &rooms {
            conn.send(&TraceBuilder::new(*room).info()).await?;
        }

        let mut answered = Vec::new();
        self.drain(conn, self.config.read_timeout, &mut answered)
            .await?;

        let newly_stale = self
            .store
            .write()
            .await
            .finish_poll_cycle(&answered, self.config.max_missed_polls);
        for room in newly_stale {
            warn!(%room, "room stopped answering polls");
            self.events.publish(ClientEvent::availability(room, false));
            self.callbacks.dispatch_availability(room, false);
        }
        Ok(())
    }

    /// Sends the traces for one queued command.
    async fn execute(&mut self, conn: &mut DeviceConnection, command: Command) -> Result<(), Error> {
        trace!(?command, "executing command");
        match command {
            Command::SetTarget { room, target } => {
                self.send_repeated(conn, &TraceBuilder::new(room).set_target(target))
                    .await?;
                self.settle(conn, room, RoomField::Target(target)).await
            }
            Command::SetMode { room, mode } => {
                let builder = TraceBuilder::new(room);
                match mode {
                    HvacMode::Off => {
                        self.send_repeated(conn, &builder.switch(false)).await?;
                        self.settle(conn, room, RoomField::Power(false)).await
                    }
                    HvacMode::Heat | HvacMode::Cool => {
                        self.send_repeated(conn, &builder.switch(true)).await?;
                        self.send_repeated(conn, &builder.operating_mode(mode)).await?;
                        self.apply_field(room, RoomField::Power(true)).await;
                        self.settle(
                            conn,
                            room,
                            RoomField::OperatingMode {
                                cooling: mode == HvacMode::Cool,
                            },
                        )
                        .await
                    }
                }
            }
            Command::Refresh { room: Some(room) } => self.poll_room(conn, room).await,
            Command::Refresh { room: None } => self.poll_cycle(conn).await,
        }
    }

    /// Polls a single room outside the regular cycle.
    ///
    /// Staleness counters are untouched; only the full cycle settles them.
    async fn poll_room(&mut self, conn: &mut DeviceConnection, room: RoomId) -> Result<(), Error> {
        conn.send(&TraceBuilder::new(room).info()).await?;
        let mut answered = Vec::new();
        self.drain(conn, self.config.read_timeout, &mut answered)
            .await
    }

    /// Drains confirmations after a write, then records the value the
    /// controller was told to adopt.
    ///
    /// Confirmations carry no payload worth keeping, so the commanded value
    /// is applied directly; the next poll corrects it if the controller
    /// disagreed.
    async fn settle(
        &mut self,
        conn: &mut DeviceConnection,
        room: RoomId,
        field: RoomField,
    ) -> Result<(), Error> {
        let mut answered = Vec::new();
        self.drain(conn, CONFIRM_WAIT, &mut answered).await?;
        self.apply_field(room, field).await;
        Ok(())
    }

    /// Repeats a trace on the wire, mirroring the controller's own app
    /// which sends every command more than once.
    async fn send_repeated(
        &mut self,
        conn: &mut DeviceConnection,
        trace: &[u8],
    ) -> Result<(), Error> {
        for _ in 0..self.config.command_repeats {
            conn.send(trace).await?;
        }
        Ok(())
    }

    /// Reads and decodes bytes until the line goes quiet.
    ///
    /// The first read waits `initial_wait`; once a frame arrives, further
    /// frames are expected promptly and get a shorter window.
    async fn drain(
        &mut self,
        conn: &mut DeviceConnection,
        initial_wait: Duration,
        answered: &mut Vec<RoomId>,
    ) -> Result<(), Error> {
        let mut wait = initial_wait;
        while let Some(bytes) = conn.read_available(wait).await? {
            self.decoder.push(&bytes);
            while let Some(decoded) = self.decoder.next_frame() {
                match decoded {
                    Ok(frame) => self.handle_frame(frame, answered).await,
                    // The checksum verified, so frame alignment is intact;
                    // an id this library does not know is skipped.
                    Err(err @ ParseError::UnrecognizedCommand(_)) => {
                        warn!(error = %err, "skipping unrecognized frame");
                    }
                    // Header or checksum failures mean the stream desynced.
                    Err(err) => return Err(err.into()),
                }
            }
            wait = FOLLOW_UP_WAIT;
        }
        Ok(())
    }

    /// Routes one decoded frame into the store and out to subscribers.
    async fn handle_frame(&mut self, frame: Frame, answered: &mut Vec<RoomId>) {
        match frame {
            Frame::Answer { room, field } => {
                answered.push(room);
                self.apply_field(room, field).await;
            }
            Frame::RoomDiscovered { room } => {
                let is_new = self.store.write().await.discover(room);
                if is_new {
                    info!(%room, "room discovered");
                    self.events.publish(ClientEvent::room_discovered(room));
                    self.callbacks.dispatch_room_discovered(room);
                }
            }
            Frame::Ack { cid, data } => {
                trace!(cid, data, "command acknowledged");
            }
        }
    }

    /// Writes one field into the store and notifies subscribers of the
    /// outcome.
    async fn apply_field(&mut self, room: RoomId, field: RoomField) {
        let (outcome, state) = {
            let mut store = self.store.write().await;
            let outcome = store.apply(room, field);
            (outcome, store.get(room))
        };
        let Some(state) = state else { return };

        if outcome.created {
            info!(%room, "room discovered via answer");
            self.events.publish(ClientEvent::room_discovered(room));
            self.callbacks.dispatch_room_discovered(room);
        }
        if outcome.became_available {
            self.events.publish(ClientEvent::availability(room, true));
            self.callbacks.dispatch_availability(room, true);
        }
        if outcome.changed {
            trace!(%room, ?field, "room state changed");
            self.events
                .publish(ClientEvent::room_updated(room, state.clone()));
            self.callbacks.dispatch_room_updated(room, &state);
        }
    }

    /// Flags every room unavailable after the session drops.
    async fn mark_all_unavailable(&mut self) {
        let changed = self.store.write().await.mark_all_unavailable();
        for room in changed {
            self.events.publish(ClientEvent::availability(room, false));
            self.callbacks.dispatch_availability(room, false);
        }
    }

    /// Publishes a connection state to the watch channel, the event bus,
    /// and the callback registry.
    fn set_state(&self, state: ConnectionState) {
        debug!(%state, "connection state");
        self.connection_tx.send_replace(state.clone());
        self.events.publish(ClientEvent::connection(state.clone()));
        self.callbacks.dispatch_connection(&state);
    }
}
